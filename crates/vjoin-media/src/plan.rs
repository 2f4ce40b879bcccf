//! Transition offset computation.
//!
//! Cross-fades overlap adjacent clips, so every completed transition shortens
//! the effective timeline by one blend duration. The offset for boundary `i`
//! is the sum of the first `i` measured clip durations minus `i` blends.

use tracing::warn;

/// One clip boundary: where the cross-fade starts and how long it blends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Seconds from the start of the joined timeline
    pub offset: f64,
    /// Blend duration in seconds
    pub blend: f64,
}

/// The full set of transitions for a job, one per clip boundary.
#[derive(Debug, Clone, Default)]
pub struct TransitionPlan {
    transitions: Vec<Transition>,
}

impl TransitionPlan {
    /// Compute transition offsets from measured clip durations.
    ///
    /// Offsets are cumulative, clamped to >= 0 and never below the previous
    /// offset. A clip no longer than the blend duration cannot host a full
    /// cross-fade; such clips are clamped rather than rejected, and the
    /// clamp is logged.
    pub fn compute(durations: &[f64], blend: f64) -> Self {
        let mut transitions = Vec::new();
        let mut offset = 0.0_f64;

        for (i, &duration) in durations.iter().enumerate() {
            if duration <= blend {
                warn!(
                    clip = i,
                    duration, blend, "Clip is not longer than the blend duration, offsets clamped"
                );
            }
            // No transition after the last clip
            if i + 1 == durations.len() {
                break;
            }
            // A clip shorter than the blend would move the offset backwards
            // and misplace every later cross-fade; hold the previous offset
            // instead (which also keeps the first offset at >= 0)
            offset = (offset + duration - blend).max(offset);
            transitions.push(Transition { offset, blend });
        }

        Self { transitions }
    }

    /// Transitions in boundary order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Expected joined duration: sum of clips minus one blend per boundary.
    pub fn expected_duration(durations: &[f64], blend: f64) -> f64 {
        let total: f64 = durations.iter().sum();
        let boundaries = durations.len().saturating_sub(1) as f64;
        (total - boundaries * blend).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_clips_half_second_blend() {
        let plan = TransitionPlan::compute(&[5.0, 5.0, 5.0], 0.5);
        let offsets: Vec<f64> = plan.transitions().iter().map(|t| t.offset).collect();
        assert_eq!(offsets.len(), 2);
        assert!((offsets[0] - 4.5).abs() < 1e-9);
        assert!((offsets[1] - 9.0).abs() < 1e-9);
        assert!(
            (TransitionPlan::expected_duration(&[5.0, 5.0, 5.0], 0.5) - 14.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_single_clip_has_no_transitions() {
        let plan = TransitionPlan::compute(&[7.3], 1.0);
        assert!(plan.is_empty());
        assert!((TransitionPlan::expected_duration(&[7.3], 1.0) - 7.3).abs() < 1e-9);
    }

    #[test]
    fn test_offsets_monotonically_non_decreasing() {
        let plan = TransitionPlan::compute(&[2.0, 0.5, 0.5, 3.0], 1.0);
        let offsets: Vec<f64> = plan.transitions().iter().map(|t| t.offset).collect();
        for pair in offsets.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!(offsets.iter().all(|&o| o >= 0.0));
    }

    #[test]
    fn test_short_clips_clamp_to_zero() {
        let plan = TransitionPlan::compute(&[0.25, 0.25, 5.0], 1.0);
        assert!((plan.transitions()[0].offset - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_middle_clips_hold_the_previous_offset() {
        // The second and third clips are shorter than the blend; a naive
        // running sum would pull the offsets back to 0.5 and then 0.0
        let plan = TransitionPlan::compute(&[2.0, 0.5, 0.5, 3.0], 1.0);
        let offsets: Vec<f64> = plan.transitions().iter().map(|t| t.offset).collect();
        assert!((offsets[0] - 1.0).abs() < 1e-9);
        assert!((offsets[1] - 1.0).abs() < 1e-9);
        assert!((offsets[2] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unequal_durations() {
        let plan = TransitionPlan::compute(&[3.0, 8.0, 2.0], 1.0);
        let offsets: Vec<f64> = plan.transitions().iter().map(|t| t.offset).collect();
        assert!((offsets[0] - 2.0).abs() < 1e-9);
        assert!((offsets[1] - 9.0).abs() < 1e-9);
    }
}
