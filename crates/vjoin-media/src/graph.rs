//! Typed filter-graph intermediate representation.
//!
//! The join encode is driven by a single `-filter_complex` graph. Instead of
//! concatenating filter strings ad hoc, the builder assembles typed operation
//! nodes with named input/output pins, validates the wiring (every consumed
//! pin produced exactly once earlier, no pin produced or consumed twice), and
//! only then serializes to FFmpeg's textual graph syntax. Miswired graphs
//! fail here with a named pin instead of as an opaque encode error.

use std::collections::HashMap;
use std::fmt;

use crate::error::{JoinError, MediaResult};

/// A single filter operation with typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Scale to a target size. `fit` preserves aspect ratio by fitting inside
    /// the target box; `flags` selects the resampling algorithm.
    Scale {
        width: i64,
        height: i64,
        fit: bool,
        flags: Option<String>,
    },
    /// Pad to a target size, centering the input.
    Pad { width: u32, height: u32 },
    /// Reset the sample aspect ratio to square pixels.
    SetSar,
    /// Force a constant frame rate.
    Fps { fps: u32 },
    /// Force a pixel format.
    Format { pix_fmt: String },
    /// Reset video presentation timestamps to zero.
    SetPts,
    /// Resample audio to a target rate.
    AResample { rate: u32 },
    /// Reset audio presentation timestamps to zero.
    ASetPts,
    /// Cross-fade two video streams at `offset` for `duration` seconds.
    Xfade { duration: f64, offset: f64 },
    /// Cross-fade two audio streams with triangular fade curves.
    ACrossfade { duration: f64 },
    /// Multiply the alpha channel (0.0 = transparent, 1.0 = opaque).
    ColorAlpha { alpha: f64 },
    /// Overlay the second input over the first at the given expressions.
    Overlay { x: String, y: String },
    /// Apply a constant gain.
    Volume { gain: f64 },
    /// Mix `inputs` audio streams; output length follows the first input.
    Amix {
        inputs: usize,
        dropout_transition: f64,
    },
}

impl FilterOp {
    /// Render to FFmpeg filter syntax.
    pub fn render(&self) -> String {
        match self {
            FilterOp::Scale {
                width,
                height,
                fit,
                flags,
            } => {
                let mut s = format!("scale={}:{}", width, height);
                if *fit {
                    s.push_str(":force_original_aspect_ratio=decrease");
                }
                if let Some(flags) = flags {
                    s.push_str(&format!(":flags={}", flags));
                }
                s
            }
            FilterOp::Pad { width, height } => {
                format!("pad={}:{}:(ow-iw)/2:(oh-ih)/2", width, height)
            }
            FilterOp::SetSar => "setsar=1".to_string(),
            FilterOp::Fps { fps } => format!("fps={}", fps),
            FilterOp::Format { pix_fmt } => format!("format={}", pix_fmt),
            FilterOp::SetPts => "setpts=PTS-STARTPTS".to_string(),
            FilterOp::AResample { rate } => format!("aresample={}", rate),
            FilterOp::ASetPts => "asetpts=PTS-STARTPTS".to_string(),
            FilterOp::Xfade { duration, offset } => format!(
                "xfade=transition=fade:duration={:.3}:offset={:.3}",
                duration, offset
            ),
            FilterOp::ACrossfade { duration } => {
                format!("acrossfade=d={:.3}:c1=tri:c2=tri", duration)
            }
            FilterOp::ColorAlpha { alpha } => format!("colorchannelmixer=aa={:.2}", alpha),
            FilterOp::Overlay { x, y } => format!("overlay={}:{}:format=auto", x, y),
            FilterOp::Volume { gain } => format!("volume={:.2}", gain),
            FilterOp::Amix {
                inputs,
                dropout_transition,
            } => format!(
                "amix=inputs={}:duration=first:dropout_transition={}",
                inputs, dropout_transition
            ),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// One filterchain: a linear sequence of ops between named pins.
#[derive(Debug, Clone)]
pub struct FilterChain {
    /// Consumed pins, in filter-input order
    pub inputs: Vec<String>,
    /// Ops applied in sequence
    pub ops: Vec<FilterOp>,
    /// Produced pins
    pub outputs: Vec<String>,
}

impl FilterChain {
    pub fn new<I, O>(inputs: I, ops: Vec<FilterOp>, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ops,
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    fn render(&self) -> String {
        let mut s = String::new();
        for pin in &self.inputs {
            s.push_str(&format!("[{}]", pin));
        }
        s.push_str(
            &self
                .ops
                .iter()
                .map(FilterOp::render)
                .collect::<Vec<_>>()
                .join(","),
        );
        for pin in &self.outputs {
            s.push_str(&format!("[{}]", pin));
        }
        s
    }
}

/// Whether a pin names an external input stream (e.g. `0:v`, `3:a`)
/// rather than a pad produced inside the graph.
fn is_stream_pin(pin: &str) -> bool {
    pin.contains(':')
}

/// An ordered filter graph with checked pin wiring.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chain to the graph.
    pub fn push(&mut self, chain: FilterChain) {
        self.chains.push(chain);
    }

    /// Number of chains.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Validate pin wiring against the pads the caller intends to `-map`.
    ///
    /// Rules:
    /// - every consumed pin is an external stream pin or was produced by
    ///   exactly one earlier chain and not consumed before;
    /// - no pin is produced twice;
    /// - every mapped pad exists and is not consumed inside the graph.
    ///
    /// Returns the list of dangling pins (produced, never consumed, not
    /// mapped). Dangling pins are legal but usually indicate builder bugs,
    /// so the caller logs them.
    pub fn validate(&self, mapped: &[&str]) -> MediaResult<Vec<String>> {
        let mut produced: HashMap<&str, usize> = HashMap::new();
        let mut consumed: HashMap<&str, usize> = HashMap::new();

        for (idx, chain) in self.chains.iter().enumerate() {
            for pin in &chain.inputs {
                if is_stream_pin(pin) {
                    continue;
                }
                if !produced.contains_key(pin.as_str()) {
                    return Err(JoinError::Graph(format!(
                        "chain {} consumes pin [{}] before any producer",
                        idx, pin
                    )));
                }
                if let Some(prev) = consumed.get(pin.as_str()) {
                    return Err(JoinError::Graph(format!(
                        "pin [{}] consumed twice (chains {} and {})",
                        pin, prev, idx
                    )));
                }
                consumed.insert(pin, idx);
            }
            for pin in &chain.outputs {
                if let Some(prev) = produced.get(pin.as_str()) {
                    return Err(JoinError::Graph(format!(
                        "pin [{}] produced twice (chains {} and {})",
                        pin, prev, idx
                    )));
                }
                produced.insert(pin, idx);
            }
        }

        for pin in mapped {
            if !produced.contains_key(pin) {
                return Err(JoinError::Graph(format!(
                    "mapped pin [{}] is never produced",
                    pin
                )));
            }
            if consumed.contains_key(pin) {
                return Err(JoinError::Graph(format!(
                    "mapped pin [{}] is already consumed inside the graph",
                    pin
                )));
            }
        }

        let dangling = produced
            .keys()
            .filter(|p| !consumed.contains_key(**p) && !mapped.contains(*p))
            .map(|p| p.to_string())
            .collect();

        Ok(dangling)
    }

    /// Serialize to FFmpeg `-filter_complex` syntax. Call after `validate`.
    pub fn serialize(&self) -> String {
        self.chains
            .iter()
            .map(FilterChain::render)
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale_chain(input: &str, output: &str) -> FilterChain {
        FilterChain::new(
            [input],
            vec![FilterOp::Scale {
                width: 720,
                height: 1280,
                fit: true,
                flags: None,
            }],
            [output],
        )
    }

    #[test]
    fn test_render_ops() {
        assert_eq!(
            FilterOp::Scale {
                width: 720,
                height: 1280,
                fit: true,
                flags: None
            }
            .render(),
            "scale=720:1280:force_original_aspect_ratio=decrease"
        );
        assert_eq!(
            FilterOp::Scale {
                width: 150,
                height: -1,
                fit: false,
                flags: Some("lanczos".to_string())
            }
            .render(),
            "scale=150:-1:flags=lanczos"
        );
        assert_eq!(
            FilterOp::Pad {
                width: 720,
                height: 1280
            }
            .render(),
            "pad=720:1280:(ow-iw)/2:(oh-ih)/2"
        );
        assert_eq!(
            FilterOp::Xfade {
                duration: 1.0,
                offset: 4.5
            }
            .render(),
            "xfade=transition=fade:duration=1.000:offset=4.500"
        );
        assert_eq!(
            FilterOp::ACrossfade { duration: 1.0 }.render(),
            "acrossfade=d=1.000:c1=tri:c2=tri"
        );
        assert_eq!(
            FilterOp::Amix {
                inputs: 3,
                dropout_transition: 2.0
            }
            .render(),
            "amix=inputs=3:duration=first:dropout_transition=2"
        );
    }

    #[test]
    fn test_serialize_chain() {
        let mut graph = FilterGraph::new();
        graph.push(FilterChain::new(
            ["0:v"],
            vec![
                FilterOp::SetSar,
                FilterOp::Fps { fps: 30 },
                FilterOp::SetPts,
            ],
            ["v0"],
        ));
        assert_eq!(graph.serialize(), "[0:v]setsar=1,fps=30,setpts=PTS-STARTPTS[v0]");
    }

    #[test]
    fn test_validate_ok() {
        let mut graph = FilterGraph::new();
        graph.push(scale_chain("0:v", "v0"));
        graph.push(scale_chain("1:v", "v1"));
        graph.push(FilterChain::new(
            ["v0", "v1"],
            vec![FilterOp::Xfade {
                duration: 1.0,
                offset: 4.0,
            }],
            ["vout"],
        ));
        let dangling = graph.validate(&["vout"]).unwrap();
        assert!(dangling.is_empty());
    }

    #[test]
    fn test_validate_unknown_pin() {
        let mut graph = FilterGraph::new();
        graph.push(scale_chain("nope", "v0"));
        let err = graph.validate(&["v0"]).unwrap_err();
        assert!(err.to_string().contains("[nope]"));
    }

    #[test]
    fn test_validate_double_producer() {
        let mut graph = FilterGraph::new();
        graph.push(scale_chain("0:v", "v0"));
        graph.push(scale_chain("1:v", "v0"));
        assert!(graph.validate(&["v0"]).is_err());
    }

    #[test]
    fn test_validate_double_consumer() {
        let mut graph = FilterGraph::new();
        graph.push(scale_chain("0:v", "v0"));
        graph.push(scale_chain("v0", "a"));
        graph.push(scale_chain("v0", "b"));
        assert!(graph.validate(&["a", "b"]).is_err());
    }

    #[test]
    fn test_validate_mapped_pin_missing() {
        let graph = FilterGraph::new();
        assert!(graph.validate(&["vout"]).is_err());
    }

    #[test]
    fn test_validate_flags_dangling() {
        let mut graph = FilterGraph::new();
        graph.push(scale_chain("0:v", "v0"));
        graph.push(scale_chain("1:v", "orphan"));
        let dangling = graph.validate(&["v0"]).unwrap();
        assert_eq!(dangling, vec!["orphan".to_string()]);
    }

    #[test]
    fn test_consumed_pin_cannot_be_mapped() {
        let mut graph = FilterGraph::new();
        graph.push(scale_chain("0:v", "v0"));
        graph.push(scale_chain("v0", "v1"));
        assert!(graph.validate(&["v0"]).is_err());
    }
}
