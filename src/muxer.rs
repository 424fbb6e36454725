//! Muxer collaborator seam
//!
//! The container/multiplexer that receives encoded access units lives
//! outside this crate. [`MuxerSink`] is the notification surface the
//! session drives at its state transitions. All callbacks return `Result`;
//! the session captures and logs failures instead of letting them unwind
//! into the state machine.

use bytes::Bytes;

use crate::encoder::EncoderConfig;
use crate::error::Result;

/// One compressed access unit handed to the muxer
///
/// Ownership of the payload transfers to the muxer; it is never aliased
/// onto the session's reused conversion buffer.
#[derive(Debug, Clone)]
pub struct AccessUnit {
    /// Muxer-assigned track this stream writes to
    pub track_index: usize,
    /// Presentation timestamp in microseconds, non-decreasing
    pub pts_micros: i64,
    /// Compressed payload
    pub payload: Bytes,
    /// Whether this access unit starts a keyframe
    pub key_frame: bool,
}

/// Downstream muxer notification surface
pub trait MuxerSink: Send {
    /// The session's encoder is configured and started
    fn on_prepared(&mut self) -> Result<()>;

    /// Register this session's output stream; returns the assigned track
    /// index. Called lazily, before the first access unit is forwarded.
    fn register_track(&mut self, config: &EncoderConfig) -> Result<usize>;

    /// One encoded access unit; ownership transfers to the muxer
    fn on_access_unit(&mut self, unit: AccessUnit) -> Result<()>;

    /// The session released its encoder; no further access units follow
    fn on_stopped(&mut self) -> Result<()>;
}
