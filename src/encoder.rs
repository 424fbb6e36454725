//! Hardware encoder abstraction
//!
//! The actual compression engine lives outside this crate (a hardware codec
//! or a platform media framework). [`VideoEncoder`] is the seam: the session
//! drives it through configure/start/submit/drain/EOS/stop, and tests swap
//! in scripted implementations.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::format::Resolution;

/// Encoder configuration
///
/// Built once during `prepare()` and immutable afterwards. Carries both the
/// model-computed bitrate estimate and the value actually applied; see
/// [`crate::bitrate::BitrateEstimate`] for why the two are distinct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Target compression MIME type, e.g. "video/avc"
    pub mime_type: String,
    /// Frame resolution
    pub resolution: Resolution,
    /// Negotiated input color format
    pub color_format: i32,
    /// Bitrate applied to the encoder, bits per second
    pub bit_rate: u32,
    /// Bitrate the model computed, bits per second
    pub estimated_bit_rate: u32,
    /// Target frame rate
    pub frame_rate: u32,
    /// Keyframe interval in seconds
    pub key_frame_interval_secs: u32,
}

/// One compressed output buffer drained from the encoder
#[derive(Debug, Clone)]
pub struct EncodedChunk {
    /// Compressed payload, independently owned
    pub data: Bytes,
    /// Presentation timestamp in microseconds
    pub pts_micros: i64,
    /// Whether this chunk starts a keyframe
    pub key_frame: bool,
    /// Whether this is the terminal buffer after end-of-stream
    pub end_of_stream: bool,
}

/// Encoder lifecycle seam
///
/// Implementations wrap the underlying hardware resource. Submission is
/// synchronous and bounded (buffer hand-off only); compression itself runs
/// asynchronously inside the resource and completed output is collected via
/// `drain`. Not `Sync`: the session serializes all access.
pub trait VideoEncoder: Send {
    /// Get encoder name
    fn name(&self) -> &str;

    /// Configure the encoder; must be called exactly once, before `start`
    fn configure(&mut self, config: &EncoderConfig) -> Result<()>;

    /// Start the encoder; valid only after `configure`
    fn start(&mut self) -> Result<()>;

    /// Queue one converted input frame with its presentation timestamp
    fn submit(&mut self, data: &[u8], pts_micros: i64) -> Result<()>;

    /// Collect whatever compressed output buffers are ready
    fn drain(&mut self) -> Result<Vec<EncodedChunk>>;

    /// Tell the encoder no further input will arrive; it should emit a
    /// terminal chunk (flagged `end_of_stream`) once fully drained
    fn signal_end_of_stream(&mut self) -> Result<()>;

    /// Stop and free the underlying resource; best-effort and idempotent
    fn stop(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Resolution;

    #[test]
    fn test_config_serde_round_trip() {
        let config = EncoderConfig {
            mime_type: "video/avc".to_string(),
            resolution: Resolution::HD720,
            color_format: crate::codec::COLOR_FORMAT_SURFACE,
            bit_rate: 5_760_000,
            estimated_bit_rate: 5_760_000,
            frame_rate: 25,
            key_frame_interval_secs: 10,
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: EncoderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mime_type, "video/avc");
        assert_eq!(back.resolution, Resolution::HD720);
        assert_eq!(back.bit_rate, 5_760_000);
    }
}
