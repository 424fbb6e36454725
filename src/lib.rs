//! camrec - Camera recording video encode pipeline
//!
//! This crate provides the raw-to-compressed video path of a recorder:
//! semi-planar camera frames go through pixel format conversion, a
//! negotiated hardware encoder and a lifecycle state machine, and come out
//! as timestamped access units handed to a muxer collaborator. The encoder
//! and the muxer are traits; the pipeline itself is fully testable with
//! synthetic implementations.

pub mod bitrate;
pub mod codec;
pub mod convert;
pub mod encoder;
pub mod error;
pub mod format;
pub mod muxer;
pub mod pipeline;
pub mod session;

pub use bitrate::{BitrateEstimate, BitrateModel, DEFAULT_BITS_PER_PIXEL};
pub use codec::{CodecCapabilityResolver, CodecDescriptor, COLOR_FORMAT_SURFACE};
pub use convert::{ChromaSwapConverter, SemiPlanarBuffer};
pub use encoder::{EncodedChunk, EncoderConfig, VideoEncoder};
pub use error::{RecError, Result};
pub use format::{PixelFormat, Resolution};
pub use muxer::{AccessUnit, MuxerSink};
pub use pipeline::{PipelineStats, RecorderPipeline};
pub use session::{SessionConfig, SessionState, SessionStats, VideoEncoderSession};
