//! Video encoder session lifecycle
//!
//! One session owns one raw-to-compressed video path for one recording:
//! codec negotiation and encoder configuration at prepare time, the
//! convert/submit/drain loop in steady state, and the end-of-stream and
//! release transitions at teardown. The muxer collaborator is notified at
//! each phase transition and receives every drained access unit.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::bitrate::{BitrateModel, DEFAULT_BITS_PER_PIXEL};
use crate::codec::CodecCapabilityResolver;
use crate::convert::ChromaSwapConverter;
use crate::encoder::{EncoderConfig, VideoEncoder};
use crate::error::{RecError, Result};
use crate::format::Resolution;
use crate::muxer::{AccessUnit, MuxerSink};

/// Session construction parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Target compression MIME type
    pub mime_type: String,
    /// Frame resolution
    pub resolution: Resolution,
    /// Target frame rate
    pub frame_rate: u32,
    /// Bits-per-pixel constant for the bitrate model
    pub bits_per_pixel: f32,
    /// Keyframe interval in seconds
    pub key_frame_interval_secs: u32,
    /// Bitrate to apply instead of the computed estimate, bits per second
    pub bit_rate_override: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mime_type: "video/avc".to_string(),
            resolution: Resolution::HD720,
            frame_rate: 25,
            bits_per_pixel: DEFAULT_BITS_PER_PIXEL,
            key_frame_interval_secs: 10,
            bit_rate_override: None,
        }
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, encoder not yet configured
    Unconfigured,
    /// Encoder configured and started, no frame submitted yet
    Prepared,
    /// At least one frame submitted
    Running,
    /// End-of-stream signaled, no further input accepted
    EndOfStreamSignaled,
    /// Encoder stopped and freed
    Released,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Unconfigured => write!(f, "Unconfigured"),
            SessionState::Prepared => write!(f, "Prepared"),
            SessionState::Running => write!(f, "Running"),
            SessionState::EndOfStreamSignaled => write!(f, "EndOfStreamSignaled"),
            SessionState::Released => write!(f, "Released"),
        }
    }
}

/// Session counters
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Frames accepted by `submit_frame`
    pub frames_submitted: u64,
    /// Frames the encoder rejected (logged and dropped)
    pub frames_dropped: u64,
    /// Access units forwarded to the muxer
    pub access_units: u64,
    /// Keyframes among the forwarded access units
    pub keyframes: u64,
    /// Compressed bytes forwarded
    pub bytes_encoded: u64,
}

/// Presentation-time clock shared across one recording session
///
/// Microseconds since session creation, clamped so the value never goes
/// backward even if the wall clock misbehaves.
struct PtsClock {
    origin: Instant,
    last_pts: i64,
}

impl PtsClock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            last_pts: 0,
        }
    }

    fn now_micros(&mut self) -> i64 {
        let pts = self.origin.elapsed().as_micros() as i64;
        if pts < self.last_pts {
            self.last_pts
        } else {
            self.last_pts = pts;
            pts
        }
    }
}

struct SessionInner {
    state: SessionState,
    encoder: Box<dyn VideoEncoder>,
    muxer: Box<dyn MuxerSink>,
    converter: ChromaSwapConverter,
    clock: PtsClock,
    encoder_config: Option<EncoderConfig>,
    track_index: Option<usize>,
    stats: SessionStats,
}

/// Orchestrator for one raw-to-compressed video path
///
/// All lifecycle and data-plane entry points serialize on an internal
/// mutex, so the capture thread, a drain thread and a controller may call
/// in concurrently; only one of them is ever inside the state machine.
/// The reused conversion buffer never escapes that critical section.
pub struct VideoEncoderSession {
    config: SessionConfig,
    resolver: CodecCapabilityResolver,
    inner: Mutex<SessionInner>,
}

impl VideoEncoderSession {
    /// Create a session; the encoder and muxer collaborators are injected
    pub fn new(
        config: SessionConfig,
        resolver: CodecCapabilityResolver,
        encoder: Box<dyn VideoEncoder>,
        muxer: Box<dyn MuxerSink>,
    ) -> Self {
        info!(
            "Creating video encoder session: {} {} @ {} fps",
            config.mime_type, config.resolution, config.frame_rate
        );

        let converter = ChromaSwapConverter::nv21_to_nv12(config.resolution);

        Self {
            config,
            resolver,
            inner: Mutex::new(SessionInner {
                state: SessionState::Unconfigured,
                encoder,
                muxer,
                converter,
                clock: PtsClock::new(),
                encoder_config: None,
                track_index: None,
                stats: SessionStats::default(),
            }),
        }
    }

    /// Resolve a codec, configure and start the encoder, notify the muxer
    ///
    /// Configuration failures (no codec, encoder rejects the format) abort
    /// the session and surface synchronously. A failing `on_prepared`
    /// callback is logged; preparation still counts as successful once the
    /// encoder itself started.
    pub fn prepare(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state != SessionState::Unconfigured {
            return Err(RecError::InvalidState(format!(
                "prepare() in state {}",
                inner.state
            )));
        }

        let codec = self
            .resolver
            .select_codec(&self.config.mime_type)
            .ok_or_else(|| RecError::CodecNotFound(self.config.mime_type.clone()))?;
        let color_format = self
            .resolver
            .select_color_format(codec, &self.config.mime_type);
        info!("selected codec: {}", codec.name);

        let estimate = BitrateModel::new(self.config.bits_per_pixel).estimate(
            self.config.resolution,
            self.config.frame_rate,
            self.config.bit_rate_override,
        );

        let encoder_config = EncoderConfig {
            mime_type: self.config.mime_type.clone(),
            resolution: self.config.resolution,
            color_format,
            bit_rate: estimate.applied,
            estimated_bit_rate: estimate.computed,
            frame_rate: self.config.frame_rate,
            key_frame_interval_secs: self.config.key_frame_interval_secs,
        };
        debug!("encoder config: {:?}", encoder_config);

        inner.encoder.configure(&encoder_config)?;
        inner.encoder.start()?;

        inner.encoder_config = Some(encoder_config);
        inner.state = SessionState::Prepared;
        info!("session prepared");

        if let Err(e) = inner.muxer.on_prepared() {
            error!("on_prepared callback failed: {}", e);
        }
        Ok(())
    }

    /// Submit one raw semi-planar frame
    ///
    /// Validates the buffer length before anything else touches it, converts
    /// into the session-owned scratch buffer, stamps a non-decreasing
    /// presentation time and hands the frame to the encoder. An encoder
    /// rejection drops this frame and keeps the session alive; drained
    /// output is forwarded to the muxer before returning.
    pub fn submit_frame(&self, raw: &[u8]) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.state {
            SessionState::Prepared | SessionState::Running => {}
            SessionState::Unconfigured => {
                return Err(RecError::InvalidState(
                    "submit_frame() before prepare()".to_string(),
                ));
            }
            state => {
                return Err(RecError::InvalidState(format!(
                    "submit_frame() in state {}",
                    state
                )));
            }
        }

        // Length precondition is checked inside convert, before the encoder
        // sees anything
        let pts = inner.clock.now_micros();
        let converted = inner.converter.convert(raw)?;

        inner.state = SessionState::Running;
        inner.stats.frames_submitted += 1;

        if let Err(e) = inner.encoder.submit(converted, pts) {
            warn!("encoder rejected frame at pts {}: {}, dropping", pts, e);
            inner.stats.frames_dropped += 1;
        }

        Self::drain_outputs(inner);
        Ok(())
    }

    /// Mark end of stream and collect the encoder's terminal output
    ///
    /// No `submit_frame` call is valid afterwards.
    pub fn signal_end_of_input_stream(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.state {
            SessionState::Prepared | SessionState::Running => {}
            state => {
                return Err(RecError::InvalidState(format!(
                    "signal_end_of_input_stream() in state {}",
                    state
                )));
            }
        }

        debug!("sending EOS to encoder");
        inner.encoder.signal_end_of_stream()?;
        inner.state = SessionState::EndOfStreamSignaled;

        // Drain until the terminal buffer shows up or the encoder runs dry
        loop {
            let (forwarded, saw_eos) = Self::drain_outputs(inner);
            if saw_eos || forwarded == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Stop and free the encoder and notify the muxer
    ///
    /// Unconditional and idempotent: safe to call from any state, twice,
    /// or after a failed prepare. The first call emits `on_stopped`.
    pub fn release(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if inner.state == SessionState::Released {
            debug!("release(): already released");
            return Ok(());
        }

        if let Err(e) = inner.encoder.stop() {
            warn!("encoder stop failed during release: {}", e);
        }
        inner.state = SessionState::Released;
        info!("session released");

        if let Err(e) = inner.muxer.on_stopped() {
            error!("on_stopped callback failed: {}", e);
        }
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Session counters snapshot
    pub fn stats(&self) -> SessionStats {
        self.inner.lock().stats.clone()
    }

    /// Track index assigned by the muxer, once the first access unit was
    /// forwarded
    pub fn track_index(&self) -> Option<usize> {
        self.inner.lock().track_index
    }

    /// Encoder configuration built during prepare
    pub fn encoder_config(&self) -> Option<EncoderConfig> {
        self.inner.lock().encoder_config.clone()
    }

    /// Session construction parameters
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Forward whatever compressed output is ready to the muxer
    ///
    /// Returns (chunks drained, terminal buffer seen). Muxer callback
    /// failures are logged and never unwind into the state machine.
    fn drain_outputs(inner: &mut SessionInner) -> (usize, bool) {
        let chunks = match inner.encoder.drain() {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("encoder drain failed: {}", e);
                return (0, false);
            }
        };

        let drained = chunks.len();
        let mut saw_eos = false;

        for chunk in chunks {
            if chunk.end_of_stream {
                saw_eos = true;
            }
            if chunk.data.is_empty() {
                continue;
            }

            let track_index = match inner.track_index {
                Some(index) => index,
                None => {
                    // Registration is tied to the first forwarded buffer;
                    // on failure this chunk is dropped and the next drain
                    // retries
                    let config = match inner.encoder_config.as_ref() {
                        Some(config) => config,
                        None => {
                            warn!("drained output before configure, dropping chunk");
                            continue;
                        }
                    };
                    match inner.muxer.register_track(config) {
                        Ok(index) => {
                            info!("muxer assigned track index {}", index);
                            inner.track_index = Some(index);
                            index
                        }
                        Err(e) => {
                            error!("track registration failed: {}", e);
                            continue;
                        }
                    }
                }
            };

            let payload_len = chunk.data.len() as u64;
            let key_frame = chunk.key_frame;
            let unit = AccessUnit {
                track_index,
                pts_micros: chunk.pts_micros,
                payload: chunk.data,
                key_frame,
            };

            if let Err(e) = inner.muxer.on_access_unit(unit) {
                error!("on_access_unit callback failed: {}", e);
            } else {
                inner.stats.access_units += 1;
                inner.stats.bytes_encoded += payload_len;
                if key_frame {
                    inner.stats.keyframes += 1;
                }
            }
        }

        (drained, saw_eos)
    }
}

impl Drop for VideoEncoderSession {
    fn drop(&mut self) {
        let state = self.inner.lock().state;
        if state != SessionState::Released {
            let _ = self.release();
        }
    }
}
