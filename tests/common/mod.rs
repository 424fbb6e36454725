//! Shared scripted collaborators for integration tests
#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

use camrec::{
    AccessUnit, CodecCapabilityResolver, CodecDescriptor, EncodedChunk, EncoderConfig, MuxerSink,
    PixelFormat, RecError, Resolution, SessionConfig, VideoEncoder, VideoEncoderSession,
    COLOR_FORMAT_SURFACE,
};

pub const TRACK_INDEX: usize = 7;
pub const TEST_RESOLUTION: Resolution = Resolution::new(8, 6);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .try_init();
}

#[derive(Default)]
pub struct EncoderState {
    pub configured: Option<EncoderConfig>,
    pub started: bool,
    pub submitted_pts: Vec<i64>,
    pub eos_signaled: bool,
    pub stop_calls: u64,
    pub pending: Vec<EncodedChunk>,
    pub fail_submits_remaining: u32,
}

/// Scripted hardware encoder: each accepted submit yields one chunk on the
/// next drain, EOS yields a terminal marker chunk
pub struct MockEncoder {
    pub state: Arc<Mutex<EncoderState>>,
}

impl VideoEncoder for MockEncoder {
    fn name(&self) -> &str {
        "mock.encoder.avc"
    }

    fn configure(&mut self, config: &EncoderConfig) -> camrec::Result<()> {
        self.state.lock().configured = Some(config.clone());
        Ok(())
    }

    fn start(&mut self) -> camrec::Result<()> {
        self.state.lock().started = true;
        Ok(())
    }

    fn submit(&mut self, data: &[u8], pts_micros: i64) -> camrec::Result<()> {
        let mut state = self.state.lock();
        if state.fail_submits_remaining > 0 {
            state.fail_submits_remaining -= 1;
            return Err(RecError::Encode("input buffer rejected".to_string()));
        }
        let key_frame = state.submitted_pts.is_empty();
        state.submitted_pts.push(pts_micros);
        state.pending.push(EncodedChunk {
            data: Bytes::from(data[..data.len().min(16)].to_vec()),
            pts_micros,
            key_frame,
            end_of_stream: false,
        });
        Ok(())
    }

    fn drain(&mut self) -> camrec::Result<Vec<EncodedChunk>> {
        Ok(self.state.lock().pending.drain(..).collect())
    }

    fn signal_end_of_stream(&mut self) -> camrec::Result<()> {
        let mut state = self.state.lock();
        state.eos_signaled = true;
        let pts = state.submitted_pts.last().copied().unwrap_or(0);
        state.pending.push(EncodedChunk {
            data: Bytes::new(),
            pts_micros: pts,
            key_frame: false,
            end_of_stream: true,
        });
        Ok(())
    }

    fn stop(&mut self) -> camrec::Result<()> {
        self.state.lock().stop_calls += 1;
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub enum MuxerEvent {
    Prepared,
    TrackRegistered(usize),
    Unit {
        track: usize,
        pts: i64,
        len: usize,
        key: bool,
    },
    Stopped,
}

#[derive(Default)]
pub struct MuxerLog {
    pub events: Vec<MuxerEvent>,
    pub fail_prepared: bool,
    pub fail_registrations_remaining: u32,
}

pub struct RecordingMuxer {
    pub log: Arc<Mutex<MuxerLog>>,
}

impl MuxerSink for RecordingMuxer {
    fn on_prepared(&mut self) -> camrec::Result<()> {
        let mut log = self.log.lock();
        log.events.push(MuxerEvent::Prepared);
        if log.fail_prepared {
            return Err(RecError::Muxer("listener threw".to_string()));
        }
        Ok(())
    }

    fn register_track(&mut self, _config: &EncoderConfig) -> camrec::Result<usize> {
        let mut log = self.log.lock();
        if log.fail_registrations_remaining > 0 {
            log.fail_registrations_remaining -= 1;
            return Err(RecError::Muxer("muxer not started".to_string()));
        }
        log.events.push(MuxerEvent::TrackRegistered(TRACK_INDEX));
        Ok(TRACK_INDEX)
    }

    fn on_access_unit(&mut self, unit: AccessUnit) -> camrec::Result<()> {
        self.log.lock().events.push(MuxerEvent::Unit {
            track: unit.track_index,
            pts: unit.pts_micros,
            len: unit.payload.len(),
            key: unit.key_frame,
        });
        Ok(())
    }

    fn on_stopped(&mut self) -> camrec::Result<()> {
        self.log.lock().events.push(MuxerEvent::Stopped);
        Ok(())
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        resolution: TEST_RESOLUTION,
        ..SessionConfig::default()
    }
}

pub fn avc_resolver() -> CodecCapabilityResolver {
    CodecCapabilityResolver::with_surface_input(vec![CodecDescriptor::encoder(
        "mock.encoder.avc",
        &["video/avc"],
        &[COLOR_FORMAT_SURFACE],
    )])
}

pub fn new_session(
    config: SessionConfig,
    resolver: CodecCapabilityResolver,
) -> (
    VideoEncoderSession,
    Arc<Mutex<EncoderState>>,
    Arc<Mutex<MuxerLog>>,
) {
    let encoder_state = Arc::new(Mutex::new(EncoderState::default()));
    let muxer_log = Arc::new(Mutex::new(MuxerLog::default()));

    let session = VideoEncoderSession::new(
        config,
        resolver,
        Box::new(MockEncoder {
            state: encoder_state.clone(),
        }),
        Box::new(RecordingMuxer {
            log: muxer_log.clone(),
        }),
    );
    (session, encoder_state, muxer_log)
}

pub fn raw_frame() -> Vec<u8> {
    let size = PixelFormat::Nv21.frame_size(TEST_RESOLUTION);
    (0..size).map(|i| i as u8).collect()
}
