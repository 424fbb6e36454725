//! Recording pipeline driver
//!
//! Connects a capture source to a [`VideoEncoderSession`]: raw frames
//! arrive on a broadcast channel at the capture cadence, a background task
//! submits them, and shutdown runs the supported cancellation path
//! (end-of-stream signal, then release).

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::session::{SessionState, VideoEncoderSession};

/// Pipeline-level counters (session counters live in [`SessionStats`])
///
/// [`SessionStats`]: crate::session::SessionStats
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Frames pulled off the capture channel and submitted
    pub frames_forwarded: u64,
    /// Frames lost because the capture channel lagged
    pub frames_lagged: u64,
    /// Frames rejected by the session (bad length, misuse)
    pub frames_rejected: u64,
}

/// Drives a session from a raw-frame broadcast channel
pub struct RecorderPipeline {
    session: Arc<VideoEncoderSession>,
    stats: Arc<Mutex<PipelineStats>>,
    running: watch::Sender<bool>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl RecorderPipeline {
    pub fn new(session: Arc<VideoEncoderSession>) -> Self {
        let (running_tx, _) = watch::channel(false);
        Self {
            session,
            stats: Arc::new(Mutex::new(PipelineStats::default())),
            running: running_tx,
            task: Mutex::new(None),
        }
    }

    /// Get the driven session
    pub fn session(&self) -> Arc<VideoEncoderSession> {
        self.session.clone()
    }

    /// Get current statistics
    pub fn stats(&self) -> PipelineStats {
        self.stats.lock().clone()
    }

    /// Check if the pipeline task is running
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Prepare the session (when not already prepared) and start the
    /// background task that submits frames from `frame_rx`
    ///
    /// The task ends when `stop` is called or the capture channel closes;
    /// either way it signals end of stream and releases the session.
    pub async fn start(&self, mut frame_rx: broadcast::Receiver<Vec<u8>>) -> Result<()> {
        if *self.running.borrow() {
            warn!("recorder pipeline already running");
            return Ok(());
        }

        if self.session.state() == SessionState::Unconfigured {
            self.session.prepare()?;
        }

        self.running.send_replace(true);
        info!("starting recorder pipeline");

        let session = self.session.clone();
        let stats = self.stats.clone();
        let running = self.running.clone();
        let mut running_rx = self.running.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    _ = running_rx.changed() => {
                        if !*running_rx.borrow() {
                            info!("recorder pipeline stopping");
                            break;
                        }
                    }

                    result = frame_rx.recv() => {
                        match result {
                            Ok(raw_frame) => {
                                match session.submit_frame(&raw_frame) {
                                    Ok(()) => stats.lock().frames_forwarded += 1,
                                    Err(e) => {
                                        error!("frame submit failed: {}", e);
                                        stats.lock().frames_rejected += 1;
                                    }
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                debug!("capture channel lagged, lost {} frames", n);
                                stats.lock().frames_lagged += n;
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                info!("capture channel closed, stopping recorder pipeline");
                                break;
                            }
                        }
                    }
                }
            }

            // Only supported cancellation path: EOS, then release
            if let Err(e) = session.signal_end_of_input_stream() {
                debug!("end-of-stream signal skipped: {}", e);
            }
            if let Err(e) = session.release() {
                warn!("session release failed: {}", e);
            }
            let _ = running.send(false);
            info!("recorder pipeline task exited");
        });

        *self.task.lock() = Some(handle);
        Ok(())
    }

    /// Ask the pipeline task to stop and tear the session down
    pub fn stop(&self) {
        if *self.running.borrow() {
            let _ = self.running.send(false);
            info!("stopping recorder pipeline");
        }
    }

    /// Wait until the pipeline task has exited and the session is torn down
    pub async fn wait_stopped(&self) {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("recorder pipeline task panicked: {}", e);
            }
        }
    }
}
