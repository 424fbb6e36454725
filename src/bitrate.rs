//! Bitrate estimation from resolution and frame rate

use tracing::info;

use crate::format::Resolution;

/// Default bits-per-pixel constant for camera recording
pub const DEFAULT_BITS_PER_PIXEL: f32 = 0.25;

/// Bitrate derived for an encoding session
///
/// `computed` is what the model derives from resolution and frame rate.
/// `applied` is what actually goes into the encoder configuration. The two
/// are kept as separate fields because the recorder this crate descends
/// from logged the computed value but configured a placeholder instead;
/// callers and tests can inspect whichever quantity they care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitrateEstimate {
    /// Bits per second derived by the model
    pub computed: u32,
    /// Bits per second handed to the encoder
    pub applied: u32,
}

/// Derives a target bitrate from resolution, frame rate and a
/// bits-per-pixel constant
#[derive(Debug, Clone, Copy)]
pub struct BitrateModel {
    bits_per_pixel: f32,
}

impl BitrateModel {
    pub fn new(bits_per_pixel: f32) -> Self {
        Self { bits_per_pixel }
    }

    /// Compute the target bitrate in bits per second, truncated to integer
    pub fn compute_bit_rate(&self, resolution: Resolution, frame_rate: u32) -> u32 {
        let bitrate = self.bits_per_pixel
            * frame_rate as f32
            * resolution.width as f32
            * resolution.height as f32;
        let bitrate = bitrate as u32;
        info!(
            "bitrate = {:.2} Mbps ({} bps)",
            bitrate as f32 / 1024.0 / 1024.0,
            bitrate
        );
        bitrate
    }

    /// Compute an estimate, applying `override_bps` when given
    pub fn estimate(
        &self,
        resolution: Resolution,
        frame_rate: u32,
        override_bps: Option<u32>,
    ) -> BitrateEstimate {
        let computed = self.compute_bit_rate(resolution, frame_rate);
        BitrateEstimate {
            computed,
            applied: override_bps.unwrap_or(computed),
        }
    }
}

impl Default for BitrateModel {
    fn default() -> Self {
        Self::new(DEFAULT_BITS_PER_PIXEL)
    }
}
