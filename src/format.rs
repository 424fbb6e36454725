//! Pixel format definitions and frame size math

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported raw pixel formats
///
/// The recording path only deals with 4:2:0 chroma-subsampled layouts:
/// one full-resolution luma plane followed by half-resolution chroma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixelFormat {
    /// NV21 semi-planar format (Y plane + interleaved VU pairs), the
    /// layout camera preview callbacks deliver
    Nv21,
    /// NV12 semi-planar format (Y plane + interleaved UV pairs), the
    /// layout the encoder consumes
    Nv12,
    /// YUV420 planar format (separate Y, U, V planes)
    Yuv420,
}

impl PixelFormat {
    /// Calculate expected frame size for a given resolution
    pub fn frame_size(&self, resolution: Resolution) -> usize {
        let pixels = (resolution.width * resolution.height) as usize;
        match self {
            PixelFormat::Nv21 | PixelFormat::Nv12 | PixelFormat::Yuv420 => pixels * 3 / 2,
        }
    }

    /// Whether chroma samples are stored as interleaved byte pairs
    pub fn is_semi_planar(&self) -> bool {
        matches!(self, PixelFormat::Nv21 | PixelFormat::Nv12)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Nv21 => write!(f, "NV21"),
            PixelFormat::Nv12 => write!(f, "NV12"),
            PixelFormat::Yuv420 => write!(f, "YUV420"),
        }
    }
}

/// Frame resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD720: Resolution = Resolution {
        width: 1280,
        height: 720,
    };

    pub const HD1080: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count
    pub fn pixels(&self) -> usize {
        (self.width * self.height) as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        assert_eq!(PixelFormat::Nv21.frame_size(Resolution::HD720), 1_382_400);
        assert_eq!(
            PixelFormat::Nv12.frame_size(Resolution::new(4, 4)),
            4 * 4 * 3 / 2
        );
    }

    #[test]
    fn test_semi_planar() {
        assert!(PixelFormat::Nv21.is_semi_planar());
        assert!(PixelFormat::Nv12.is_semi_planar());
        assert!(!PixelFormat::Yuv420.is_semi_planar());
    }

    #[test]
    fn test_resolution_display() {
        assert_eq!(Resolution::HD720.to_string(), "1280x720");
    }

    #[test]
    fn test_format_serde() {
        let json = serde_json::to_string(&PixelFormat::Nv21).unwrap();
        assert_eq!(json, "\"NV21\"");
        let back: PixelFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PixelFormat::Nv21);
    }
}
