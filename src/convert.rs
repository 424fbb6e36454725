//! Pixel format conversion for the encoder input path
//!
//! The camera delivers NV21 frames (Y plane + interleaved VU chroma pairs);
//! the encoder consumes NV12 (Y plane + interleaved UV pairs). The two
//! layouts differ only in chroma channel order, so conversion is a luma copy
//! plus a byte swap of every chroma pair. Chroma samples stay interleaved.

use crate::error::{RecError, Result};
use crate::format::{PixelFormat, Resolution};

/// Semi-planar 4:2:0 buffer: Y plane followed by interleaved chroma pairs
pub struct SemiPlanarBuffer {
    /// Raw buffer containing the Y plane followed by the chroma plane
    data: Vec<u8>,
    /// Frame resolution
    resolution: Resolution,
}

impl SemiPlanarBuffer {
    /// Create a zeroed buffer sized for the given resolution
    pub fn new(resolution: Resolution) -> Self {
        let y_size = resolution.pixels();
        let uv_size = y_size / 2;

        Self {
            data: vec![0u8; y_size + uv_size],
            resolution,
        }
    }

    /// Get the raw buffer as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the raw buffer as mutable bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get Y plane
    pub fn y_plane(&self) -> &[u8] {
        &self.data[..self.resolution.pixels()]
    }

    /// Get interleaved chroma plane
    pub fn uv_plane(&self) -> &[u8] {
        &self.data[self.resolution.pixels()..]
    }

    /// Get buffer length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get resolution
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Converter that swaps chroma channel order between semi-planar layouts
///
/// Owns a single output buffer that is overwritten on every call, so the
/// hot path never allocates. The returned slice aliases that buffer and is
/// only valid until the next `convert` call; callers that hand data to an
/// asynchronous consumer must copy it out first.
pub struct ChromaSwapConverter {
    /// Source format
    src_format: PixelFormat,
    /// Destination format
    dst_format: PixelFormat,
    /// Frame resolution
    resolution: Resolution,
    /// Output buffer (reused across conversions)
    output_buffer: SemiPlanarBuffer,
}

impl ChromaSwapConverter {
    /// Create a new converter for NV21 → NV12
    pub fn nv21_to_nv12(resolution: Resolution) -> Self {
        Self {
            src_format: PixelFormat::Nv21,
            dst_format: PixelFormat::Nv12,
            resolution,
            output_buffer: SemiPlanarBuffer::new(resolution),
        }
    }

    /// Convert a frame and return a reference to the output buffer
    ///
    /// The input length must be exactly `width * height * 3 / 2`; anything
    /// else is a caller bug and is rejected before any byte is touched.
    pub fn convert(&mut self, input: &[u8]) -> Result<&[u8]> {
        let expected = self.output_buffer.len();
        if input.len() != expected {
            return Err(RecError::FrameSize {
                expected,
                actual: input.len(),
            });
        }

        let y_size = self.resolution.pixels();
        let output = self.output_buffer.as_bytes_mut();

        // Luma plane is identical in both layouts
        output[..y_size].copy_from_slice(&input[..y_size]);

        // Swap each interleaved chroma byte pair
        for (dst, src) in output[y_size..]
            .chunks_exact_mut(2)
            .zip(input[y_size..].chunks_exact(2))
        {
            dst[0] = src[1];
            dst[1] = src[0];
        }

        Ok(self.output_buffer.as_bytes())
    }

    /// Get output buffer length
    pub fn output_len(&self) -> usize {
        self.output_buffer.len()
    }

    /// Get source format
    pub fn src_format(&self) -> PixelFormat {
        self.src_format
    }

    /// Get destination format
    pub fn dst_format(&self) -> PixelFormat {
        self.dst_format
    }

    /// Get resolution
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame(resolution: Resolution) -> Vec<u8> {
        let size = PixelFormat::Nv21.frame_size(resolution);
        (0..size).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_buffer_creation() {
        let buffer = SemiPlanarBuffer::new(Resolution::HD720);
        assert_eq!(buffer.len(), 1280 * 720 * 3 / 2);
        assert_eq!(buffer.y_plane().len(), 1280 * 720);
        assert_eq!(buffer.uv_plane().len(), 1280 * 720 / 2);
    }

    #[test]
    fn test_luma_preserved_chroma_swapped() {
        let resolution = Resolution::new(8, 6);
        let mut converter = ChromaSwapConverter::nv21_to_nv12(resolution);
        let input = sample_frame(resolution);

        let output = converter.convert(&input).unwrap();
        let y_size = resolution.pixels();

        assert_eq!(&output[..y_size], &input[..y_size]);
        for i in (y_size..input.len()).step_by(2) {
            assert_eq!(output[i], input[i + 1]);
            assert_eq!(output[i + 1], input[i]);
        }
    }

    #[test]
    fn test_double_swap_round_trips() {
        let resolution = Resolution::new(4, 4);
        let mut converter = ChromaSwapConverter::nv21_to_nv12(resolution);
        let input = sample_frame(resolution);

        let once = converter.convert(&input).unwrap().to_vec();
        let twice = converter.convert(&once).unwrap();
        assert_eq!(twice, &input[..]);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let mut converter = ChromaSwapConverter::nv21_to_nv12(Resolution::new(4, 4));
        let short = vec![0u8; 10];

        match converter.convert(&short) {
            Err(RecError::FrameSize { expected, actual }) => {
                assert_eq!(expected, 24);
                assert_eq!(actual, 10);
            }
            other => panic!("expected FrameSize error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_no_reallocation_between_calls() {
        let resolution = Resolution::new(4, 4);
        let mut converter = ChromaSwapConverter::nv21_to_nv12(resolution);
        let input = sample_frame(resolution);

        let ptr_a = converter.convert(&input).unwrap().as_ptr();
        let ptr_b = converter.convert(&input).unwrap().as_ptr();
        assert_eq!(ptr_a, ptr_b);
    }
}
