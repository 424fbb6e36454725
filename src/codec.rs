//! Codec capability discovery and selection
//!
//! The platform codec registry is handed in as an immutable snapshot of
//! [`CodecDescriptor`]s, which keeps selection deterministic and lets tests
//! inject synthetic codec lists. Selection walks the snapshot in enumeration
//! order and takes the first encoder that advertises the requested MIME type
//! and a recognized input color format; there is no preference scoring.

use tracing::{debug, warn};

/// Color format constant for "encoder consumes a provided surface/buffer
/// directly" (matches the platform registry's surface format id)
pub const COLOR_FORMAT_SURFACE: i32 = 0x7F00_0789;

/// Immutable description of one registry-advertised codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDescriptor {
    /// Registry name, e.g. "OMX.qcom.video.encoder.avc"
    pub name: String,
    /// Whether this entry is an encoder (decoders are skipped)
    pub is_encoder: bool,
    /// Supported MIME types, e.g. "video/avc"
    pub mime_types: Vec<String>,
    /// Supported input color formats
    pub color_formats: Vec<i32>,
}

impl CodecDescriptor {
    pub fn encoder(name: &str, mime_types: &[&str], color_formats: &[i32]) -> Self {
        Self {
            name: name.to_string(),
            is_encoder: true,
            mime_types: mime_types.iter().map(|s| s.to_string()).collect(),
            color_formats: color_formats.to_vec(),
        }
    }

    pub fn decoder(name: &str, mime_types: &[&str], color_formats: &[i32]) -> Self {
        Self {
            is_encoder: false,
            ..Self::encoder(name, mime_types, color_formats)
        }
    }

    /// Check whether this codec advertises the MIME type (case-insensitive)
    pub fn supports_mime(&self, mime_type: &str) -> bool {
        self.mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime_type))
    }
}

/// Selects a codec and input color format from a registry snapshot
pub struct CodecCapabilityResolver {
    /// Registry snapshot, in platform enumeration order
    codecs: Vec<CodecDescriptor>,
    /// Accepted input color formats, in preference order
    recognized_formats: Vec<i32>,
}

impl CodecCapabilityResolver {
    pub fn new(codecs: Vec<CodecDescriptor>, recognized_formats: Vec<i32>) -> Self {
        Self {
            codecs,
            recognized_formats,
        }
    }

    /// Create a resolver that only accepts direct surface/buffer input
    pub fn with_surface_input(codecs: Vec<CodecDescriptor>) -> Self {
        Self::new(codecs, vec![COLOR_FORMAT_SURFACE])
    }

    /// Select the first encoder that advertises `mime_type` and a
    /// recognized input color format
    ///
    /// Returns `None` when nothing matches; callers treat that as a hard
    /// configuration failure, not something to retry.
    pub fn select_codec(&self, mime_type: &str) -> Option<&CodecDescriptor> {
        for codec in &self.codecs {
            if !codec.is_encoder {
                continue;
            }
            if !codec.supports_mime(mime_type) {
                continue;
            }
            debug!("codec: {}, MIME={}", codec.name, mime_type);
            if self.select_color_format(codec, mime_type) != 0 {
                return Some(codec);
            }
        }
        None
    }

    /// Intersect the codec's color formats against the recognized set
    ///
    /// Returns the first advertised format that is recognized, or 0 when
    /// none is. The capability query runs under a scoped thread-priority
    /// boost to avoid priority-inversion stalls during enumeration; the
    /// previous priority is restored on every exit path.
    pub fn select_color_format(&self, codec: &CodecDescriptor, mime_type: &str) -> i32 {
        let _boost = PriorityBoost::acquire();

        let result = codec
            .color_formats
            .iter()
            .copied()
            .find(|f| self.recognized_formats.contains(f))
            .unwrap_or(0);

        if result == 0 {
            warn!(
                "couldn't find a usable color format for {} / {}",
                codec.name, mime_type
            );
        }
        result
    }

    /// Get the recognized color format set
    pub fn recognized_formats(&self) -> &[i32] {
        &self.recognized_formats
    }

    /// Get the registry snapshot
    pub fn codecs(&self) -> &[CodecDescriptor] {
        &self.codecs
    }
}

/// Scoped thread-priority boost
///
/// Raises the calling thread's scheduling priority for the lifetime of the
/// guard and restores the previous value on drop. This is a performance
/// hint, not a correctness requirement; on platforms without
/// an equivalent API it is a no-op.
#[must_use]
pub struct PriorityBoost {
    #[cfg(target_os = "linux")]
    previous: Option<libc::c_int>,
}

#[cfg(target_os = "linux")]
impl PriorityBoost {
    const BOOST_NICE: libc::c_int = -10;

    pub fn acquire() -> Self {
        // getpriority returns -1 both on error and as a legitimate value,
        // so errno must be cleared first to tell the two apart
        let previous = unsafe {
            *libc::__errno_location() = 0;
            let current = libc::getpriority(libc::PRIO_PROCESS as _, 0);
            if current == -1 && *libc::__errno_location() != 0 {
                None
            } else {
                Some(current)
            }
        };

        if previous.is_some() {
            let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS as _, 0, Self::BOOST_NICE) };
            if rc != 0 {
                // Unprivileged processes usually cannot raise priority;
                // carry on without the boost
                debug!("thread priority boost unavailable");
                return Self { previous: None };
            }
        }

        Self { previous }
    }
}

#[cfg(target_os = "linux")]
impl Drop for PriorityBoost {
    fn drop(&mut self) {
        if let Some(previous) = self.previous {
            unsafe {
                libc::setpriority(libc::PRIO_PROCESS as _, 0, previous);
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
impl PriorityBoost {
    pub fn acquire() -> Self {
        Self {}
    }
}
