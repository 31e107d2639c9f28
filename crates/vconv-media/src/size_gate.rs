//! Pre-flight admission control on source size.

/// Largest source accepted for in-process transcoding (100 MiB).
pub const MAX_SOURCE_BYTES: u64 = 100 * 1024 * 1024;

/// Outcome of the size check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admit,
    /// Too large; `message` points the user at desktop tooling.
    Fallback { message: String },
}

/// Rejects sources that are too large to stage in working storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeGate;

impl SizeGate {
    pub fn new() -> Self {
        Self
    }

    /// Admit sources up to and including the limit.
    pub fn check(&self, source_size: u64) -> Admission {
        if source_size <= MAX_SOURCE_BYTES {
            return Admission::Admit;
        }

        Admission::Fallback {
            message: format!(
                "This file is {:.1} MB, which exceeds the {} MB limit for in-app video processing. \
                 Please use a desktop tool such as FFmpeg or HandBrake for larger files.",
                source_size as f64 / (1024.0 * 1024.0),
                MAX_SOURCE_BYTES / (1024 * 1024)
            ),
        }
    }
}
