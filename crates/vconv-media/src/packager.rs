//! Output content type and filename resolution.

use vconv_models::{Operation, TranscodeOutput};

/// Content type and file extension of an operation's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub mime: &'static str,
    pub extension: &'static str,
}

/// Format used for every operation not listed in [`OUTPUT_FORMATS`].
pub const DEFAULT_OUTPUT_FORMAT: OutputFormat = OutputFormat {
    mime: "video/mp4",
    extension: "mp4",
};

/// Operations whose output is not MP4.
pub const OUTPUT_FORMATS: &[(Operation, OutputFormat)] = &[
    (
        Operation::Mp4ToMp3,
        OutputFormat {
            mime: "audio/mpeg",
            extension: "mp3",
        },
    ),
    (
        Operation::VideoToGif,
        OutputFormat {
            mime: "image/gif",
            extension: "gif",
        },
    ),
    (
        Operation::Mp4ToWebm,
        OutputFormat {
            mime: "video/webm",
            extension: "webm",
        },
    ),
];

/// Wraps engine output with download metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultPackager;

impl ResultPackager {
    pub fn output_format(operation: Operation) -> OutputFormat {
        OUTPUT_FORMATS
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, format)| *format)
            .unwrap_or(DEFAULT_OUTPUT_FORMAT)
    }

    /// Suggested download name: `{operation}-output.{ext}`.
    pub fn filename(operation: Operation) -> String {
        format!(
            "{}-output.{}",
            operation.as_str(),
            Self::output_format(operation).extension
        )
    }

    pub fn package(bytes: Vec<u8>, operation: Operation) -> TranscodeOutput {
        TranscodeOutput {
            bytes,
            mime: Self::output_format(operation).mime,
            filename: Self::filename(operation),
        }
    }
}
