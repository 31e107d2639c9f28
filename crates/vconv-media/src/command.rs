//! Engine command pipelines and the builder that assembles them.

use std::fmt;

use vconv_models::EncodingConfig;

/// Ordered, immutable list of engine arguments for one invocation.
///
/// The pipeline only names virtual files; the engine decides where they live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandPipeline {
    args: Vec<String>,
}

impl CommandPipeline {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Whether `window` appears as consecutive arguments.
    pub fn contains_sequence(&self, window: &[&str]) -> bool {
        if window.is_empty() {
            return true;
        }
        self.args
            .windows(window.len())
            .any(|w| w.iter().zip(window).all(|(a, b)| a == b))
    }

    /// Value following the first occurrence of `flag`.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for CommandPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// Builder for command pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    /// Input virtual file
    input: String,
    /// Output virtual file
    output: String,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl PipelineBuilder {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            output_args: Vec::new(),
        }
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Seek within the output (after -i), keeping stream copy frame exact.
    pub fn seek(self, position: impl Into<String>) -> Self {
        self.output_arg("-ss").output_arg(position)
    }

    /// Limit output duration.
    pub fn duration(self, duration: impl Into<String>) -> Self {
        self.output_arg("-t").output_arg(duration)
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a labelled stream into the output.
    pub fn map(self, label: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(label)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy every stream without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Drop audio.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Drop video.
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Move the index to the front of the file for progressive playback.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("faststart")
    }

    /// Apply a full encoding profile.
    pub fn encoding(self, config: &EncodingConfig) -> Self {
        let mut builder = self.video_codec(config.codec.as_str());
        if let Some(preset) = &config.preset {
            builder = builder.preset(preset.as_str());
        }
        builder = builder.crf(config.crf);
        if config.constant_quality {
            builder = builder.output_arg("-b:v").output_arg("0");
        }
        builder = builder
            .audio_codec(config.audio_codec.as_str())
            .audio_bitrate(config.audio_bitrate.as_str());
        if config.faststart {
            builder = builder.faststart();
        }
        builder
    }

    /// Build the pipeline.
    pub fn build(self) -> CommandPipeline {
        let mut args = Vec::with_capacity(self.output_args.len() + 3);
        args.push("-i".to_string());
        args.push(self.input);
        args.extend(self.output_args);
        args.push(self.output);
        CommandPipeline { args }
    }
}
