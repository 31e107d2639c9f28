//! Integration tests for transcoding orchestration.
//!
//! Most tests run against an in-memory engine; `ffmpeg_tests` needs a real
//! ffmpeg on PATH and is ignored by default.

pub mod support;

pub mod coordinator_tests;
pub mod lifecycle_tests;
