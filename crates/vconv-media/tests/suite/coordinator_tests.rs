//! End-to-end coordinator tests against the in-memory engine.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use vconv_media::{EngineLifecycle, EngineState, MediaError, TranscodeCoordinator};
use vconv_models::{
    Operation, OperationParams, RotateParams, Rotation, TranscodeRequest, TranscodeResult,
};

use super::support::{CountingLoader, MemoryEngine, ENGINE_OUTPUT};

const MB: u64 = 1024 * 1024;

fn coordinator_with(engine: Arc<MemoryEngine>) -> TranscodeCoordinator {
    let lifecycle = EngineLifecycle::new(CountingLoader::new(engine));
    TranscodeCoordinator::new(Arc::new(lifecycle))
}

fn request(op: Operation, name: &str, size: u64) -> TranscodeRequest {
    TranscodeRequest::new(vec![7u8; 64], name, OperationParams::defaults(op)).with_source_size(size)
}

#[tokio::test]
async fn test_mov_to_mp4_end_to_end() {
    let engine = Arc::new(MemoryEngine::new());
    let coordinator = coordinator_with(engine.clone());

    let result = coordinator
        .execute(request(Operation::MovToMp4, "clip.mov", 10 * MB))
        .await
        .unwrap();

    let output = result.into_output().expect("expected a successful transcode");
    assert_eq!(output.mime, "video/mp4");
    assert_eq!(output.filename, "mov-to-mp4-output.mp4");
    assert_eq!(output.bytes, ENGINE_OUTPUT);

    let pipelines = engine.pipelines();
    assert_eq!(pipelines.len(), 1);
    let pipeline = &pipelines[0];
    assert!(pipeline.contains_sequence(&["-c:v", "libx264"]));
    assert!(pipeline.contains_sequence(&["-preset", "fast"]));
    assert!(pipeline.contains_sequence(&["-crf", "23"]));
    assert!(pipeline.contains_sequence(&["-c:a", "aac"]));
    assert!(pipeline.contains_sequence(&["-b:a", "128k"]));
    assert!(pipeline.contains_sequence(&["-movflags", "faststart"]));
    assert!(pipeline.value_of("-i").unwrap().ends_with("-input.mov"));
}

#[tokio::test]
async fn test_oversized_source_falls_back_without_loading() {
    let coordinator = coordinator_with(Arc::new(MemoryEngine::new()));

    let result = coordinator
        .execute(request(Operation::CompressVideo, "movie.mp4", 150 * MB))
        .await
        .unwrap();

    match result {
        TranscodeResult::Fallback { message } => assert!(message.contains("100 MB")),
        other => panic!("expected fallback, got {:?}", other),
    }
    assert_eq!(coordinator.lifecycle().load_attempts(), 0);
    assert_eq!(coordinator.lifecycle().state(), EngineState::Unloaded);
}

#[tokio::test]
async fn test_source_at_limit_is_admitted() {
    let coordinator = coordinator_with(Arc::new(MemoryEngine::new()));
    let result = coordinator
        .execute(request(Operation::MuteVideo, "clip.mp4", 100 * MB))
        .await
        .unwrap();
    assert!(!result.is_fallback());
}

#[tokio::test]
async fn test_missing_source() {
    let coordinator = coordinator_with(Arc::new(MemoryEngine::new()));

    let mut req = request(Operation::MuteVideo, "clip.mp4", 0);
    req.source = None;
    let err = coordinator.execute(req).await.unwrap_err();
    assert!(matches!(err, MediaError::InputMissing));

    let empty = TranscodeRequest::new(Vec::new(), "clip.mp4", OperationParams::MuteVideo);
    let err = coordinator.execute(empty).await.unwrap_err();
    assert!(matches!(err, MediaError::InputMissing));
    assert_eq!(coordinator.lifecycle().load_attempts(), 0);
}

#[test]
fn test_unknown_operation_is_rejected() {
    let err = TranscodeRequest::from_parts(
        Some(vec![1, 2, 3]),
        "clip.mp4",
        3,
        "stabilize-video",
        serde_json::Value::Null,
    )
    .unwrap_err();

    let err = MediaError::from(err);
    assert!(matches!(&err, MediaError::UnsupportedOperation(id) if id == "stabilize-video"));
    assert!(err.to_string().contains("stabilize-video"));
}

#[tokio::test]
async fn test_loose_params_reach_the_pipeline() {
    let engine = Arc::new(MemoryEngine::new());
    let coordinator = coordinator_with(engine.clone());

    let req = TranscodeRequest::from_parts(
        Some(vec![1; 16]),
        "clip.mp4",
        16,
        "rotate-video",
        json!({ "rotation": "270" }),
    )
    .unwrap();
    assert_eq!(
        req.params,
        OperationParams::RotateVideo(RotateParams {
            rotation: Rotation::Deg270
        })
    );

    coordinator.execute(req).await.unwrap();
    assert_eq!(engine.pipelines()[0].value_of("-vf"), Some("transpose=2"));
}

#[tokio::test]
async fn test_no_virtual_files_leak_after_success() {
    let engine = Arc::new(MemoryEngine::new());
    let coordinator = coordinator_with(engine.clone());
    assert!(engine.file_names().is_empty());

    for op in [Operation::Mp4ToMp3, Operation::VideoToGif, Operation::TrimVideo] {
        coordinator
            .execute(request(op, "clip.mp4", MB))
            .await
            .unwrap();
        assert!(engine.file_names().is_empty(), "{} leaked files", op);
    }
}

#[tokio::test]
async fn test_engine_failure_is_wrapped_and_cleaned_up() {
    let engine = Arc::new(MemoryEngine::failing());
    let coordinator = coordinator_with(engine.clone());

    let err = coordinator
        .execute(request(Operation::FlipVideo, "clip.mp4", MB))
        .await
        .unwrap_err();

    match &err {
        MediaError::TranscodeExecution { operation, source } => {
            assert_eq!(*operation, Operation::FlipVideo);
            assert!(source.to_string().contains("Conversion failed!"));
        }
        other => panic!("expected execution error, got {:?}", other),
    }
    assert!(engine.file_names().is_empty());
}

#[tokio::test]
async fn test_missing_output_is_an_execution_error() {
    let engine = Arc::new(MemoryEngine::without_output());
    let coordinator = coordinator_with(engine.clone());

    let err = coordinator
        .execute(request(Operation::GifToMp4, "loop.gif", MB))
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::TranscodeExecution { .. }));
    assert!(engine.file_names().is_empty());
}

/// A delete that fails must not turn a finished transcode into an error.
#[tokio::test]
async fn test_cleanup_failure_keeps_success() {
    let engine = Arc::new(MemoryEngine::new().with_failing_delete());
    let coordinator = coordinator_with(engine.clone());

    let result = coordinator
        .execute(request(Operation::MuteVideo, "clip.mp4", MB))
        .await
        .unwrap();

    let output = result.into_output().expect("expected a successful transcode");
    assert_eq!(output.bytes, ENGINE_OUTPUT);
    assert_eq!(engine.delete_attempts(), 2);
}

/// The engine failure, not the cleanup failure, is what the caller sees.
#[tokio::test]
async fn test_cleanup_failure_keeps_execution_error() {
    let engine = Arc::new(MemoryEngine::failing().with_failing_delete());
    let coordinator = coordinator_with(engine.clone());

    let err = coordinator
        .execute(request(Operation::FlipVideo, "clip.mp4", MB))
        .await
        .unwrap_err();

    match err {
        MediaError::TranscodeExecution { source, .. } => {
            assert!(source.to_string().contains("Conversion failed!"));
        }
        other => panic!("expected execution error, got {:?}", other),
    }
    assert_eq!(engine.delete_attempts(), 2);
}

#[tokio::test]
async fn test_engine_load_failure_surfaces() {
    let lifecycle = EngineLifecycle::new(
        CountingLoader::new(Arc::new(MemoryEngine::new())).failing_first(1),
    );
    let coordinator = TranscodeCoordinator::new(Arc::new(lifecycle));

    let err = coordinator
        .execute(request(Operation::MuteVideo, "clip.mp4", MB))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::EngineLoad(_)));

    // The next request retries the load and succeeds
    let result = coordinator
        .execute(request(Operation::MuteVideo, "clip.mp4", MB))
        .await
        .unwrap();
    assert!(!result.is_fallback());
}

/// Concurrent requests on one engine never share virtual file names.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_use_distinct_files() {
    let engine = Arc::new(MemoryEngine::new().with_exec_delay(Duration::from_millis(20)));
    let coordinator = coordinator_with(engine.clone());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .execute(request(Operation::MkvToMp4, "clip.mkv", MB))
                    .await
            })
        })
        .collect();

    for task in tasks {
        let output = task.await.unwrap().unwrap().into_output().unwrap();
        assert_eq!(output.filename, "mkv-to-mp4-output.mp4");
    }

    let pipelines = engine.pipelines();
    let inputs: HashSet<_> = pipelines
        .iter()
        .map(|p| p.value_of("-i").unwrap().to_string())
        .collect();
    assert_eq!(inputs.len(), 8);
    assert_eq!(coordinator.lifecycle().load_attempts(), 1);
    assert!(engine.file_names().is_empty());
}
