//! Batch pipeline integration tests.
//!
//! These tests drive whole batches through the orchestrator with the
//! mock fetcher and engine:
//! - Download, normalize, merge and publish as one flow
//! - Clip ordering guarantees under slow downloads
//! - Failure isolation and scratch cleanup
//! - Progress events

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use reelstitch_core::{
    load_manifest,
    testing::{fixtures, EngineCall, MockEngine, MockFetcher},
    BatchEvent, BatchOrchestrator, BatchPipeline, BatchState, Dispatcher, EngineError,
    OrchestratorConfig, PathsConfig, StorageLayout,
};

/// Test helper wiring the orchestrator to both mocks inside a temp dir.
struct TestHarness {
    temp_dir: TempDir,
    fetcher: Arc<MockFetcher>,
    engine: Arc<MockEngine>,
    orchestrator: BatchOrchestrator<MockFetcher, MockEngine>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(OrchestratorConfig::default())
    }

    fn with_config(config: OrchestratorConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let layout = StorageLayout::rooted_at(temp_dir.path(), &PathsConfig::default());
        let fetcher = Arc::new(MockFetcher::new());
        let engine = Arc::new(MockEngine::new());
        let pipeline = Arc::new(BatchPipeline::new(
            Dispatcher::new(Arc::clone(&fetcher), 4),
            Arc::clone(&engine),
            layout,
            2,
        ));
        let orchestrator = BatchOrchestrator::new(config, pipeline);

        Self {
            temp_dir,
            fetcher,
            engine,
            orchestrator,
        }
    }

    fn downloaded_path(&self, file_name: &str) -> PathBuf {
        self.temp_dir.path().join("downloaded").join(file_name)
    }

    fn normalized_path(&self, file_name: &str) -> PathBuf {
        self.temp_dir.path().join("normalized").join(file_name)
    }

    fn merged_path(&self, batch: &str) -> PathBuf {
        self.temp_dir
            .path()
            .join("merged")
            .join(format!("{batch}.mp4"))
    }

    fn batch_scratch(&self, batch: &str) -> PathBuf {
        self.temp_dir.path().join("temp").join(batch)
    }

    async fn join_video_inputs(&self) -> Vec<PathBuf> {
        self.engine
            .recorded_calls()
            .await
            .into_iter()
            .find_map(|call| match call {
                EngineCall::JoinVideo { inputs, .. } => Some(inputs),
                _ => None,
            })
            .expect("no join_video call recorded")
    }
}

// =============================================================================
// Happy Path Tests
// =============================================================================

#[tokio::test]
async fn test_batch_downloads_normalizes_and_publishes() {
    let harness = TestHarness::new();
    let batches = vec![fixtures::batch(
        "intro",
        &[
            "https://cdn.test/a.mp4",
            "https://cdn.test/b.mp4",
            "https://cdn.test/c.mp4",
        ],
    )];

    let summary = harness.orchestrator.run(&batches, None).await.unwrap();

    assert!(summary.all_succeeded());
    let report = &summary.reports[0];
    assert_eq!(report.state, BatchState::Done);
    assert_eq!(report.clip_count, 3);
    assert_eq!(report.incomplete_downloads, 0);
    assert_eq!(report.output, Some(harness.merged_path("intro")));

    // The published file really exists and the scratch dir is gone
    assert!(harness.merged_path("intro").exists());
    assert!(!harness.batch_scratch("intro").exists());

    // Downloads landed under sequence-numbered names
    let mut names: Vec<String> = harness
        .fetcher
        .recorded_calls()
        .await
        .into_iter()
        .map(|c| c.file_name)
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["intro-001.mp4", "intro-002.mp4", "intro-003.mp4"]
    );
}

#[tokio::test]
async fn test_mixed_source_kinds_reach_the_fetcher() {
    let harness = TestHarness::new();
    let batches = vec![fixtures::batch(
        "mixed",
        &["https://cdn.test/a.mp4", "asset-123", "file:///srv/c.mov"],
    )];

    let summary = harness.orchestrator.run(&batches, None).await.unwrap();
    assert!(summary.all_succeeded());

    // Asset ids default to .mp4, URL extensions are kept
    let mut calls: Vec<(String, String)> = harness
        .fetcher
        .recorded_calls()
        .await
        .into_iter()
        .map(|c| (c.file_name, c.source))
        .collect();
    calls.sort();
    assert_eq!(
        calls,
        vec![
            (
                "mixed-001.mp4".to_string(),
                "https://cdn.test/a.mp4".to_string()
            ),
            ("mixed-002.mp4".to_string(), "asset-123".to_string()),
            (
                "mixed-003.mov".to_string(),
                "file:///srv/c.mov".to_string()
            ),
        ]
    );
}

#[tokio::test]
async fn test_manifest_rows_drive_the_run() {
    let harness = TestHarness::new();
    let manifest_path = harness.temp_dir.path().join("batches.json");
    std::fs::write(
        &manifest_path,
        fixtures::manifest_json(&[
            ("intro", "https://cdn.test/second.mp4", 2),
            ("outro", "https://cdn.test/closing.mp4", 1),
            ("intro", "https://cdn.test/first.mp4", 1),
        ]),
    )
    .expect("Failed to write manifest");

    let batches = load_manifest(&manifest_path).await.unwrap();
    let summary = harness.orchestrator.run(&batches, None).await.unwrap();

    // Groups keep first-appearance order even with interleaved rows
    let names: Vec<&str> = summary.reports.iter().map(|r| r.batch.as_str()).collect();
    assert_eq!(names, vec!["intro", "outro"]);
    assert!(summary.all_succeeded());

    // Within the group, the `order` field decides the sequence number
    let calls = harness.fetcher.recorded_calls().await;
    let first = calls
        .iter()
        .find(|c| c.file_name == "intro-001.mp4")
        .expect("intro-001 was never fetched");
    assert_eq!(first.source, "https://cdn.test/first.mp4");
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[tokio::test]
async fn test_join_preserves_manifest_order_despite_slow_downloads() {
    let harness = TestHarness::new();
    harness
        .fetcher
        .set_delay("https://cdn.test/a.mp4", Duration::from_millis(120))
        .await;
    harness
        .fetcher
        .set_delay("https://cdn.test/b.mp4", Duration::from_millis(60))
        .await;

    let batches = vec![fixtures::batch(
        "epic",
        &[
            "https://cdn.test/a.mp4",
            "https://cdn.test/b.mp4",
            "https://cdn.test/c.mp4",
        ],
    )];
    let summary = harness.orchestrator.run(&batches, None).await.unwrap();
    assert!(summary.all_succeeded());

    // Downloads completed in inverted order...
    let completion: Vec<String> = harness
        .fetcher
        .recorded_calls()
        .await
        .into_iter()
        .map(|c| c.file_name)
        .collect();
    assert_eq!(
        completion,
        vec!["epic-003.mp4", "epic-002.mp4", "epic-001.mp4"]
    );

    // ...but the join still sees clips in manifest order
    let inputs = harness.join_video_inputs().await;
    assert_eq!(
        inputs,
        vec![
            harness.downloaded_path("epic-001.mp4"),
            harness.downloaded_path("epic-002.mp4"),
            harness.downloaded_path("epic-003.mp4"),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_batches_report_in_input_order() {
    let harness = TestHarness::with_config(OrchestratorConfig {
        max_concurrent_batches: 2,
    });
    harness
        .fetcher
        .set_delay("https://cdn.test/slow.mp4", Duration::from_millis(150))
        .await;

    let batches = vec![
        fixtures::batch("slow", &["https://cdn.test/slow.mp4"]),
        fixtures::batch("fast", &["https://cdn.test/fast.mp4"]),
    ];
    let summary = harness.orchestrator.run(&batches, None).await.unwrap();

    let names: Vec<&str> = summary.reports.iter().map(|r| r.batch.as_str()).collect();
    assert_eq!(names, vec!["slow", "fast"]);
    assert!(summary.all_succeeded());

    // The fast batch really overtook the slow one
    let calls = harness.fetcher.recorded_calls().await;
    assert_eq!(calls[0].source, "https://cdn.test/fast.mp4");
}

// =============================================================================
// Normalize Tests
// =============================================================================

#[tokio::test]
async fn test_canonical_clips_skip_the_transcode() {
    let harness = TestHarness::new();
    let batches = vec![fixtures::batch("intro", &["https://cdn.test/a.mp4"])];

    let summary = harness.orchestrator.run(&batches, None).await.unwrap();
    assert!(summary.all_succeeded());

    let calls = harness.engine.recorded_calls().await;
    assert!(
        !calls
            .iter()
            .any(|c| matches!(c, EngineCall::Normalize { .. })),
        "canonical clip should not be transcoded"
    );

    // The join works off the download itself, audio off the same file
    let inputs = harness.join_video_inputs().await;
    assert_eq!(inputs, vec![harness.downloaded_path("intro-001.mp4")]);
    assert!(harness.normalized_path("intro-001.aac").exists());
}

#[tokio::test]
async fn test_non_canonical_clip_is_transcoded_once() {
    let harness = TestHarness::new();
    let downloaded = harness.downloaded_path("intro-001.mp4");
    harness
        .engine
        .set_probe(&downloaded, MockEngine::non_canonical_info(&downloaded))
        .await;

    let batches = vec![fixtures::batch("intro", &["https://cdn.test/a.mp4"])];
    let summary = harness.orchestrator.run(&batches, None).await.unwrap();
    assert!(summary.all_succeeded());

    let calls = harness.engine.recorded_calls().await;
    let normalizes: Vec<_> = calls
        .iter()
        .filter_map(|c| match c {
            EngineCall::Normalize { input, output } => Some((input.clone(), output.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        normalizes,
        vec![(
            downloaded.clone(),
            harness.normalized_path("intro-001.mp4")
        )]
    );

    // Join and audio extraction both use the transcoded file
    let inputs = harness.join_video_inputs().await;
    assert_eq!(inputs, vec![harness.normalized_path("intro-001.mp4")]);
    let extract_input = calls
        .iter()
        .find_map(|c| match c {
            EngineCall::ExtractAudio { input, .. } => Some(input.clone()),
            _ => None,
        })
        .expect("no extract_audio call recorded");
    assert_eq!(extract_input, harness.normalized_path("intro-001.mp4"));
}

// =============================================================================
// Failure Tests
// =============================================================================

#[tokio::test]
async fn test_failed_download_spares_other_batches() {
    let harness = TestHarness::new();
    harness
        .fetcher
        .set_failure("https://cdn.test/broken.mp4")
        .await;

    let batches = vec![
        fixtures::batch("doomed", &["https://cdn.test/broken.mp4"]),
        fixtures::batch("fine", &["https://cdn.test/good.mp4"]),
    ];
    let summary = harness.orchestrator.run(&batches, None).await.unwrap();

    assert_eq!(summary.failed_batches(), vec!["doomed"]);
    let failed = &summary.reports[0];
    assert_eq!(failed.state, BatchState::Failed);
    assert_eq!(failed.failed_stage, Some(BatchState::Downloading));
    assert!(failed.error.as_deref().unwrap_or("").contains("503"));

    // Nothing was published for the failed batch, the healthy one landed
    assert!(!harness.merged_path("doomed").exists());
    assert!(harness.merged_path("fine").exists());
}

#[tokio::test]
async fn test_incomplete_download_is_counted_not_fatal() {
    let harness = TestHarness::new();
    harness
        .fetcher
        .set_incomplete("https://cdn.test/short.mp4")
        .await;

    let batches = vec![fixtures::batch(
        "intro",
        &["https://cdn.test/full.mp4", "https://cdn.test/short.mp4"],
    )];
    let summary = harness.orchestrator.run(&batches, None).await.unwrap();

    assert!(summary.all_succeeded());
    assert_eq!(summary.reports[0].incomplete_downloads, 1);
    assert!(harness.merged_path("intro").exists());
}

#[tokio::test]
async fn test_mux_failure_publishes_nothing() {
    let harness = TestHarness::new();
    harness
        .engine
        .set_failure(
            "mux",
            EngineError::stage_failed("mux", "container rejected stream", None),
        )
        .await;

    let batches = vec![fixtures::batch("intro", &["https://cdn.test/a.mp4"])];
    let summary = harness.orchestrator.run(&batches, None).await.unwrap();

    let report = &summary.reports[0];
    assert_eq!(report.state, BatchState::Failed);
    assert_eq!(report.failed_stage, Some(BatchState::Merging));

    // No partial output escapes the scratch dir, and scratch is cleaned
    assert!(!harness.merged_path("intro").exists());
    assert!(!harness.batch_scratch("intro").exists());
}

// =============================================================================
// Publish Tests
// =============================================================================

#[tokio::test]
async fn test_rerun_overwrites_published_output() {
    let harness = TestHarness::new();
    let published = harness.merged_path("intro");
    std::fs::create_dir_all(published.parent().unwrap()).unwrap();
    std::fs::write(&published, b"stale").unwrap();

    let batches = vec![fixtures::batch("intro", &["https://cdn.test/a.mp4"])];
    let summary = harness.orchestrator.run(&batches, None).await.unwrap();

    assert!(summary.all_succeeded());
    let content = std::fs::read_to_string(&published).unwrap();
    assert_ne!(content, "stale", "rerun should replace the old output");
}

// =============================================================================
// Progress Event Tests
// =============================================================================

#[tokio::test]
async fn test_progress_events_follow_the_stages() {
    let harness = TestHarness::new();
    let (tx, mut rx) = mpsc::channel(100);

    let batches = vec![fixtures::batch("intro", &["https://cdn.test/a.mp4"])];
    let summary = harness.orchestrator.run(&batches, Some(tx)).await.unwrap();
    assert!(summary.all_succeeded());

    let mut stages = Vec::new();
    while let Some(event) = rx.recv().await {
        stages.push(match event {
            BatchEvent::Downloading { .. } => "downloading",
            BatchEvent::Normalizing { .. } => "normalizing",
            BatchEvent::Merging { .. } => "merging",
            BatchEvent::Completed { .. } => "completed",
            BatchEvent::Failed { .. } => "failed",
        });
    }
    assert_eq!(
        stages,
        vec!["downloading", "normalizing", "merging", "completed"]
    );
}

#[tokio::test]
async fn test_failure_event_names_the_stage() {
    let harness = TestHarness::new();
    harness
        .fetcher
        .set_failure("https://cdn.test/broken.mp4")
        .await;
    let (tx, mut rx) = mpsc::channel(100);

    let batches = vec![fixtures::batch("doomed", &["https://cdn.test/broken.mp4"])];
    harness.orchestrator.run(&batches, Some(tx)).await.unwrap();

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }
    match last {
        Some(BatchEvent::Failed {
            batch,
            failed_stage,
            ..
        }) => {
            assert_eq!(batch, "doomed");
            assert_eq!(failed_stage, "downloading");
        }
        other => panic!("expected a failed event, got {:?}", other),
    }
}
