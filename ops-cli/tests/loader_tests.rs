//! Dataset loading and the query turn against in-memory stores

use async_trait::async_trait;
use ops_cli::interactive::Step;
use ops_cli::loader::LoadedRow;
use ops_cli::*;
use records_store::*;
use records_tools::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const SELECTION_TIMEOUT: Duration = Duration::from_secs(30);

fn row(line: usize, name: &str, dob: &str, scan_file: &str) -> PatientRow {
    PatientRow {
        line,
        name: name.to_string(),
        dob: dob.to_string(),
        record: "Asthma. Complains of cough.".to_string(),
        scan_file: scan_file.to_string(),
        annotation: "Mild edema noted in central area.".to_string(),
    }
}

fn data_dir_with(files: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("mri_scans")).unwrap();
    for file in files {
        std::fs::write(dir.path().join(file), b"\xFF\xD8\xFFscan").unwrap();
    }
    dir
}

struct Fixture {
    backend: Arc<InMemoryRecordsBackend>,
    store: Arc<InMemoryObjectStore>,
    loader: Loader,
    _dir: TempDir,
}

fn fixture(files: &[&str]) -> Fixture {
    let dir = data_dir_with(files);
    let backend = Arc::new(InMemoryRecordsBackend::new());
    let store = Arc::new(InMemoryObjectStore::new());
    let loader = Loader::new(backend.clone(), store.clone(), dir.path());
    Fixture {
        backend,
        store,
        loader,
        _dir: dir,
    }
}

#[tokio::test]
async fn loaded_row_is_queryable_as_an_mri_scan() {
    let fx = fixture(&["mri_scans/Tr-no_0010.jpg"]);

    let loaded = fx
        .loader
        .load_row(&row(2, "Steven Moss", "1985-03-02", "mri_scans/Tr-no_0010.jpg"))
        .await
        .unwrap();

    let object_path = format!("{}_Tr-no_0010.jpg", loaded.patient_id);
    assert_eq!(loaded.image_url, format!("memory://public/{}", object_path));
    assert_eq!(fx.store.get(&object_path).unwrap(), b"\xFF\xD8\xFFscan".to_vec());

    let queries = RecordQueries::new(fx.backend.clone());
    match queries.get_mri_scans("steven").await.unwrap() {
        ToolOutput::Scans { scans, mri_only, .. } => {
            assert!(mri_only);
            assert_eq!(scans.len(), 1);
            assert_eq!(scans[0].id, loaded.scan_id);
            assert_eq!(scans[0].scan_type, "MRI");
            assert_eq!(scans[0].scan_date, chrono::Utc::now().date_naive());
        }
        other => panic!("expected scans, got {:?}", other),
    }

    match queries.get_patient_annotations("Steven Moss").await.unwrap() {
        ToolOutput::Annotations { annotations, .. } => {
            assert_eq!(annotations.len(), 1);
            assert_eq!(annotations[0].scan_id.as_deref(), Some(loaded.scan_id.as_str()));
            assert_eq!(annotations[0].note, "Mild edema noted in central area.");
        }
        other => panic!("expected annotations, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_scan_file_skips_the_row_without_writing() {
    let fx = fixture(&["mri_scans/Tr-no_0010.jpg"]);
    let rows = vec![
        row(2, "Steven Moss", "1985-03-02", "mri_scans/Tr-no_0010.jpg"),
        row(3, "Jane Roe", "1970-01-01", "mri_scans/Tr-no_0011.jpg"),
    ];

    let mut reports = Vec::new();
    let summary = fx.loader.load_all(&rows, |r| reports.push(r.clone())).await;

    assert_eq!(summary, LoadSummary { loaded: 1, skipped: 1, failed: 0 });
    assert!(matches!(reports[0].status, RowStatus::Loaded(LoadedRow { .. })));
    match &reports[1].status {
        RowStatus::Skipped(reason) => {
            assert!(reason.starts_with("Scan file not found"));
            assert!(reason.contains("Tr-no_0011.jpg"));
        }
        other => panic!("expected skip, got {:?}", other),
    }
    assert_eq!(fx.backend.patient_count(), 1);
    assert_eq!(fx.store.len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_scan_path_fails_instead_of_skipping() {
    let fx = fixture(&["mri_scans/Tr-no_0010.jpg"]);
    // Resolving a self-referencing link fails with ELOOP rather than "not found"
    std::os::unix::fs::symlink("loop.jpg", fx._dir.path().join("mri_scans/loop.jpg")).unwrap();
    let rows = vec![
        row(2, "Steven Moss", "1985-03-02", "mri_scans/loop.jpg"),
        row(3, "Jane Roe", "1970-01-01", "mri_scans/Tr-no_0010.jpg"),
    ];

    let mut reports = Vec::new();
    let summary = fx.loader.load_all(&rows, |r| reports.push(r.clone())).await;

    assert_eq!(summary, LoadSummary { loaded: 1, skipped: 0, failed: 1 });
    match &reports[0].status {
        RowStatus::Failed(reason) => {
            assert!(reason.starts_with("Failed to read scan file"));
            assert!(reason.contains("loop.jpg"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(fx.backend.patient_count(), 1);
    assert_eq!(fx.store.len(), 1);
}

#[tokio::test]
async fn invalid_dob_fails_only_that_row() {
    let fx = fixture(&["mri_scans/Tr-no_0010.jpg", "mri_scans/Tr-no_0011.jpg"]);
    let rows = vec![
        row(2, "Steven Moss", "03/02/1985", "mri_scans/Tr-no_0010.jpg"),
        row(3, "Jane Roe", "1970-01-01", "mri_scans/Tr-no_0011.jpg"),
    ];

    let mut reports = Vec::new();
    let summary = fx.loader.load_all(&rows, |r| reports.push(r.clone())).await;

    assert_eq!(summary, LoadSummary { loaded: 1, skipped: 0, failed: 1 });
    assert_eq!(reports[0].line, 2);
    assert_eq!(
        reports[0].status,
        RowStatus::Failed("Invalid date of birth '03/02/1985', expected YYYY-MM-DD".to_string())
    );
    assert_eq!(fx.backend.patient_count(), 1);
}

struct RejectingStore;

#[async_trait]
impl ObjectStore for RejectingStore {
    async fn upload(&self, path: &str, _data: Vec<u8>, _content_type: &str) -> StoreResult<String> {
        Err(StoreError::Storage(format!("The resource already exists: {}", path)))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://public/{}", path)
    }
}

#[tokio::test]
async fn upload_failure_is_reported_and_loading_continues() {
    let dir = data_dir_with(&["mri_scans/a.jpg", "mri_scans/b.jpg"]);
    let backend = Arc::new(InMemoryRecordsBackend::new());
    let loader = Loader::new(backend.clone(), Arc::new(RejectingStore), dir.path());
    let rows = vec![
        row(2, "Steven Moss", "1985-03-02", "mri_scans/a.jpg"),
        row(3, "Jane Roe", "1970-01-01", "mri_scans/b.jpg"),
    ];

    let mut reports = Vec::new();
    let summary = loader.load_all(&rows, |r| reports.push(r.clone())).await;

    assert_eq!(summary.failed, 2);
    assert!(reports
        .iter()
        .all(|r| matches!(&r.status, RowStatus::Failed(e) if e.starts_with("Storage error"))));
    assert_eq!(backend.scan_count(), 0);
    assert_eq!(backend.annotation_count(), 0);
}

#[tokio::test]
async fn generated_dataset_loads_end_to_end() {
    use rand::SeedableRng;

    let rows = dataset::generate(3, 10, &mut rand::rngs::StdRng::seed_from_u64(3));
    let fx = fixture(&[
        "mri_scans/Tr-no_0010.jpg",
        "mri_scans/Tr-no_0011.jpg",
        "mri_scans/Tr-no_0012.jpg",
    ]);

    let parsed = dataset::from_csv(&dataset::to_csv(&rows)).unwrap();
    let summary = fx.loader.load_all(&parsed, |_| {}).await;

    assert_eq!(summary.loaded, 3);
    assert_eq!(fx.backend.scan_count(), 3);
    assert_eq!(fx.backend.annotation_count(), 3);
    assert_eq!(fx.store.len(), 3);
}

struct ScriptedSelector(Selection);

#[async_trait]
impl ToolSelector for ScriptedSelector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn select(&self, _text: &str) -> ToolResult<Selection> {
        Ok(self.0.clone())
    }
}

fn steven_backend() -> Arc<InMemoryRecordsBackend> {
    Arc::new(InMemoryRecordsBackend::new().with_patient(Patient {
        id: "p-1".to_string(),
        name: "Steven Moss".to_string(),
        dob: chrono::NaiveDate::from_ymd_opt(1985, 3, 2).unwrap(),
        record: None,
        created_at: None,
    }))
}

#[tokio::test]
async fn query_turn_prints_each_call_and_its_result() {
    let selector = ScriptedSelector(Selection {
        calls: vec![
            RawToolCall::new("get_patient_dob", json!({ "name": "Steven" })),
            RawToolCall::new("get_patient_dob", json!({ "name": "Nobody" })),
        ],
        reply: None,
    });
    let dispatcher = Dispatcher::new(RecordQueries::new(steven_backend()));

    let steps = answer(&selector, &dispatcher, "dob please", SELECTION_TIMEOUT, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(steps.len(), 2);
    let first = steps[0].to_string();
    assert!(first.starts_with("\nExecuting: get_patient_dob with {\"name\":\"Steven\"}"));
    assert!(first.contains("\n\nResult:\n"));
    assert!(first.contains("1985-03-02"));
    match &steps[1] {
        Step::Executed { result, .. } => assert_eq!(result, "Error: Patient 'Nobody' not found"),
        other => panic!("expected executed call, got {:?}", other),
    }
}

#[tokio::test]
async fn query_turn_without_calls_prints_the_reply() {
    let selector = ScriptedSelector(Selection {
        calls: vec![],
        reply: Some("Which patient do you mean?".to_string()),
    });
    let dispatcher = Dispatcher::new(RecordQueries::new(steven_backend()));

    let steps = answer(&selector, &dispatcher, "hello", SELECTION_TIMEOUT, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(steps, vec![Step::Reply("Which patient do you mean?".to_string())]);
    assert_eq!(steps[0].to_string(), "\nResponse: Which patient do you mean?");
}

/// Selector whose model never answers
struct StalledSelector;

#[async_trait]
impl ToolSelector for StalledSelector {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn select(&self, _text: &str) -> ToolResult<Selection> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_selection_times_out() {
    let dispatcher = Dispatcher::new(RecordQueries::new(steven_backend()));

    let err = answer(&StalledSelector, &dispatcher, "dob please", Duration::from_secs(30), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::Timeout(after) if after == Duration::from_secs(30)));
    assert_eq!(err.to_string(), "Timed out after 30s");
}

#[tokio::test]
async fn cancelled_turn_skips_selection() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let dispatcher = Dispatcher::new(RecordQueries::new(steven_backend()));

    let err = answer(&StalledSelector, &dispatcher, "dob please", SELECTION_TIMEOUT, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::Cancelled));
}
