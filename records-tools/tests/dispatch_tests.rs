//! Record queries and dispatcher against the in-memory backend
//!
//! Exercises name resolution through every operation, per-call failure
//! isolation, deadlines and cancellation.

use async_trait::async_trait;
use chrono::NaiveDate;
use error_common::ErrorKind;
use mockall::mock;
use records_store::*;
use records_tools::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn steven_moss() -> Patient {
    Patient {
        id: "p-100".to_string(),
        name: "Steven Moss".to_string(),
        dob: date(1985, 3, 2),
        record: Some("Asthma. Complains of fatigue.".to_string()),
        created_at: None,
    }
}

fn scan(id: &str, scan_type: &str, scan_date: NaiveDate) -> Scan {
    Scan {
        id: id.to_string(),
        patient_id: "p-100".to_string(),
        scan_type: scan_type.to_string(),
        scan_date,
        image_url: Some(format!("https://cdn.test/{}.jpg", id)),
    }
}

fn seeded_backend() -> InMemoryRecordsBackend {
    InMemoryRecordsBackend::new()
        .with_patient(steven_moss())
        .with_scan(scan("s-1", "MRI", date(2024, 1, 10)))
        .with_scan(scan("s-2", "CT", date(2024, 3, 5)))
        .with_scan(scan("s-3", "Brain MRI", date(2024, 6, 20)))
}

fn queries(backend: InMemoryRecordsBackend) -> RecordQueries {
    RecordQueries::new(Arc::new(backend))
}

fn scan_ids(outcome: &ToolOutcome) -> Vec<String> {
    match outcome {
        Ok(ToolOutput::Scans { scans, .. }) => scans.iter().map(|s| s.id.clone()).collect(),
        other => panic!("expected scans, got {:?}", other),
    }
}

#[tokio::test]
async fn dob_lookup_by_first_name() {
    let queries = queries(seeded_backend());

    let outcome = queries.get_patient_dob("Steven").await;
    let envelope = serde_json::to_value(Envelope::from(&outcome)).unwrap();

    assert_eq!(
        envelope,
        json!({
            "success": true,
            "data": { "name": "Steven Moss", "dob": "1985-03-02" }
        })
    );
}

#[tokio::test]
async fn add_annotation_for_unknown_patient_fails() {
    let queries = queries(InMemoryRecordsBackend::new());

    let outcome = queries.add_annotation("Steven Moss", "Improved mobility", None).await;
    let envelope = Envelope::from(&outcome);

    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("Patient 'Steven Moss' not found"));
    assert_eq!(envelope.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn every_operation_reports_unmatched_fragment() {
    let queries = queries(seeded_backend());
    let fragment = "Zelda";

    let outcomes = vec![
        queries.get_patient_records(fragment).await,
        queries.get_patient_dob(fragment).await,
        queries.get_patient_scans(fragment, None).await,
        queries.get_mri_scans(fragment).await,
        queries.get_patient_annotations(fragment).await,
        queries.add_annotation(fragment, "note", None).await,
    ];

    for outcome in outcomes {
        let failure = outcome.unwrap_err();
        assert_eq!(failure.kind, ErrorKind::NotFound);
        assert!(failure.message.contains(fragment));
    }
}

#[tokio::test]
async fn added_annotation_is_listed() {
    let backend = seeded_backend();
    let queries = queries(backend.clone());

    let added = queries
        .add_annotation("steven moss", "Improved mobility", Some("s-1".to_string()))
        .await
        .unwrap();
    let added_id = match added {
        ToolOutput::AnnotationAdded { annotations } => annotations[0].id.clone(),
        other => panic!("unexpected output {:?}", other),
    };

    match queries.get_patient_annotations("Steven Moss").await.unwrap() {
        ToolOutput::Annotations {
            patient_name,
            annotations,
        } => {
            assert_eq!(patient_name, "Steven Moss");
            assert!(annotations.iter().any(|a| a.id == added_id && a.note == "Improved mobility"));
        }
        other => panic!("unexpected output {:?}", other),
    }
    assert_eq!(backend.annotation_count(), 1);
}

#[tokio::test]
async fn scan_queries_narrow_monotonically() {
    let queries = queries(seeded_backend());

    let all = scan_ids(&queries.get_patient_scans("Steven", None).await);
    let typed = scan_ids(&queries.get_patient_scans("Steven", Some("MRI")).await);
    let mri = scan_ids(&queries.get_mri_scans("Steven").await);

    assert_eq!(all, vec!["s-3", "s-2", "s-1"]);
    assert_eq!(typed, vec!["s-3", "s-1"]);
    assert!(mri.iter().all(|id| typed.contains(id)));
    assert!(typed.iter().all(|id| all.contains(id)));
}

#[tokio::test]
async fn unknown_operation_is_a_failure_not_a_fault() {
    let dispatcher = Dispatcher::new(queries(seeded_backend()));

    let outcome = dispatcher
        .dispatch(&RawToolCall::new("drop_patients", json!({ "name": "Steven" })))
        .await;

    let failure = outcome.unwrap_err();
    assert_eq!(failure.kind, ErrorKind::UnknownOperation);
    assert_eq!(render_text(&Err(failure)), "Error: Unknown function: drop_patients");
}

#[tokio::test]
async fn batch_runs_in_order_and_isolates_failures() {
    let dispatcher = Dispatcher::new(queries(seeded_backend()));
    let token = CancellationToken::new();

    let calls = vec![
        RawToolCall::new("get_patient_dob", json!({ "name": "Nobody" })),
        RawToolCall::new("not_a_tool", json!({})),
        RawToolCall::new("get_patient_dob", json!({})),
        RawToolCall::new("get_mri_scans", json!({ "name": "Steven" })),
    ];

    let records = dispatcher.dispatch_batch(&calls, &token).await;

    assert_eq!(records.len(), 4);
    assert_eq!(records[0].outcome.as_ref().unwrap_err().kind, ErrorKind::NotFound);
    assert_eq!(records[1].operation, None);
    assert_eq!(records[1].outcome.as_ref().unwrap_err().kind, ErrorKind::UnknownOperation);
    assert_eq!(records[2].outcome.as_ref().unwrap_err().kind, ErrorKind::InvalidArguments);
    assert_eq!(records[3].operation, Some(Operation::GetMriScans));
    assert_eq!(scan_ids(&records[3].outcome), vec!["s-3", "s-1"]);
}

#[tokio::test]
async fn cancelled_batch_skips_remaining_calls() {
    let dispatcher = Dispatcher::new(queries(seeded_backend()));
    let token = CancellationToken::new();
    token.cancel();

    let calls = vec![
        RawToolCall::new("get_patient_dob", json!({ "name": "Steven" })),
        RawToolCall::new("add_annotation", json!({ "patient_name": "Steven", "note": "x" })),
    ];
    let records = dispatcher.dispatch_batch(&calls, &token).await;

    for record in &records {
        assert_eq!(record.outcome.as_ref().unwrap_err().kind, ErrorKind::Cancelled);
    }
}

/// Backend whose lookups never finish in time
struct SlowBackend;

#[async_trait]
impl RecordsBackend for SlowBackend {
    async fn find_patients(&self, _fragment: &str) -> StoreResult<Vec<Patient>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![])
    }

    async fn scans_for_patient(&self, _: &str, _: Option<String>) -> StoreResult<Vec<Scan>> {
        Ok(vec![])
    }

    async fn annotations_for_patient(&self, _: &str) -> StoreResult<Vec<Annotation>> {
        Ok(vec![])
    }

    async fn insert_annotation(&self, _: NewAnnotation) -> StoreResult<Vec<Annotation>> {
        Ok(vec![])
    }

    async fn insert_patient(&self, _: NewPatient) -> StoreResult<Patient> {
        Err(StoreError::Backend("read only".to_string()))
    }

    async fn insert_scan(&self, _: NewScan) -> StoreResult<Scan> {
        Err(StoreError::Backend("read only".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn slow_call_times_out_without_blocking_the_batch() {
    let dispatcher = Dispatcher::new(RecordQueries::new(Arc::new(SlowBackend)))
        .with_call_timeout(Duration::from_millis(200));
    let token = CancellationToken::new();

    let calls = vec![
        RawToolCall::new("get_patient_dob", json!({ "name": "Steven" })),
        RawToolCall::new("unknown", json!({})),
    ];
    let records = dispatcher.dispatch_batch(&calls, &token).await;

    assert_eq!(records[0].outcome.as_ref().unwrap_err().kind, ErrorKind::Timeout);
    assert_eq!(records[1].outcome.as_ref().unwrap_err().kind, ErrorKind::UnknownOperation);
}

mock! {
    pub Backend {}

    #[async_trait]
    impl RecordsBackend for Backend {
        async fn find_patients(&self, fragment: &str) -> StoreResult<Vec<Patient>>;
        async fn scans_for_patient(&self, patient_id: &str, scan_type: Option<String>) -> StoreResult<Vec<Scan>>;
        async fn annotations_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Annotation>>;
        async fn insert_annotation(&self, annotation: NewAnnotation) -> StoreResult<Vec<Annotation>>;
        async fn insert_patient(&self, patient: NewPatient) -> StoreResult<Patient>;
        async fn insert_scan(&self, scan: NewScan) -> StoreResult<Scan>;
    }
}

#[tokio::test]
async fn backend_failure_is_classified() {
    let mut backend = MockBackend::new();
    backend
        .expect_find_patients()
        .returning(|_| Err(StoreError::Backend("connection refused".to_string())));

    let queries = RecordQueries::new(Arc::new(backend));
    let failure = queries.get_patient_dob("Steven").await.unwrap_err();

    assert_eq!(failure.kind, ErrorKind::BackendFailure);
    assert_eq!(render_text(&Err(failure)), "Error: Backend error: connection refused");
}

#[tokio::test]
async fn gateway_picks_lowest_identifier_whatever_the_backend_order() {
    let mut backend = MockBackend::new();
    backend.expect_find_patients().returning(|_| {
        let mut later = steven_moss();
        later.id = "p-900".to_string();
        later.name = "Steven Mossberg".to_string();
        Ok(vec![later, steven_moss()])
    });

    let queries = RecordQueries::new(Arc::new(backend));
    match queries.get_patient_dob("Steven").await.unwrap() {
        ToolOutput::DateOfBirth { name, .. } => assert_eq!(name, "Steven Moss"),
        other => panic!("unexpected output {:?}", other),
    }
}

#[tokio::test]
async fn add_annotation_writes_resolved_patient_and_scan() {
    let mut backend = MockBackend::new();
    backend
        .expect_find_patients()
        .withf(|fragment| fragment == "Steven")
        .returning(|_| Ok(vec![steven_moss()]));
    backend
        .expect_insert_annotation()
        .withf(|new| {
            new.patient_id == "p-100" && new.note == "Improved mobility" && new.scan_id.as_deref() == Some("s-1")
        })
        .times(1)
        .returning(|new| {
            Ok(vec![Annotation {
                id: "a-1".to_string(),
                patient_id: new.patient_id,
                scan_id: new.scan_id,
                note: new.note,
                created_at: Some(new.created_at),
            }])
        });

    let dispatcher = Dispatcher::new(RecordQueries::new(Arc::new(backend)));
    let outcome = dispatcher
        .dispatch(&RawToolCall::new(
            "add_annotation",
            json!({ "patient_name": "Steven", "note": "Improved mobility", "scan_id": "s-1" }),
        ))
        .await;

    assert_eq!(render_text(&outcome), "Annotation added successfully! ID: a-1");
}

#[tokio::test]
async fn mri_shortcut_filters_on_mri() {
    let mut backend = MockBackend::new();
    backend.expect_find_patients().returning(|_| Ok(vec![steven_moss()]));
    backend
        .expect_scans_for_patient()
        .withf(|patient_id, scan_type| patient_id == "p-100" && scan_type.as_deref() == Some("MRI"))
        .times(1)
        .returning(|_, _| Ok(vec![]));

    let queries = RecordQueries::new(Arc::new(backend));
    let outcome = queries.get_mri_scans("Steven").await;

    assert_eq!(render_text(&outcome), "No MRI scans found for Steven Moss.");
}
