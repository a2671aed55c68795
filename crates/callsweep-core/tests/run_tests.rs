use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use callsweep_api::{
    ApiError, Authenticate, ConnectionSupervisor, DirectoryLookup, Handle, SessionQuery,
};
use callsweep_core::{
    RunContext, ScanError, ScanRunner, SubjectResolver, SubjectSource, PAGE_CAP,
};
use callsweep_records::{MediaCategory, Predicates, SessionRecord, Subject, TimeWindow};

const ALICE: &str = "sip:alice@example.com";
const BOB: &str = "sip:bob@example.com";
const CAROL: &str = "sip:carol@example.com";

/// Helper: the window every test scans, 2026-03-01 to 2026-03-08.
fn window() -> TimeWindow {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
    TimeWindow::new(start, end)
}

/// Helper: a record stamped for `subject_uri`.
fn session(subject_uri: &str, id: u32, media: &str, end: Option<DateTime<Utc>>) -> SessionRecord {
    SessionRecord {
        id: format!("{subject_uri}-{id}"),
        start_time: Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()),
        end_time: end,
        from_uri: subject_uri.to_string(),
        to_uri: "sip:peer@example.com".to_string(),
        from_number: None,
        to_number: None,
        referred_by: None,
        from_client_version: "Communicator/7.1".to_string(),
        to_client_version: "Communicator/7.2".to_string(),
        media_types: media.to_string(),
        subject_uri: subject_uri.to_string(),
        subject_display_name: subject_uri.to_string(),
        detail: Default::default(),
    }
}

/// Helper: a full page then a short page. Audio rows number 801 once the
/// boundary duplicate is counted: 500 in the full page, the duplicate,
/// and 300 fresh ones.
fn two_page_script(uri: &str, from: DateTime<Utc>) -> VecDeque<Vec<SessionRecord>> {
    let page1: Vec<_> = (0..PAGE_CAP as u32)
        .map(|i| {
            let media = if i % 2 == 1 { "audio" } else { "video" };
            session(
                uri,
                i,
                media,
                Some(from + chrono::Duration::seconds(i64::from(i) + 1)),
            )
        })
        .collect();
    let boundary = page1.last().unwrap().clone();
    let mut page2 = vec![boundary];
    page2.extend((0..300u32).map(|i| {
        session(
            uri,
            2000 + i,
            "audio",
            Some(from + chrono::Duration::seconds(2000 + i64::from(i))),
        )
    }));
    VecDeque::from(vec![page1, page2])
}

struct StubAuth {
    sign_ins: Arc<AtomicUsize>,
}

impl StubAuth {
    fn new() -> Self {
        Self {
            sign_ins: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Authenticate for StubAuth {
    async fn sign_in(&self) -> Result<Handle, ApiError> {
        self.sign_ins.fetch_add(1, Ordering::SeqCst);
        Ok(Handle::new("run-token"))
    }
}

fn run_setup() -> (ConnectionSupervisor, Arc<AtomicUsize>) {
    let auth = StubAuth::new();
    let sign_ins = auth.sign_ins.clone();
    (ConnectionSupervisor::new(Box::new(auth)), sign_ins)
}

struct FakeDirectory {
    users: Vec<Subject>,
}

#[async_trait]
impl DirectoryLookup for FakeDirectory {
    async fn enabled_users(&self, _handle: &Handle) -> Result<Vec<Subject>, ApiError> {
        Ok(self.users.iter().filter(|u| u.enabled).cloned().collect())
    }

    async fn find_user(&self, _handle: &Handle, uri: &str) -> Result<Option<Subject>, ApiError> {
        Ok(self.users.iter().find(|u| u.uri == uri).cloned())
    }
}

fn directory_of(uris: &[&str]) -> FakeDirectory {
    FakeDirectory {
        users: uris
            .iter()
            .map(|uri| Subject {
                uri: uri.to_string(),
                display_name: uri.to_string(),
                enabled: true,
            })
            .collect(),
    }
}

/// Query fake scripted per subject URI.
struct PerSubjectQuery {
    scripts: Mutex<HashMap<String, VecDeque<Vec<SessionRecord>>>>,
    fail_for: Option<String>,
}

impl PerSubjectQuery {
    fn new(scripts: HashMap<String, VecDeque<Vec<SessionRecord>>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            fail_for: None,
        }
    }

    fn failing_for(mut self, uri: &str) -> Self {
        self.fail_for = Some(uri.to_string());
        self
    }
}

#[async_trait]
impl SessionQuery for PerSubjectQuery {
    async fn sessions(
        &self,
        _handle: &Handle,
        subject: &Subject,
        _window: TimeWindow,
    ) -> Result<Vec<SessionRecord>, ApiError> {
        if self.fail_for.as_deref() == Some(subject.uri.as_str()) {
            return Err(ApiError::Status {
                status: 503,
                message: "service busy".to_string(),
            });
        }
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(&subject.uri).expect("unscripted subject");
        Ok(queue.pop_front().unwrap_or_default())
    }
}

// ============================================================
// Full run tests
// ============================================================

#[tokio::test(start_paused = true)]
async fn test_full_run_merges_subjects_in_roster_order() {
    let (mut supervisor, sign_ins) = run_setup();
    let directory = directory_of(&[CAROL, ALICE, BOB]);

    let roster = SubjectResolver::new(&directory, &mut supervisor)
        .resolve(&SubjectSource::Directory)
        .await
        .unwrap();
    let uris: Vec<_> = roster.iter().map(|s| s.uri.as_str()).collect();
    assert_eq!(uris, [ALICE, BOB, CAROL]);

    let from = window().start;
    let scripts = HashMap::from([
        (ALICE.to_string(), two_page_script(ALICE, from)),
        (BOB.to_string(), two_page_script(BOB, from)),
        (CAROL.to_string(), two_page_script(CAROL, from)),
    ]);
    let query = PerSubjectQuery::new(scripts);
    let predicates = Predicates {
        category: MediaCategory::Audio,
        ..Default::default()
    };
    let mut context = RunContext::new(window(), predicates);

    let seen: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut runner =
        ScanRunner::new(&query, &mut supervisor).with_progress(Box::new(move |index, subject| {
            sink.lock().unwrap().push((index, subject.uri.clone()));
        }));

    let report = runner.run(&roster, &mut context).await.unwrap();

    assert_eq!(report.records.len(), 2403);
    assert_eq!(report.summary.subjects, 3);
    assert_eq!(report.summary.raw_sessions, 3903);
    assert_eq!(report.summary.matched, 2403);
    assert!(report.truncated_subjects.is_empty());
    assert!(report.records.iter().all(|r| r.media_types.contains("audio")));

    // Results stay grouped by subject, subjects in roster order.
    let mut groups = Vec::new();
    let mut last = "";
    for record in &report.records {
        if record.subject_uri != last {
            groups.push(record.subject_uri.as_str());
            last = record.subject_uri.as_str();
        }
    }
    assert_eq!(groups, [ALICE, BOB, CAROL]);

    let alice_rows = report
        .records
        .iter()
        .filter(|r| r.subject_uri == ALICE)
        .count();
    assert_eq!(alice_rows, 801);

    // At most one duplicate per subject, from the window boundary.
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in &report.records {
        *counts.entry(record.id.as_str()).or_default() += 1;
    }
    assert!(counts.values().all(|&n| n <= 2));
    let dupes = counts.values().filter(|&&n| n > 1).count();
    assert_eq!(dupes, 3);

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        [
            (0, ALICE.to_string()),
            (1, BOB.to_string()),
            (2, CAROL.to_string())
        ]
    );

    // One sign-in carried the roster lookup and all six pages.
    assert_eq!(sign_ins.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_truncated_subjects_are_reported_by_uri() {
    let (mut supervisor, _) = run_setup();
    let directory = directory_of(&[ALICE, BOB]);
    let roster = SubjectResolver::new(&directory, &mut supervisor)
        .resolve(&SubjectSource::Directory)
        .await
        .unwrap();

    let from = window().start;
    let open_page: Vec<_> = (0..PAGE_CAP as u32)
        .map(|i| session(BOB, i, "audio", None))
        .collect();
    let scripts = HashMap::from([
        (
            ALICE.to_string(),
            VecDeque::from(vec![vec![session(
                ALICE,
                1,
                "audio",
                Some(from + chrono::Duration::hours(1)),
            )]]),
        ),
        (BOB.to_string(), VecDeque::from(vec![open_page])),
    ]);
    let query = PerSubjectQuery::new(scripts);
    let mut context = RunContext::new(window(), Predicates::default());
    let mut runner = ScanRunner::new(&query, &mut supervisor);

    let report = runner.run(&roster, &mut context).await.unwrap();

    assert_eq!(report.truncated_subjects, [BOB.to_string()]);
    // Bob's open sessions were dropped by the default predicates but
    // still counted as fetched.
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.summary.raw_sessions, 1001);
    assert_eq!(report.summary.matched, 1);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_error_discards_partial_results() {
    let (mut supervisor, _) = run_setup();
    let directory = directory_of(&[ALICE, BOB]);
    let roster = SubjectResolver::new(&directory, &mut supervisor)
        .resolve(&SubjectSource::Directory)
        .await
        .unwrap();

    let from = window().start;
    let scripts = HashMap::from([(
        ALICE.to_string(),
        VecDeque::from(vec![vec![session(
            ALICE,
            1,
            "audio",
            Some(from + chrono::Duration::hours(1)),
        )]]),
    )]);
    let query = PerSubjectQuery::new(scripts).failing_for(BOB);
    let mut context = RunContext::new(window(), Predicates::default());

    let seen: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut runner =
        ScanRunner::new(&query, &mut supervisor).with_progress(Box::new(move |index, subject| {
            sink.lock().unwrap().push((index, subject.uri.clone()));
        }));

    let result = runner.run(&roster, &mut context).await;

    assert!(matches!(
        result,
        Err(ScanError::Query { ref subject, .. }) if subject == BOB
    ));
    // Alice finished before the failure surfaced.
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        [(0, ALICE.to_string()), (1, BOB.to_string())]
    );
}
