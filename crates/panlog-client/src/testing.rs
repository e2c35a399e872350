//! Test utilities for panlog-client
//!
//! Provides [`FakeAppliance`], an in-process server that speaks the appliance
//! XML protocol with scriptable job outcomes, so client and orchestrator
//! behaviour can be exercised end-to-end without a real appliance.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use quick_xml::Writer;
use tokio::net::TcpListener;

use panlog_core::xml::write_entries;
use panlog_core::RawEntry;

use crate::{ApplianceClient, Result};

type Shared = Arc<Mutex<FakeState>>;

/// What a scripted job does once its pending polls are exhausted.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// Finish with these entries.
    Entries(Vec<RawEntry>),
    /// Report `FAIL` with this reason.
    Fail(String),
}

/// Script for one fetch job: how many polls report `ACT` before the outcome.
#[derive(Debug, Clone)]
pub struct JobScript {
    pub pending_polls: u32,
    pub outcome: JobOutcome,
}

impl JobScript {
    pub fn finishes_with(entries: Vec<RawEntry>) -> Self {
        Self {
            pending_polls: 0,
            outcome: JobOutcome::Entries(entries),
        }
    }

    pub fn fails(reason: impl Into<String>) -> Self {
        Self {
            pending_polls: 0,
            outcome: JobOutcome::Fail(reason.into()),
        }
    }

    pub fn after_polls(mut self, pending_polls: u32) -> Self {
        self.pending_polls = pending_polls;
        self
    }

    /// A job that never leaves `ACT`, for timeout tests.
    pub fn never_finishes() -> Self {
        Self::finishes_with(Vec::new()).after_polls(u32::MAX)
    }
}

/// One recorded fetch-initiation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRecord {
    pub log_type: String,
    pub nlogs: Option<u32>,
    pub skip: u32,
}

/// Mutable behaviour and bookkeeping of the fake appliance.
#[derive(Debug, Default)]
pub struct FakeState {
    /// Token handed out by keygen and required on log requests.
    pub api_key: String,
    /// When set, keygen answers with this error message.
    pub keygen_error: Option<String>,
    /// When set, fetch initiation succeeds but omits the job id.
    pub omit_job_id: bool,
    /// When set, every request answers with this literal body.
    pub raw_response: Option<String>,
    /// Scripts consumed in order, one per started job. Jobs started with an
    /// empty queue finish immediately with no entries.
    scripts: VecDeque<JobScript>,
    jobs: HashMap<String, JobScript>,
    next_job_id: u64,
    /// Fetch-initiation requests seen, in order.
    pub fetches: Vec<FetchRecord>,
}

impl FakeState {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn enqueue(&mut self, script: JobScript) {
        self.scripts.push_back(script);
    }

    pub fn enqueue_entries(&mut self, entries: Vec<RawEntry>) {
        self.enqueue(JobScript::finishes_with(entries));
    }
}

/// An in-process fake appliance that shuts down when dropped.
pub struct FakeAppliance {
    pub addr: SocketAddr,
    state: Shared,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl FakeAppliance {
    /// Start a fake appliance with the given behaviour.
    pub async fn start(state: FakeState) -> Result<Self> {
        let shared: Shared = Arc::new(Mutex::new(state));
        let router = Router::new()
            .route("/api/", get(api_handler))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give the server a moment to start accepting.
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            state: shared,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Host string suitable for [`ApplianceClient::new`].
    pub fn host(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client pointed at this fake appliance.
    pub fn client(&self) -> Result<ApplianceClient> {
        ApplianceClient::with_config(
            &self.host(),
            Duration::from_secs(5),
            Duration::from_secs(2),
            false,
        )
    }

    /// Shared handle to the behaviour state, for scripting and assertions.
    pub fn state(&self) -> Shared {
        self.state.clone()
    }

    /// Shutdown the server gracefully.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for FakeAppliance {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn error_body(msg: &str) -> String {
    format!(r#"<response status="error"><result><msg>{msg}</msg></result></response>"#)
}

fn entries_fragment(entries: &[RawEntry]) -> String {
    let mut writer = Writer::new(Vec::new());
    // Writing into a Vec cannot fail.
    write_entries(&mut writer, entries).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

async fn api_handler(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> String {
    let mut state = state.lock().unwrap();

    if let Some(body) = &state.raw_response {
        return body.clone();
    }

    match params.get("type").map(String::as_str) {
        Some("keygen") => match &state.keygen_error {
            Some(msg) => error_body(msg),
            None => format!(
                r#"<response status="success"><result><key>{}</key></result></response>"#,
                state.api_key
            ),
        },
        Some("log") => {
            if params.get("key") != Some(&state.api_key) {
                return error_body("Invalid credentials.");
            }
            if params.get("action").map(String::as_str) == Some("get") {
                poll_response(&mut state, params.get("job-id").cloned().unwrap_or_default())
            } else {
                start_response(&mut state, &params)
            }
        }
        _ => error_body("Unknown request type."),
    }
}

fn start_response(state: &mut FakeState, params: &HashMap<String, String>) -> String {
    state.fetches.push(FetchRecord {
        log_type: params.get("log-type").cloned().unwrap_or_default(),
        nlogs: params.get("nlogs").and_then(|n| n.parse().ok()),
        skip: params
            .get("skip")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0),
    });

    if state.omit_job_id {
        return r#"<response status="success"><result><msg>query queued</msg></result></response>"#
            .to_string();
    }

    state.next_job_id += 1;
    let id = state.next_job_id.to_string();
    let script = state
        .scripts
        .pop_front()
        .unwrap_or_else(|| JobScript::finishes_with(Vec::new()));
    state.jobs.insert(id.clone(), script);

    format!(
        r#"<response status="success"><result><msg>query job enqueued</msg><job>{id}</job></result></response>"#
    )
}

fn poll_response(state: &mut FakeState, job_id: String) -> String {
    let Some(script) = state.jobs.get_mut(&job_id) else {
        return error_body("Unknown job id.");
    };

    if script.pending_polls > 0 {
        script.pending_polls -= 1;
        return format!(
            r#"<response status="success"><result><job><id>{job_id}</id><status>ACT</status></job></result></response>"#
        );
    }

    match script.outcome.clone() {
        JobOutcome::Entries(entries) => format!(
            r#"<response status="success"><result><job><id>{job_id}</id><status>FIN</status></job><log><logs count="{}">{}</logs></log></result></response>"#,
            entries.len(),
            entries_fragment(&entries)
        ),
        JobOutcome::Fail(reason) => format!(
            r#"<response status="success"><result><job><id>{job_id}</id><status>FAIL</status></job><details>{reason}</details></result></response>"#
        ),
    }
}
