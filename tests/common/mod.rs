//! In-process mock of the diagnostic server the console talks to.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use diag_console::api::probe::{ProbeConfigRequest, ProbeHistoryEntry, ProbeStatus};
use diag_console::api::queue::{Message, QueueStat, QueueStats};
use diag_console::api::system::{DnsQuery, DnsResponse, EnvStatus, MemStats, MemoryStatus};
use diag_console::api::workload::{KeyRecord, WorkloadConfig, WorkloadStatus};
use diag_console::ConsoleConfig;

#[derive(Default)]
struct Probe {
    fail_next: i64,
    history: Vec<ProbeHistoryEntry>,
}

#[derive(Default)]
struct Queue {
    messages: VecDeque<Message>,
    enqueued: u64,
    dequeued: u64,
    drained: u64,
}

#[derive(Default)]
struct Inner {
    probes: HashMap<&'static str, Probe>,
    /// Answer probe PUTs with an empty 200 instead of echoing the state.
    silent_put: bool,
    /// Every request is answered with this status and body.
    failure: Option<(u16, String)>,
    delay: Option<Duration>,
    workload: WorkloadStatus,
    /// Insertion order, which is deliberately not name order.
    queues: Vec<(String, Queue)>,
    next_message: u64,
    mem: MemStats,
    env: EnvStatus,
}

#[derive(Clone, Default)]
struct Shared {
    inner: Arc<Mutex<Inner>>,
    requests: Arc<AtomicUsize>,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

pub struct MockServer {
    addr: SocketAddr,
    shared: Shared,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> Self {
        let shared = Shared::default();
        {
            let mut inner = shared.lock();
            inner.env = EnvStatus {
                command_line: vec!["/bin/diag-server".into(), "--port=8080".into()],
                env: BTreeMap::from([
                    ("PATH".to_string(), "/usr/bin".to_string()),
                    ("HOME".to_string(), "/root".to_string()),
                ]),
            };
            inner.mem = MemStats {
                heap_alloc: 4096,
                heap_idle: 2048,
                heap_released: 1024,
                stack_inuse: 512,
            };
        }

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(shared.clone());
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, shared, task }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Defaults with this server's URL and short timings.
    pub fn config(&self) -> ConsoleConfig {
        let mut config = ConsoleConfig::default();
        config.server.base_url = self.url();
        config.server.request_timeout_ms = 1000;
        config.sync.poll_interval_ms = 50;
        config.sync.recovery_ms = 200;
        config
    }

    pub fn requests(&self) -> usize {
        self.shared.requests.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, status: u16, body: &str) {
        self.shared.lock().failure = Some((status, body.to_string()));
    }

    pub fn recover(&self) {
        self.shared.lock().failure = None;
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        self.shared.lock().delay = delay;
    }

    pub fn set_silent_put(&self, silent: bool) {
        self.shared.lock().silent_put = silent;
    }

    pub fn add_queue(&self, name: &str) {
        self.shared.lock().queues.push((name.to_string(), Queue::default()));
    }

    pub fn push_key(&self, data: &str) {
        let mut inner = self.shared.lock();
        let id = inner.workload.history.len() as u64 + 1;
        inner.workload.history.push(KeyRecord {
            id,
            data: data.to_string(),
        });
    }

    pub fn workload_config(&self) -> WorkloadConfig {
        self.shared.lock().workload.config.clone()
    }

    pub fn probe_fail_next(&self, path: &'static str) -> i64 {
        self.shared.lock().probes.entry(path).or_default().fail_next
    }

    /// Invoke the probe itself, as the orchestrator would.
    pub async fn hit_probe(&self, path: &str) -> u16 {
        reqwest::get(format!("{}{}", self.url(), path))
            .await
            .unwrap()
            .status()
            .as_u16()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A local address nothing listens on.
pub fn unused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn inject(State(shared): State<Shared>, request: Request, next: Next) -> Response {
    shared.requests.fetch_add(1, Ordering::SeqCst);
    let (delay, failure) = {
        let inner = shared.lock();
        (inner.delay, inner.failure.clone())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    match failure {
        Some((status, body)) => (
            StatusCode::from_u16(status).unwrap(),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => next.run(request).await,
    }
}

fn probe_status(inner: &mut Inner, path: &'static str) -> ProbeStatus {
    let probe = inner.probes.entry(path).or_default();
    ProbeStatus {
        probe_path: path.to_string(),
        fail_next: probe.fail_next,
        history: probe.history.clone(),
    }
}

fn probe_routes(router: Router<Shared>, path: &'static str) -> Router<Shared> {
    router
        .route(
            path,
            get(move |State(shared): State<Shared>| async move {
                let mut inner = shared.lock();
                let probe = inner.probes.entry(path).or_default();
                let code = if probe.fail_next == 0 { 200 } else { 500 };
                if probe.fail_next > 0 {
                    probe.fail_next -= 1;
                }
                let id = probe.history.len() as u64 + 1;
                probe.history.push(ProbeHistoryEntry {
                    id,
                    when: format!("10:00:{id:02}"),
                    relative_when: "just now".to_string(),
                    code,
                });
                StatusCode::from_u16(code).unwrap()
            }),
        )
        .route(
            &format!("{path}/api"),
            get(move |State(shared): State<Shared>| async move {
                Json(probe_status(&mut shared.lock(), path))
            })
            .put(
                move |State(shared): State<Shared>, Json(request): Json<ProbeConfigRequest>| async move {
                    let mut inner = shared.lock();
                    inner.probes.entry(path).or_default().fail_next = request.fail_next;
                    if inner.silent_put {
                        return StatusCode::OK.into_response();
                    }
                    Json(probe_status(&mut inner, path)).into_response()
                },
            ),
        )
}

async fn workload_get(State(shared): State<Shared>) -> Json<WorkloadStatus> {
    Json(shared.lock().workload.clone())
}

async fn workload_put(State(shared): State<Shared>, Json(config): Json<WorkloadConfig>) -> Json<WorkloadStatus> {
    let mut inner = shared.lock();
    inner.workload.config = config;
    Json(inner.workload.clone())
}

async fn queue_stats(State(shared): State<Shared>) -> Json<QueueStats> {
    let inner = shared.lock();
    Json(QueueStats {
        kind: "memq".to_string(),
        queues: inner
            .queues
            .iter()
            .map(|(name, queue)| QueueStat {
                name: name.clone(),
                depth: queue.messages.len() as u64,
                enqueued: queue.enqueued,
                dequeued: queue.dequeued,
                drained: queue.drained,
            })
            .collect(),
    })
}

async fn queue_create(State(shared): State<Shared>, Path(name): Path<String>) -> StatusCode {
    let mut inner = shared.lock();
    if inner.queues.iter().any(|(existing, _)| *existing == name) {
        return StatusCode::CONFLICT;
    }
    inner.queues.push((name, Queue::default()));
    StatusCode::CREATED
}

async fn queue_delete(State(shared): State<Shared>, Path(name): Path<String>) -> StatusCode {
    let mut inner = shared.lock();
    let before = inner.queues.len();
    inner.queues.retain(|(existing, _)| *existing != name);
    if inner.queues.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

fn with_queue<T>(shared: &Shared, name: &str, f: impl FnOnce(&mut Queue, &mut u64) -> T) -> Option<T> {
    let mut inner = shared.lock();
    let Inner {
        queues, next_message, ..
    } = &mut *inner;
    queues
        .iter_mut()
        .find(|(existing, _)| existing == name)
        .map(|(_, queue)| f(queue, next_message))
}

async fn queue_drain(State(shared): State<Shared>, Path(name): Path<String>) -> StatusCode {
    let drained = with_queue(&shared, &name, |queue, _| {
        queue.drained += queue.messages.len() as u64;
        queue.messages.clear();
    });
    match drained {
        Some(()) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

async fn queue_enqueue(State(shared): State<Shared>, Path(name): Path<String>, body: String) -> Response {
    let message = with_queue(&shared, &name, |queue, next_message| {
        *next_message += 1;
        let message = Message {
            kind: "message".to_string(),
            id: format!("m-{next_message}"),
            body,
            created: "2026-01-01T00:00:00Z".to_string(),
        };
        queue.messages.push_back(message.clone());
        queue.enqueued += 1;
        message
    });
    match message {
        Some(message) => Json(message).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn queue_dequeue(State(shared): State<Shared>, Path(name): Path<String>) -> Response {
    let message = with_queue(&shared, &name, |queue, _| {
        let message = queue.messages.pop_front();
        if message.is_some() {
            queue.dequeued += 1;
        }
        message
    });
    match message {
        Some(Some(message)) => Json(message).into_response(),
        Some(None) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn mem_get(State(shared): State<Shared>) -> Json<MemoryStatus> {
    Json(MemoryStatus {
        mem_stats: shared.lock().mem,
    })
}

#[derive(Deserialize)]
struct AllocParams {
    size: u64,
}

async fn mem_alloc(State(shared): State<Shared>, Query(params): Query<AllocParams>) -> StatusCode {
    shared.lock().mem.heap_alloc += params.size;
    StatusCode::OK
}

async fn mem_clear(State(shared): State<Shared>) -> StatusCode {
    shared.lock().mem.heap_alloc = 4096;
    StatusCode::OK
}

async fn env_get(State(shared): State<Shared>) -> Json<EnvStatus> {
    Json(shared.lock().env.clone())
}

async fn dns_query(Json(query): Json<DnsQuery>) -> Json<DnsResponse> {
    Json(DnsResponse {
        result: format!("{}\t{}\t127.0.0.1", query.name, query.record_type),
    })
}

fn router(shared: Shared) -> Router {
    let mut router = Router::new();
    router = probe_routes(router, "/healthy");
    router = probe_routes(router, "/ready");

    router
        .route("/keygen", get(workload_get).put(workload_put))
        .route("/memq/server/stats", get(queue_stats))
        .route("/memq/server/queues/{queue}", put(queue_create).delete(queue_delete))
        .route("/memq/server/queues/{queue}/drain", post(queue_drain))
        .route("/memq/server/queues/{queue}/enqueue", post(queue_enqueue))
        .route("/memq/server/queues/{queue}/dequeue", post(queue_dequeue))
        .route("/mem/api", get(mem_get))
        .route("/mem/api/alloc", post(mem_alloc))
        .route("/mem/api/clear", post(mem_clear))
        .route("/env/api", get(env_get))
        .route("/dns/api", post(dns_query))
        .layer(middleware::from_fn_with_state(shared.clone(), inject))
        .with_state(shared)
}
