//! Native effect executor around `crux_core::Core`: HTTP over `reqwest`,
//! key/value storage in memory or in a JSON file, timers on `tokio::time`.

use std::collections::{BTreeMap, VecDeque};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crux_http::protocol::{HttpRequest as CruxHttpRequest, HttpResponse as CruxHttpResponse};
use crux_kv::error::KeyValueError;
use crux_kv::{KeyValueOperation, KeyValueResponse, KeyValueResult};

use crate::capabilities::{
    HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpResult, KvError, KvOperation,
    KvOutput, KvResult, TimerOperation, TimerOutput, ValidatedUrl, MAX_RESPONSE_BODY_SIZE,
};
use crate::{App, AppConfig, AppError, Capabilities, Effect, Event, ViewModel, CREATE_LISTING_TIMEOUT_MS};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`. Safe to call more than once.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("revup_shared=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}

// --- HTTP ---

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: &HttpRequest) -> HttpResult;
}

pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| HttpError::InvalidRequest {
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

fn map_reqwest_error(e: &reqwest::Error, request: &HttpRequest) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout {
            timeout_ms: request.timeout_ms(),
            request_id: request.request_id().to_string(),
        }
    } else if e.is_decode() || e.is_body() {
        HttpError::InvalidResponse {
            reason: e.to_string(),
            request_id: request.request_id().to_string(),
        }
    } else {
        HttpError::Connection {
            host: request.url().host().to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: &HttpRequest) -> HttpResult {
        let started = Instant::now();
        let method = match request.method() {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, request.url().as_str())
            .timeout(Duration::from_millis(request.timeout_ms()));
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(&e, request))?;

        let status = response.status().as_u16();
        let mut headers = HttpHeaders::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                // Past the header cap the rest are dropped.
                let _ = headers.insert(name.as_str(), value);
            }
        }

        let too_large = |size: usize| HttpError::ResponseTooLarge {
            size,
            max: MAX_RESPONSE_BODY_SIZE,
        };
        if let Some(length) = response.content_length() {
            let length = usize::try_from(length).unwrap_or(usize::MAX);
            if length > MAX_RESPONSE_BODY_SIZE {
                return Err(too_large(length));
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(&e, request))?;
        if body.len() > MAX_RESPONSE_BODY_SIZE {
            return Err(too_large(body.len()));
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(
            request_id = request.request_id(),
            method = request.method().as_str(),
            status,
            duration_ms,
            "http request finished"
        );
        Ok(HttpResponse::new(
            status,
            headers,
            body.to_vec(),
            request.request_id().to_string(),
            duration_ms,
        ))
    }
}

// --- Key/value storage ---

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn execute(&self, operation: &KvOperation) -> KvResult;
}

fn apply(entries: &mut BTreeMap<String, String>, operation: &KvOperation) -> KvResult {
    match operation {
        KvOperation::Get { key } => Ok(KvOutput::Value(
            entries.get(key.as_str()).map(|v| v.as_bytes().to_vec()),
        )),
        KvOperation::Set { key, value } => {
            let value = String::from_utf8(value.clone()).map_err(|e| KvError::Serialization {
                message: e.to_string(),
            })?;
            entries.insert(key.as_str().to_string(), value);
            Ok(KvOutput::Written)
        }
        KvOperation::Delete { key } => Ok(KvOutput::Deleted {
            existed: entries.remove(key.as_str()).is_some(),
        }),
    }
}

/// Values are UTF-8 text, like browser local storage.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn execute(&self, operation: &KvOperation) -> KvResult {
        let mut entries = self.entries.lock().await;
        apply(&mut entries, operation)
    }
}

/// All entries in one JSON object on disk, rewritten atomically after each mutation.
pub struct FileKvStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKvStore {
    /// Opens or creates the store. A missing file is an empty store; an unreadable one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, KvError> {
        let path = path.into();
        let entries = if path.exists() {
            let bytes = std::fs::read(&path).map_err(|e| KvError::Storage {
                message: e.to_string(),
            })?;
            if bytes.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&bytes).map_err(|e| KvError::Serialization {
                    message: e.to_string(),
                })?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn save_to_path(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");

    let mut file = File::create(&tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn execute(&self, operation: &KvOperation) -> KvResult {
        let mut entries = self.entries.lock().await;
        if matches!(operation, KvOperation::Get { .. }) {
            return apply(&mut entries, operation);
        }

        let mut next = entries.clone();
        let output = apply(&mut next, operation)?;
        let bytes = serde_json::to_vec(&next).map_err(|e| KvError::Serialization {
            message: e.to_string(),
        })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_to_path(&path, &bytes))
            .await
            .map_err(|e| KvError::Storage {
                message: e.to_string(),
            })?
            .map_err(|e| KvError::Storage {
                message: e.to_string(),
            })?;

        *entries = next;
        Ok(output)
    }
}

// --- Driver ---

/// Rebuilds a validated request from the `crux_http` wire form. Listing
/// uploads get the long timeout; everything else keeps the default.
pub fn request_from_crux(request: &CruxHttpRequest) -> Result<HttpRequest, HttpError> {
    let method = match request.method.to_ascii_uppercase().as_str() {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => {
            return Err(HttpError::InvalidRequest {
                reason: format!("unsupported method {other}"),
            })
        }
    };

    let mut out = HttpRequest::new(method, ValidatedUrl::new(request.url.as_str())?);
    let mut multipart = false;
    for header in &request.headers {
        if header.name.eq_ignore_ascii_case("content-type") {
            multipart = header.value.starts_with("multipart/");
        }
        out = out.with_header(header.name.as_str(), header.value.as_str())?;
    }
    if method.has_request_body() {
        out = out.with_body(request.body.clone())?;
    }
    if multipart {
        out = out.with_timeout_ms(CREATE_LISTING_TIMEOUT_MS)?;
    }
    Ok(out)
}

/// Transport failures have no status on the wire; they are reported as a
/// gateway error so the core shows its generic message.
pub fn response_to_crux(result: &HttpResult) -> CruxHttpResponse {
    match result {
        Ok(response) => CruxHttpResponse::status(response.status())
            .body(response.body().to_vec())
            .build(),
        Err(HttpError::Timeout { .. }) => CruxHttpResponse::status(504).build(),
        Err(_) => CruxHttpResponse::status(502).build(),
    }
}

fn kv_from_crux(operation: &KeyValueOperation) -> Result<KvOperation, KvError> {
    match operation {
        KeyValueOperation::Get { key } => KvOperation::get(key.as_str()),
        KeyValueOperation::Set { key, value } => KvOperation::set(key.as_str(), value.clone()),
        KeyValueOperation::Delete { key } => KvOperation::delete(key.as_str()),
        other => Err(KvError::UnexpectedOutput {
            operation: format!("{other:?}"),
        }),
    }
}

fn kv_to_crux(previous: Option<Vec<u8>>, operation: &KvOperation, result: KvResult) -> KeyValueResult {
    match result {
        Ok(output) => {
            let response = match (operation, output) {
                (KvOperation::Get { .. }, KvOutput::Value(value)) => KeyValueResponse::Get {
                    value: value.into(),
                },
                (KvOperation::Set { .. }, _) => KeyValueResponse::Set {
                    previous: previous.into(),
                },
                _ => KeyValueResponse::Delete {
                    previous: previous.into(),
                },
            };
            KeyValueResult::Ok { response }
        }
        Err(e) => KeyValueResult::Err {
            error: KeyValueError::Io {
                message: e.to_string(),
            },
        },
    }
}

type CruxCore = crux_core::Core<Effect, App>;

/// Runs the core against real effect handlers until each dispatched event settles.
pub struct Shell<H, K> {
    core: CruxCore,
    http: H,
    kv: K,
    timer_tx: mpsc::UnboundedSender<TimerRequest>,
    timer_rx: mpsc::UnboundedReceiver<TimerRequest>,
    renders: usize,
}

type TimerRequest = crux_core::Request<TimerOperation>;

impl Shell<ReqwestClient, FileKvStore> {
    /// Production wiring from configuration.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppError> {
        config.validate()?;
        let kv = FileKvStore::open(&config.storage_path)?;
        let http = ReqwestClient::new()?;
        let mut shell = Self::new(http, kv);
        shell.dispatch(Event::Configure(config)).await;
        Ok(shell)
    }
}

impl<H: HttpClient, K: KvStore> Shell<H, K> {
    pub fn new(http: H, kv: K) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            core: CruxCore::new(),
            http,
            kv,
            timer_tx,
            timer_rx,
            renders: 0,
        }
    }

    /// Processes `event` and every follow-up event its effects resolve to.
    /// Timers run in the background; see [`Shell::next_timer`].
    pub async fn dispatch(&mut self, event: Event) {
        let effects = self.core.process_event(event);
        self.run(effects).await;
    }

    async fn run(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Render(_) => self.renders += 1,
                Effect::Http(mut request) => {
                    let result = match request_from_crux(&request.operation) {
                        Ok(http_request) => self.http.execute(&http_request).await,
                        Err(e) => Err(e),
                    };
                    if let Err(e) = &result {
                        warn!(url = %request.operation.url, error = %e, "http request failed");
                    }
                    queue.extend(self.core.resolve(&mut request, crux_http::protocol::HttpResult::Ok(response_to_crux(&result))));
                }
                Effect::KeyValue(mut request) => {
                    let output = match kv_from_crux(&request.operation) {
                        Ok(operation) => {
                            let previous = self.previous_value(&operation).await;
                            let result = self.kv.execute(&operation).await;
                            kv_to_crux(previous, &operation, result)
                        }
                        Err(e) => KeyValueResult::Err {
                            error: KeyValueError::Io {
                                message: e.to_string(),
                            },
                        },
                    };
                    queue.extend(self.core.resolve(&mut request, output));
                }
                Effect::Timer(request) => {
                    let tx = self.timer_tx.clone();
                    let millis = request.operation.millis();
                    debug!(id = request.operation.id(), millis, "timer started");
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_millis(millis)).await;
                        let _ = tx.send(request);
                    });
                }
            }
        }
    }

    async fn previous_value(&self, operation: &KvOperation) -> Option<Vec<u8>> {
        if matches!(operation, KvOperation::Get { .. }) {
            return None;
        }
        let key = operation.key().as_str();
        match KvOperation::get(key) {
            Ok(get) => match self.kv.execute(&get).await {
                Ok(KvOutput::Value(value)) => value,
                _ => None,
            },
            Err(_) => None,
        }
    }

    /// Waits for the next timer to fire and runs its follow-up effects.
    pub async fn next_timer(&mut self) -> bool {
        match self.timer_rx.recv().await {
            Some(mut request) => {
                let id = request.operation.id();
                let effects = self.core.resolve(&mut request, TimerOutput::Elapsed { id });
                self.run(effects).await;
                true
            }
            None => false,
        }
    }

    pub fn view(&self) -> ViewModel {
        self.core.view()
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod memory_store_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_get_delete() {
            let store = MemoryKvStore::new();
            let set = KvOperation::set("k", b"{\"a\":1}".to_vec()).unwrap();
            assert_eq!(store.execute(&set).await, Ok(KvOutput::Written));

            let get = KvOperation::get("k").unwrap();
            assert_eq!(
                store.execute(&get).await,
                Ok(KvOutput::Value(Some(b"{\"a\":1}".to_vec())))
            );

            let delete = KvOperation::delete("k").unwrap();
            assert_eq!(store.execute(&delete).await, Ok(KvOutput::Deleted { existed: true }));
            assert_eq!(store.execute(&delete).await, Ok(KvOutput::Deleted { existed: false }));
            assert_eq!(store.execute(&get).await, Ok(KvOutput::Value(None)));
        }

        #[tokio::test]
        async fn test_binary_values_rejected() {
            let store = MemoryKvStore::new();
            let set = KvOperation::set("k", vec![0xff, 0xfe]).unwrap();
            assert!(matches!(
                store.execute(&set).await,
                Err(KvError::Serialization { .. })
            ));
        }
    }

    mod file_store_tests {
        use super::*;

        #[tokio::test]
        async fn test_survives_reopen() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("store.json");

            let store = FileKvStore::open(&path).unwrap();
            let set = KvOperation::set("carFormData", b"{\"brand\":\"BMW\"}".to_vec()).unwrap();
            store.execute(&set).await.unwrap();
            assert!(!path.with_extension("tmp").exists());
            drop(store);

            let reopened = FileKvStore::open(&path).unwrap();
            let get = KvOperation::get("carFormData").unwrap();
            assert_eq!(
                reopened.execute(&get).await,
                Ok(KvOutput::Value(Some(b"{\"brand\":\"BMW\"}".to_vec())))
            );
        }

        #[tokio::test]
        async fn test_delete_persists() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("store.json");
            let store = FileKvStore::open(&path).unwrap();
            store
                .execute(&KvOperation::set("k", b"1".to_vec()).unwrap())
                .await
                .unwrap();
            store
                .execute(&KvOperation::delete("k").unwrap())
                .await
                .unwrap();

            let reopened = FileKvStore::open(&path).unwrap();
            assert_eq!(
                reopened.execute(&KvOperation::get("k").unwrap()).await,
                Ok(KvOutput::Value(None))
            );
        }

        #[test]
        fn test_corrupt_file_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("store.json");
            std::fs::write(&path, b"not json").unwrap();
            assert!(matches!(
                FileKvStore::open(&path),
                Err(KvError::Serialization { .. })
            ));
        }

        #[test]
        fn test_missing_or_empty_file_is_empty_store() {
            let dir = tempfile::tempdir().unwrap();
            assert!(FileKvStore::open(dir.path().join("absent.json")).is_ok());
            let empty = dir.path().join("empty.json");
            std::fs::write(&empty, b"").unwrap();
            assert!(FileKvStore::open(&empty).is_ok());
        }
    }

    mod bridge_tests {
        use super::*;
        use crux_http::protocol::HttpHeader;

        fn crux_request(method: &str, content_type: &str, body: &[u8]) -> CruxHttpRequest {
            CruxHttpRequest {
                method: method.into(),
                url: "https://api.test/api/cars".into(),
                headers: vec![HttpHeader {
                    name: "Content-Type".into(),
                    value: content_type.into(),
                }],
                body: body.to_vec(),
            }
        }

        #[test]
        fn test_multipart_upload_gets_long_timeout() {
            let request =
                request_from_crux(&crux_request("POST", "multipart/form-data; boundary=x", b"--x--")).unwrap();
            assert_eq!(request.method(), HttpMethod::Post);
            assert_eq!(request.timeout_ms(), CREATE_LISTING_TIMEOUT_MS);
            assert_eq!(request.body(), Some(&b"--x--"[..]));

            let get = request_from_crux(&crux_request("get", "application/json", b"")).unwrap();
            assert_eq!(get.method(), HttpMethod::Get);
            assert_eq!(get.timeout_ms(), crate::capabilities::DEFAULT_TIMEOUT_MS);
            assert!(get.body().is_none());
        }

        #[test]
        fn test_unsupported_method_rejected() {
            let result = request_from_crux(&crux_request("PATCH", "application/json", b""));
            assert!(matches!(result, Err(HttpError::InvalidRequest { .. })));
        }

        #[test]
        fn test_transport_errors_map_to_gateway_statuses() {
            let ok = response_to_crux(&Ok(HttpResponse::with_status(201, "{}")));
            assert_eq!(ok.status, 201);
            assert_eq!(ok.body, b"{}".to_vec());

            let timeout = response_to_crux(&Err(HttpError::Timeout {
                timeout_ms: 10,
                request_id: String::new(),
            }));
            assert_eq!(timeout.status, 504);

            let refused = response_to_crux(&Err(HttpError::Connection {
                host: "api.test".into(),
                message: "refused".into(),
            }));
            assert_eq!(refused.status, 502);
        }
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
