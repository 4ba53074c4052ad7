use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode as HttpStatus;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::client::{CatalogBackend, ClientError};
use crate::model::{Book, BookDraft, BookId};

fn next_id(records: &[Value]) -> u64 {
    records
        .iter()
        .filter_map(|r| r.get("id").and_then(Value::as_u64))
        .max()
        .unwrap_or(0)
        + 1
}

fn id_matches(record: &Value, id: &str) -> bool {
    match record.get("id") {
        Some(Value::Number(n)) => n.to_string() == id,
        Some(Value::String(s)) => s == id,
        _ => false,
    }
}

fn merged(id: &Value, draft: Value) -> Value {
    let mut record = draft;
    if let Some(obj) = record.as_object_mut() {
        obj.insert("id".to_string(), id.clone());
    }
    record
}

#[derive(Default)]
struct MemoryState {
    records: Vec<Value>,
    snapshot: Vec<u8>,
    requests: usize,
    list_calls: usize,
    fail_next: bool,
}

#[derive(Default)]
pub(crate) struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub(crate) fn with_books(records: Vec<Value>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records,
                ..MemoryState::default()
            }),
        }
    }

    pub(crate) fn fail_next_request(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub(crate) fn set_snapshot(&self, bytes: Vec<u8>) {
        self.state.lock().unwrap().snapshot = bytes;
    }

    pub(crate) fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub(crate) fn book(&self, id: &BookId) -> Option<Book> {
        let state = self.state.lock().unwrap();
        let found = state
            .records
            .iter()
            .find(|r| id_matches(r, id.as_str()))
            .map(|r| serde_json::from_value(r.clone()).unwrap());
        found
    }

    fn begin(&self, method: Method, path: &str) -> Result<std::sync::MutexGuard<'_, MemoryState>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.requests += 1;
        if state.fail_next {
            state.fail_next = false;
            return Err(ClientError::Status {
                method,
                url: format!("memory://{path}"),
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(state)
    }

    fn not_found(method: Method, id: &BookId) -> ClientError {
        ClientError::Status {
            method,
            url: format!("memory:///books/{id}"),
            status: StatusCode::NOT_FOUND,
        }
    }
}

#[async_trait]
impl CatalogBackend for MemoryBackend {
    async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        let mut state = self.begin(Method::GET, "/books")?;
        state.list_calls += 1;
        let books = state
            .records
            .iter()
            .map(|r| serde_json::from_value(r.clone()).unwrap())
            .collect();
        Ok(books)
    }

    async fn get_book(&self, id: &BookId) -> Result<Book, ClientError> {
        let state = self.begin(Method::GET, "/books/{id}")?;
        let found = state
            .records
            .iter()
            .find(|r| id_matches(r, id.as_str()))
            .map(|r| serde_json::from_value(r.clone()).unwrap());
        found.ok_or_else(|| Self::not_found(Method::GET, id))
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<(), ClientError> {
        let mut state = self.begin(Method::POST, "/books")?;
        let id = Value::from(next_id(&state.records));
        let record = merged(&id, serde_json::to_value(draft).unwrap());
        state.records.push(record);
        Ok(())
    }

    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<(), ClientError> {
        let mut state = self.begin(Method::PUT, "/books/{id}")?;
        let slot = state
            .records
            .iter_mut()
            .find(|r| id_matches(r, id.as_str()))
            .ok_or_else(|| Self::not_found(Method::PUT, id))?;
        let existing_id = slot["id"].clone();
        *slot = merged(&existing_id, serde_json::to_value(draft).unwrap());
        Ok(())
    }

    async fn delete_book(&self, id: &BookId) -> Result<(), ClientError> {
        let mut state = self.begin(Method::DELETE, "/books/{id}")?;
        let before = state.records.len();
        state.records.retain(|r| !id_matches(r, id.as_str()));
        if state.records.len() == before {
            return Err(Self::not_found(Method::DELETE, id));
        }
        Ok(())
    }

    async fn download_to(&self, dest: &std::path::Path, _progress: bool) -> Result<u64, ClientError> {
        let bytes = self.begin(Method::GET, "/download-db")?.snapshot.clone();
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| ClientError::Io {
                path: dest.display().to_string(),
                source: e,
            })?;
        Ok(bytes.len() as u64)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Seen {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) body: Option<Value>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeService {
    records: Arc<Mutex<Vec<Value>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
    snapshot: Arc<Vec<u8>>,
}

impl FakeService {
    pub(crate) fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn records(&self) -> Vec<Value> {
        self.records.lock().unwrap().clone()
    }

    fn record(&self, method: &str, path: String, body: Option<Value>) {
        self.seen.lock().unwrap().push(Seen {
            method: method.to_string(),
            path,
            body,
        });
    }
}

async fn list_books(State(svc): State<FakeService>) -> Json<Vec<Value>> {
    svc.record("GET", "/books".to_string(), None);
    Json(svc.records())
}

async fn create_book(State(svc): State<FakeService>, Json(body): Json<Value>) -> HttpStatus {
    svc.record("POST", "/books".to_string(), Some(body.clone()));
    let mut records = svc.records.lock().unwrap();
    let id = Value::from(next_id(&records));
    records.push(merged(&id, body));
    HttpStatus::CREATED
}

async fn get_book(
    State(svc): State<FakeService>,
    Path(id): Path<String>,
) -> Result<Json<Value>, HttpStatus> {
    svc.record("GET", format!("/books/{id}"), None);
    let found = svc
        .records
        .lock()
        .unwrap()
        .iter()
        .find(|r| id_matches(r, &id))
        .cloned();
    found.map(Json).ok_or(HttpStatus::NOT_FOUND)
}

async fn update_book(
    State(svc): State<FakeService>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> HttpStatus {
    svc.record("PUT", format!("/books/{id}"), Some(body.clone()));
    let mut records = svc.records.lock().unwrap();
    match records.iter_mut().find(|r| id_matches(r, &id)) {
        Some(slot) => {
            let existing_id = slot["id"].clone();
            *slot = merged(&existing_id, body);
            HttpStatus::OK
        }
        None => HttpStatus::NOT_FOUND,
    }
}

async fn delete_book(State(svc): State<FakeService>, Path(id): Path<String>) -> HttpStatus {
    svc.record("DELETE", format!("/books/{id}"), None);
    let mut records = svc.records.lock().unwrap();
    let before = records.len();
    records.retain(|r| !id_matches(r, &id));
    if records.len() == before {
        HttpStatus::NOT_FOUND
    } else {
        HttpStatus::OK
    }
}

async fn download_db(State(svc): State<FakeService>) -> Vec<u8> {
    svc.record("GET", "/download-db".to_string(), None);
    svc.snapshot.as_ref().clone()
}

async fn broken_list() -> &'static str {
    "<html>not json</html>"
}

pub(crate) async fn spawn_fake_service(records: Vec<Value>, snapshot: Vec<u8>) -> (String, FakeService) {
    let svc = FakeService {
        records: Arc::new(Mutex::new(records)),
        seen: Arc::new(Mutex::new(Vec::new())),
        snapshot: Arc::new(snapshot),
    };
    let app = Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/download-db", get(download_db))
        .route("/broken/books", get(broken_list))
        .with_state(svc.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), svc)
}
