pub(crate) mod support;

use std::time::Duration;

use serde_json::json;

use crate::catalog::{SortKey, ViewQuery};
use crate::client::{CatalogBackend, ClientConfig, ClientError, HttpBackend};
use crate::controller::{CatalogController, DeleteOutcome};
use crate::model::{BookDraft, BookId};
use crate::prompt::ScriptedPrompt;

fn shelf() -> Vec<serde_json::Value> {
    vec![
        json!({"id":1,"title":"Dune","author":"Herbert","genre":"SciFi","published_year":1965,
               "location":"Shelf A","kstatus":"read","krates":5,"jstatus":"unread","jrates":null,"notes":""}),
        json!({"id":2,"title":"Emma","author":"Austen","genre":"Romance","published_year":"1815"}),
    ]
}

fn http_backend(base_url: &str) -> HttpBackend {
    let config = ClientConfig::new(base_url)
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    HttpBackend::new(config).unwrap()
}

#[tokio::test]
async fn http_backend_lists_and_gets_books() {
    let (base, _svc) = support::spawn_fake_service(shelf(), Vec::new()).await;
    let backend = http_backend(&base);

    let books = backend.list_books().await.unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].krates.as_deref(), Some("5"));
    assert_eq!(books[1].published_year.numeric(), Some(1815));

    let emma = backend.get_book(&BookId::from(2)).await.unwrap();
    assert_eq!(emma.author, "Austen");
}

#[tokio::test]
async fn http_backend_reports_missing_record_status() {
    let (base, _svc) = support::spawn_fake_service(shelf(), Vec::new()).await;
    let backend = http_backend(&base);
    let err = backend.get_book(&BookId::from(404)).await.unwrap_err();
    assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
}

#[tokio::test]
async fn http_backend_reports_malformed_body() {
    let (base, _svc) = support::spawn_fake_service(shelf(), Vec::new()).await;
    let backend = http_backend(&format!("{base}/broken"));
    let err = backend.list_books().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }), "{err}");
}

#[tokio::test]
async fn http_backend_reports_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let backend = http_backend(&format!("http://{addr}"));
    let err = backend.list_books().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }), "{err}");
}

#[tokio::test]
async fn create_posts_form_fields_and_refetches() {
    let (base, svc) = support::spawn_fake_service(shelf(), Vec::new()).await;
    let prompt = ScriptedPrompt::answering(true);
    let mut controller = CatalogController::new(http_backend(&base), &prompt);

    let draft = BookDraft {
        title: "Beloved".to_string(),
        author: "Morrison".to_string(),
        genre: "Fiction".to_string(),
        published_year: "1987".to_string(),
        kstatus: "reading".to_string(),
        ..BookDraft::default()
    };
    let view = controller.create(&draft).await.unwrap();

    assert!(view.books.iter().any(|b| b.title == "Beloved"));
    let seen = svc.seen();
    let methods: Vec<_> = seen.iter().map(|s| s.method.as_str()).collect();
    assert_eq!(methods, vec!["POST", "GET"]);
    let body = seen[0].body.clone().unwrap();
    assert_eq!(body["published_year"], "1987");
    assert_eq!(body["kstatus"], "reading");
    assert_eq!(body["jrates"], "");
}

#[tokio::test]
async fn edit_commit_puts_full_record_to_armed_id() {
    let (base, svc) = support::spawn_fake_service(shelf(), Vec::new()).await;
    let prompt = ScriptedPrompt::answering(true);
    let mut controller = CatalogController::new(http_backend(&base), &prompt);

    let mut draft = controller.edit(&BookId::from(1)).await.unwrap();
    assert_eq!(draft.location, "Shelf A");
    assert_eq!(draft.krates, "5");
    draft.jstatus = "read".to_string();
    controller.commit(&draft).await.unwrap();

    let put = svc
        .seen()
        .into_iter()
        .find(|s| s.method == "PUT")
        .unwrap();
    assert_eq!(put.path, "/books/1");
    let body = put.body.unwrap();
    assert_eq!(body["title"], "Dune");
    assert_eq!(body["jstatus"], "read");
    assert_eq!(body["location"], "Shelf A");
    assert_eq!(svc.records()[0]["jstatus"], "read");
}

#[tokio::test]
async fn declined_delete_issues_no_request() {
    let (base, svc) = support::spawn_fake_service(shelf(), Vec::new()).await;
    let prompt = ScriptedPrompt::answering(false);
    let mut controller = CatalogController::new(http_backend(&base), &prompt);
    controller.refresh().await.unwrap();

    let outcome = controller.delete(&BookId::from(1)).await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(svc.seen().len(), 1);
    assert_eq!(svc.records().len(), 2);
}

#[tokio::test]
async fn confirmed_delete_removes_and_rerenders() {
    let (base, svc) = support::spawn_fake_service(shelf(), Vec::new()).await;
    let prompt = ScriptedPrompt::answering(true);
    let mut controller = CatalogController::new(http_backend(&base), &prompt)
        .with_query(ViewQuery::new("", "", Some(SortKey::Title)));

    let outcome = controller.delete(&BookId::from(2)).await.unwrap();

    let DeleteOutcome::Deleted(view) = outcome else {
        panic!("delete was confirmed");
    };
    assert_eq!(view.books.len(), 1);
    assert_eq!(view.books[0].title, "Dune");
    let paths: Vec<_> = svc.seen().into_iter().map(|s| (s.method, s.path)).collect();
    assert_eq!(
        paths,
        vec![
            ("DELETE".to_string(), "/books/2".to_string()),
            ("GET".to_string(), "/books".to_string()),
        ]
    );
}

#[tokio::test]
async fn snapshot_download_streams_to_file() {
    let payload = b"SQLite format 3\0library".to_vec();
    let (base, _svc) = support::spawn_fake_service(shelf(), payload.clone()).await;
    let prompt = ScriptedPrompt::answering(true);
    let controller = CatalogController::new(http_backend(&base), &prompt);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("library.db");

    let written = controller.download(&dest, false).await.unwrap();

    assert_eq!(written, payload.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
}

#[tokio::test]
async fn snapshot_download_reports_unwritable_destination() {
    let (base, _svc) = support::spawn_fake_service(shelf(), b"db".to_vec()).await;
    let backend = http_backend(&base);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing").join("library.db");

    let err = backend.download_to(&dest, false).await.unwrap_err();

    assert!(matches!(err, ClientError::Io { .. }), "{err}");
}

#[tokio::test]
async fn rendered_page_reflects_refreshed_controls() {
    let (base, _svc) = support::spawn_fake_service(shelf(), Vec::new()).await;
    let prompt = ScriptedPrompt::answering(true);
    let mut controller = CatalogController::new(http_backend(&base), &prompt)
        .with_query(ViewQuery::new("", "romance", None));
    let view = controller.refresh().await.unwrap();

    let html = String::from_utf8(crate::output::render_html_fragment(&view.books)).unwrap();
    assert!(html.contains("Emma"));
    assert!(!html.contains("Dune"));
    let page = String::from_utf8(crate::output::report::render_page(&view, "/download-db")).unwrap();
    assert!(page.contains(r#"<option value="SciFi">SciFi</option>"#));
    assert!(page.contains(r#"<option value="Romance" selected>Romance</option>"#));
    assert!(page.contains("1 of 2 books"));
}
