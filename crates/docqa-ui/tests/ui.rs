use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Multipart, State},
    http::{header, Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tower::ServiceExt;

use docqa_ui::{ui_router, ApiClient, UiState, UploadOutcome};

#[derive(Default)]
struct MockApi {
    predictions: Vec<Value>,
    uploads: Vec<String>,
}

type Shared = Arc<Mutex<MockApi>>;

/// Minimal stand-in for the docqa API
async fn spawn_api(state: Shared) -> String {
    let app = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "API is running" })) }))
        .route(
            "/predict",
            post(|State(s): State<Shared>, Json(body): Json<Value>| async move {
                s.lock().predictions.push(body.clone());
                Json(json!({ "result": format!("<{}>", body["model"].as_str().unwrap_or("")) }))
            }),
        )
        .route(
            "/index_pdf",
            post(|State(s): State<Shared>, mut multipart: Multipart| async move {
                let mut filename = String::new();
                while let Some(field) = multipart.next_field().await.unwrap() {
                    if field.name() == Some("pdf_file") {
                        filename = field.file_name().unwrap_or_default().to_string();
                    }
                }
                s.lock().uploads.push(filename.clone());
                if filename.ends_with(".pdf") {
                    (StatusCode::OK, Json(json!({ "status": "indexed" })))
                } else if filename.ends_with(".pptx") {
                    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))
                } else {
                    (
                        StatusCode::OK,
                        Json(json!({ "status": "error", "message": "Unsupported file type: txt" })),
                    )
                }
            }),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(url: &str) -> ApiClient {
    ApiClient::new(url, Duration::from_secs(5)).unwrap()
}

async fn page(router: Router, request: Request<Body>) -> String {
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "ui-boundary";

fn files_body(files: &[(&str, &[u8])]) -> Body {
    let mut body = Vec::new();
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Body::from(body)
}

#[tokio::test]
async fn index_page_renders_forms() {
    let html = page(
        ui_router(UiState::new(client("http://127.0.0.1:9"))),
        Request::get("/").body(Body::empty()).unwrap(),
    )
    .await;

    assert!(html.contains(r#"action="/upload""#));
    assert!(html.contains("deepseek-r1:7b"));
}

#[tokio::test]
async fn blank_question_warns_without_calling_api() {
    let api = Shared::default();
    let url = spawn_api(api.clone()).await;

    let html = page(ui_router(UiState::new(client(&url))), form("/ask", "question=++&model=mistral")).await;

    assert!(html.contains("Veuillez entrer une question"));
    assert!(api.lock().predictions.is_empty());
}

#[tokio::test]
async fn question_and_answer_are_rendered_escaped() {
    let api = Shared::default();
    let url = spawn_api(api.clone()).await;

    let html = page(
        ui_router(UiState::new(client(&url))),
        form("/ask", "question=a%3Cb+%3F&model=mistral"),
    )
    .await;

    assert!(html.contains("Réponse obtenue avec succès"));
    assert!(html.contains("a&lt;b ?"));
    assert!(html.contains("&lt;mistral&gt;"));
    assert_eq!(api.lock().predictions[0], json!({ "text": "a<b ?", "model": "mistral" }));
}

#[tokio::test]
async fn each_upload_gets_its_own_banner() {
    let api = Shared::default();
    let url = spawn_api(api.clone()).await;

    let request = Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(files_body(&[("a.pdf", b"%PDF-1.4"), ("notes.txt", b"x")]))
        .unwrap();
    let html = page(ui_router(UiState::new(client(&url))), request).await;

    assert!(html.contains("2 fichier(s) chargé(s)"));
    assert!(html.contains("Document &#39;a.pdf&#39; indexé avec succès"));
    assert!(html.contains("Erreur pour &#39;notes.txt&#39; : Unsupported file type: txt"));
    assert_eq!(api.lock().uploads, vec!["a.pdf", "notes.txt"]);
}

#[tokio::test]
async fn failed_upload_status_is_reported_per_file() {
    let api = Shared::default();
    let url = spawn_api(api.clone()).await;

    let request = Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(files_body(&[("deck.pptx", b"PK")]))
        .unwrap();
    let html = page(ui_router(UiState::new(client(&url))), request).await;

    assert!(html.contains("❌ Erreur pour &#39;deck.pptx&#39; : 500"));
    assert!(!html.contains("Problème avec"));
}

#[tokio::test]
async fn status_reports_api_health() {
    let url = spawn_api(Shared::default()).await;
    let html = page(ui_router(UiState::new(client(&url))), form("/status", "")).await;
    assert!(html.contains("🟢 API en ligne : API is running"));

    let html = page(ui_router(UiState::new(client("http://127.0.0.1:9"))), form("/status", "")).await;
    assert!(html.contains("Impossible de contacter l&#39;API"));
}

#[tokio::test]
async fn upload_outcome_requires_indexed_status() {
    let url = spawn_api(Shared::default()).await;
    let api = client(&url);

    assert_eq!(api.index_file("a.pdf", b"%PDF".to_vec()).await.unwrap(), UploadOutcome::Indexed);
    assert_eq!(
        api.index_file("b.txt", b"x".to_vec()).await.unwrap(),
        UploadOutcome::Rejected("Unsupported file type: txt".into())
    );
}
