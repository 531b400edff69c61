//! UI routes: page, upload, question, API status

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::Html,
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::api_client::{ApiClient, UploadOutcome};
use crate::pages::{render_page, Banner, PageView, MODELS};

/// Largest batch of files accepted in one form post
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Shared UI state
#[derive(Clone)]
pub struct UiState {
    client: Arc<ApiClient>,
}

impl UiState {
    pub fn new(client: ApiClient) -> Self {
        Self { client: Arc::new(client) }
    }
}

#[derive(Debug, Deserialize)]
pub struct AskForm {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub model: String,
}

/// Build the UI router
pub fn ui_router(state: UiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/ask", post(ask))
        .route("/status", post(status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<String> {
    Html(render_page(&PageView::default()))
}

/// POST /upload - forward every selected file to `/index_pdf`
async fn upload(State(state): State<UiState>, mut multipart: Multipart) -> Html<String> {
    let mut view = PageView::default();
    let mut files = Vec::new();

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if filename.is_empty() {
                    continue;
                }
                match field.bytes().await {
                    Ok(data) => files.push((filename, data.to_vec())),
                    Err(e) => view
                        .banners
                        .push(Banner::error(format!("⚠️ Problème avec '{}' : {}", filename, e))),
                }
            }
            Ok(None) => break,
            Err(e) => {
                view.banners.push(Banner::error(format!("⚠️ Envoi interrompu : {}", e)));
                break;
            }
        }
    }

    if files.is_empty() {
        if view.banners.is_empty() {
            view.banners.push(Banner::warning("⚠️ Aucun fichier sélectionné."));
        }
        return Html(render_page(&view));
    }

    view.banners.push(Banner::success(format!(
        "✅ {} fichier(s) chargé(s) avec succès !",
        files.len()
    )));

    for (filename, data) in files {
        tracing::info!("Forwarding {} ({} bytes)", filename, data.len());
        let banner = match state.client.index_file(&filename, data).await {
            Ok(UploadOutcome::Indexed) => {
                Banner::success(format!("📚 Document '{}' indexé avec succès !", filename))
            }
            Ok(UploadOutcome::Rejected(message)) => {
                Banner::error(format!("❌ Erreur pour '{}' : {}", filename, message))
            }
            Err(crate::api_client::ApiError::Status(code)) => {
                Banner::error(format!("❌ Erreur pour '{}' : {}", filename, code.as_u16()))
            }
            Err(e) => Banner::error(format!("⚠️ Problème avec '{}' : {}", filename, e)),
        };
        view.banners.push(banner);
    }

    Html(render_page(&view))
}

/// POST /ask - blank questions never reach the API
async fn ask(State(state): State<UiState>, Form(form): Form<AskForm>) -> Html<String> {
    let model = if form.model.is_empty() {
        MODELS[0].to_string()
    } else {
        form.model
    };
    let mut view = PageView {
        selected_model: Some(model.clone()),
        question: Some(form.question.clone()),
        ..PageView::default()
    };

    if form.question.trim().is_empty() {
        view.banners
            .push(Banner::warning("⚠️ Veuillez entrer une question avant de soumettre."));
        return Html(render_page(&view));
    }

    match state.client.predict(&form.question, &model).await {
        Ok(answer) => {
            view.banners.push(Banner::success("✅ Réponse obtenue avec succès !"));
            view.exchange = Some((form.question, answer));
        }
        Err(crate::api_client::ApiError::Status(status)) => {
            view.banners.push(Banner::error(format!("🚨 Erreur API : {}", status.as_u16())));
        }
        Err(e) => {
            tracing::error!("Predict request failed: {}", e);
            view.banners.push(Banner::error(format!(
                "❌ Problème de connexion avec l'API : {}",
                e
            )));
        }
    }

    Html(render_page(&view))
}

/// POST /status - show `/health`
async fn status(State(state): State<UiState>) -> Html<String> {
    let banner = match state.client.health().await {
        Ok(status) => Banner::success(format!("🟢 API en ligne : {}", status)),
        Err(crate::api_client::ApiError::Status(code)) => {
            Banner::error(format!("🔴 Problème avec l'API : {}", code.as_u16()))
        }
        Err(e) => Banner::error(format!("❌ Impossible de contacter l'API : {}", e)),
    };

    Html(render_page(&PageView {
        banners: vec![banner],
        ..PageView::default()
    }))
}
