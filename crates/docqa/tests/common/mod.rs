//! Shared fakes and fixtures for API tests

use std::io::{Cursor, Write};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use docqa::config::DocQaConfig;
use docqa::ingestion::{DocumentLoader, LibreOfficeConverter};
use docqa::providers::{EmbeddingProvider, InMemoryVectorStore, LlmProvider};
use docqa::server::state::AppState;
use docqa::Result;

/// Bag-of-letters embedder: deterministic and cheap
pub struct LetterEmbedder;

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; 26];
        for c in text.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
            v[(c as u8 - b'a') as usize] += 1.0;
        }
        v[0] += 0.01;
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        26
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "letters"
    }
}

/// Records prompts and answers with a fixed reply
pub struct RecordingLlm {
    pub reply: String,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl RecordingLlm {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmProvider for RecordingLlm {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        self.prompts.lock().push((model.to_string(), prompt.to_string()));
        Ok(self.reply.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "recording"
    }

    fn default_model(&self) -> &str {
        "llama3.2"
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryVectorStore>,
    pub llm: Arc<RecordingLlm>,
}

pub fn test_app(reply: &str) -> TestApp {
    let config = DocQaConfig::default();
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(LetterEmbedder);
    let store = Arc::new(InMemoryVectorStore::new(
        config.vector_db.collection.clone(),
        Arc::clone(&embedder),
    ));
    let llm = RecordingLlm::new(reply);
    let loader = DocumentLoader::new(None, LibreOfficeConverter::new("soffice"));

    let state = AppState::from_parts(config, embedder, store.clone(), llm.clone(), loader);
    TestApp { state, store, llm }
}

fn slide_xml(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:txBody><a:p><a:r><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Body"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:txBody><a:p><a:r><a:t>{body}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
    )
}

/// Two-slide deck: "Intro" and an untitled slide
pub fn two_slide_deck() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let parts = [
            (
                "ppt/presentation.xml",
                r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#.to_string(),
            ),
            ("ppt/slides/slide1.xml", slide_xml("Intro", "Qwanza accompagne la migration cloud.")),
            ("ppt/slides/slide2.xml", slide_xml("", "Support disponible en semaine.")),
        ];
        for (name, body) in parts {
            zip.start_file(name, zip::write::SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf.into_inner()
}

pub const BOUNDARY: &str = "docqa-test-boundary";

/// Multipart body with a single file field
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}
