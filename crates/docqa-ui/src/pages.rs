//! HTML rendering for the single UI page

/// Models offered in the selector
pub const MODELS: &[&str] = &["llama3.2", "mistral", "deepseek-r1:7b"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
    Warning,
}

impl BannerKind {
    fn class(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// One status message shown above the forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: BannerKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: BannerKind::Error, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { kind: BannerKind::Warning, message: message.into() }
    }
}

/// Everything the page shows for one request
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub banners: Vec<Banner>,
    pub selected_model: Option<String>,
    pub question: Option<String>,
    /// Question and answer pair after a successful `/predict`
    pub exchange: Option<(String, String)>,
}

/// Escape text for HTML element and attribute content
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; }
h2, p.lead { text-align: center; }
.banner { padding: .6rem .9rem; border-radius: 6px; margin: .4rem 0; }
.success { background: #e6f4ea; }
.error { background: #fde7e9; }
.warning { background: #fff4e5; }
textarea { width: 100%; min-height: 5rem; }
section { margin: 1.5rem 0; }
.answer { white-space: pre-wrap; }
"#;

/// Render the whole page
pub fn render_page(view: &PageView) -> String {
    let selected = view.selected_model.as_deref().unwrap_or(MODELS[0]);

    let banners: String = view
        .banners
        .iter()
        .map(|b| {
            format!(
                r#"<div class="banner {}">{}</div>"#,
                b.kind.class(),
                escape_html(&b.message)
            )
        })
        .collect();

    let options: String = MODELS
        .iter()
        .map(|m| {
            let attr = if *m == selected { " selected" } else { "" };
            format!(r#"<option value="{0}"{1}>{0}</option>"#, escape_html(m), attr)
        })
        .collect();

    let exchange = view
        .exchange
        .as_ref()
        .map(|(question, answer)| {
            format!(
                r#"<section><p><strong>📌 Question :</strong> {}</p><p class="answer"><strong>📝 Réponse :</strong> {}</p></section>"#,
                escape_html(question),
                escape_html(answer)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<title>e-QWANZA</title>
<style>{style}</style>
</head>
<body>
<h2>e-QWANZA</h2>
<p class="lead">Gagnez du temps, accédez à la bonne info en un instant. Votre assistant IA est à votre service.</p>
{banners}
<section>
<h3>📎 Uploader un fichier PDF ou PowerPoint</h3>
<form method="post" action="/upload" enctype="multipart/form-data">
<label>Chargez un ou plusieurs fichiers PDF/PPT/PPTX :
<input type="file" name="files" accept=".pdf,.ppt,.pptx" multiple></label>
<button type="submit">Confirmer</button>
</form>
</section>
<section>
<h3>🧠 Choix du modèle de génération</h3>
<form method="post" action="/ask">
<label>Choisissez le modèle LLM :
<select name="model">{options}</select></label>
<p><label>🔍 Entrez votre question :
<textarea name="question" placeholder="Exemple: Qu'est-ce que Qwanza ?">{question}</textarea></label></p>
<button type="submit">Obtenir une réponse</button>
</form>
</section>
{exchange}
<section>
<form method="post" action="/status">
<button type="submit">📡 Vérifier l'état de l'API</button>
</form>
</section>
</body>
</html>
"#,
        style = STYLE,
        banners = banners,
        options = options,
        question = escape_html(view.question.as_deref().unwrap_or_default()),
        exchange = exchange,
    )
}
