/// Optional text generation for READMEs, commit messages and code
/// explanations.
///
/// The helpers here never fail: when the generator errors they log a warning
/// and return fixed fallback text. Generated text only ever supplies a
/// commit message or a document body.
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";

const README_FILE_LIMIT: usize = 20;
const COMMIT_PREVIEW_CHARS: usize = 200;
const EXPLAIN_CODE_CHARS: usize = 5000;
const GENERATED_MESSAGE_MAX_BYTES: u64 = 10_000;

pub const README_FALLBACK: &str = "# README\n\nGenerated automatically. (AI Service Unavailable)";
pub const EXPLAIN_FALLBACK: &str = "Failed to generate AI explanation. Check API Key.";

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// `TextGenerator` backed by the Gemini `generateContent` endpoint.
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_GEMINI_BASE.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// The `error.message` of a failed generate call, if the body carries one.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.trim().is_empty())
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("generate: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body)
                .unwrap_or_else(|| format!("text generation error: {}", status.as_u16()));
            tracing::debug!(status = status.as_u16(), %message, "generate failed");
            return Err(Error::from_status(status.as_u16(), message));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| Error::Malformed(format!("generate response: {e}")))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::Malformed("generate response had no text".to_string()));
        }
        Ok(text)
    }
}

/// Draft a README body for a new repository.
pub async fn draft_readme(
    generator: &dyn TextGenerator,
    repo_name: &str,
    description: &str,
    files: &[String],
) -> String {
    let listed: Vec<&str> = files
        .iter()
        .take(README_FILE_LIMIT)
        .map(String::as_str)
        .collect();
    let prompt = format!(
        "Create a professional README.md for a GitHub repository.\n\
         Repo Name: {repo_name}\n\
         Description: {description}\n\n\
         Known Files:\n{}\n\n\
         Includes:\n\
         - Project Title\n\
         - Description\n\
         - Installation/Usage (make generic assumptions based on file types)\n\
         - Contributing\n\
         - License\n\n\
         Output ONLY the markdown content.",
        listed.join("\n")
    );

    match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, repo = repo_name, "README generation failed");
            README_FALLBACK.to_string()
        }
    }
}

/// One-line conventional commit message for adding or updating a file.
pub async fn suggest_commit_message(
    generator: &dyn TextGenerator,
    file_name: &str,
    preview: &str,
) -> String {
    let prompt = format!(
        "Generate a concise, conventional commit message for adding/updating this file.\n\
         File: {file_name}\n\
         Content Preview: \"{}...\"\n\n\
         Format: <type>(<scope>): <subject>\n\
         Example: feat(core): add initial logic for login\n\n\
         Return ONLY the commit message string.",
        truncate_chars(preview, COMMIT_PREVIEW_CHARS)
    );

    match generator.generate(&prompt).await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, file = file_name, "commit message generation failed");
            format!("Update {file_name}")
        }
    }
}

pub async fn explain_code(generator: &dyn TextGenerator, file_name: &str, code: &str) -> String {
    let prompt = format!(
        "You are an expert senior software engineer. Explain the following code file.\n\n\
         Filename: {file_name}\n\n\
         Code Snippet:\n{}\n\n\
         Provide a response in the following structure:\n\
         1. **Summary**: A 1-2 sentence overview.\n\
         2. **Key Features**: Bullet points of what the code does.\n\
         3. **Potential Improvements**: If any bugs or bad practices are spotted.",
        truncate_chars(code, EXPLAIN_CODE_CHARS)
    );

    match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, file = file_name, "code explanation failed");
            EXPLAIN_FALLBACK.to_string()
        }
    }
}

/// Small script sources get a generated commit message on upload.
pub fn wants_generated_message(file_name: &str, size: u64) -> bool {
    let script = [".ts", ".js", ".py"]
        .iter()
        .any(|ext| file_name.ends_with(ext));
    script && size < GENERATED_MESSAGE_MAX_BYTES
}

/// At most `max` characters of `s`, cut on a char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
