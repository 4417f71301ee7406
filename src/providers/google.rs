use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::debug;

use super::retry::{Backoff, is_rate_limited, retry_after};
use super::{ServiceFuture, TranslationRequest, TranslationService};

pub(crate) const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com";
const SERVICE_NAME: &str = "Google Translate";

#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    token: String,
    project_id: String,
    endpoint: String,
    client: reqwest::Client,
}

impl GoogleTranslate {
    pub fn new(token: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            project_id: project_id.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        if !endpoint.trim().is_empty() {
            self.endpoint = endpoint.trim().trim_end_matches('/').to_string();
        }
        self
    }

    fn url(&self, parent: &str) -> String {
        format!("{}/v3/{}:translateText", self.endpoint, parent)
    }
}

impl TranslationService for GoogleTranslate {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn translate(&self, request: TranslationRequest) -> ServiceFuture<'_> {
        Box::pin(async move {
            let url = self.url(&request.parent);
            debug!(
                "POST {} ({} strings, {} -> {})",
                url,
                request.contents.len(),
                request.source_language_code,
                request.target_language_code
            );

            let mut backoff = Backoff::new();
            loop {
                backoff.start_attempt();
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .header("x-goog-user-project", &self.project_id)
                    .json(&request)
                    .send()
                    .await
                    .with_context(|| format!("failed to reach {}", url))?;

                let status = response.status();
                let retry_after = retry_after(response.headers());
                let text = response.text().await.unwrap_or_default();
                if status.is_success() {
                    return extract_translations(&text);
                }
                if is_rate_limited(status, &text) && !backoff.exhausted() {
                    backoff.wait(SERVICE_NAME, retry_after).await;
                    continue;
                }
                return Err(anyhow!(
                    "Translation API error ({}): {}",
                    status,
                    extract_api_error(&text).unwrap_or(text)
                ));
            }
        })
    }
}

fn extract_translations(text: &str) -> anyhow::Result<Vec<String>> {
    let payload: TranslateTextResponse = serde_json::from_str(text)
        .map_err(|err| anyhow!("failed to parse Translation API response JSON: {}", err))?;
    Ok(payload
        .translations
        .into_iter()
        .map(|translation| translation.translated_text)
        .collect())
}

fn extract_api_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ApiError>,
    }

    #[derive(Deserialize)]
    struct ApiError {
        message: Option<String>,
        status: Option<String>,
        code: Option<i32>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    let parts = [
        error.message,
        error.status.map(|status| format!("type: {}", status)),
        error.code.map(|code| format!("code: {}", code)),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.trim().is_empty())
    .collect::<Vec<_>>();
    if parts.is_empty() {
        Some("unknown error".to_string())
    } else {
        Some(parts.join(" | "))
    }
}

#[derive(Debug, Deserialize)]
struct TranslateTextResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_translations_keeps_response_order() {
        let payload = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/translate_text_response.json"
        ));
        let translations = extract_translations(payload).unwrap();
        assert_eq!(translations, vec!["你好", "再見", "共 ％s 個檔案"]);
    }

    #[test]
    fn extract_translations_rejects_garbage() {
        assert!(extract_translations("<html>").is_err());
        assert!(extract_translations("{}").unwrap().is_empty());
    }

    #[test]
    fn api_error_is_flattened() {
        let body = r#"{"error":{"code":403,"message":"Cloud Translation API has not been used","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(
            extract_api_error(body).as_deref(),
            Some("Cloud Translation API has not been used | type: PERMISSION_DENIED | code: 403")
        );
        assert_eq!(extract_api_error("not json"), None);
    }

    #[test]
    fn url_uses_parent_and_trimmed_endpoint() {
        let service = GoogleTranslate::new("token", "demo").with_endpoint("http://localhost:8080/");
        assert_eq!(
            service.url("projects/demo/locations/global"),
            "http://localhost:8080/v3/projects/demo/locations/global:translateText"
        );
    }
}
