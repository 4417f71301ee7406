use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::process::Command;

mod google;
mod retry;

pub use google::GoogleTranslate;

pub const PLAIN_TEXT_MIME: &str = "text/plain";

const TOKEN_ENV_VARS: &[&str] = &["GOOGLE_CLOUD_ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];

/// One batched request. `contents` and the returned list are matched by
/// index; the service embeds no keys in its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    #[serde(skip)]
    pub parent: String,
    pub contents: Vec<String>,
    pub mime_type: String,
    pub source_language_code: String,
    pub target_language_code: String,
}

impl TranslationRequest {
    pub fn parent_for(project_id: &str, location: &str) -> String {
        format!("projects/{}/locations/{}", project_id, location)
    }
}

pub type ServiceFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

pub trait TranslationService: Send + Sync {
    fn name(&self) -> &str;
    fn translate(&self, request: TranslationRequest) -> ServiceFuture<'_>;
}

pub fn resolve_access_token(override_token: Option<&str>) -> Result<String> {
    if let Some(token) = override_token.map(str::trim).filter(|token| !token.is_empty()) {
        return Ok(token.to_string());
    }
    for key in TOKEN_ENV_VARS {
        if let Some(token) = get_env(key) {
            return Ok(token);
        }
    }
    token_from_gcloud().with_context(|| {
        format!(
            "no access token found (checked --access-token, {}, gcloud)",
            TOKEN_ENV_VARS.join(", ")
        )
    })
}

fn token_from_gcloud() -> Result<String> {
    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .with_context(|| "failed to run gcloud (is it installed?)")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("gcloud auth print-access-token failed: {}", stderr.trim()));
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(anyhow!("gcloud returned an empty access token"));
    }
    Ok(token)
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_to_translate_text_body() {
        let request = TranslationRequest {
            parent: TranslationRequest::parent_for("demo", "global"),
            contents: vec!["Bye".to_string()],
            mime_type: PLAIN_TEXT_MIME.to_string(),
            source_language_code: "en".to_string(),
            target_language_code: "zh-TW".to_string(),
        };
        assert_eq!(request.parent, "projects/demo/locations/global");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": ["Bye"],
                "mimeType": "text/plain",
                "sourceLanguageCode": "en",
                "targetLanguageCode": "zh-TW"
            })
        );
    }

    #[test]
    fn explicit_token_wins() {
        assert_eq!(resolve_access_token(Some(" abc ")).unwrap(), "abc");
    }
}
