use crate::domain::reply::{ExtractionError, ImageSource, TextExtractor};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: String,
}

impl OcrResponse {
    fn into_text(self) -> Result<String, ExtractionError> {
        if self.is_errored_on_processing {
            let message = self
                .error_message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "OCR processing failed".to_string());
            return Err(ExtractionError::Upstream(message));
        }

        let text = self
            .parsed_results
            .into_iter()
            .map(|result| result.parsed_text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }
        Ok(text)
    }
}

/// Screenshot text extraction through an OCR.space-compatible HTTP API
pub struct OcrSpaceRepository {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OcrSpaceRepository {
    pub fn new(
        api_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

#[async_trait]
impl TextExtractor for OcrSpaceRepository {
    async fn extract_text(&self, image: &ImageSource) -> Result<String, ExtractionError> {
        let form = reqwest::multipart::Form::new().text("language", "eng");
        let form = match image {
            ImageSource::Url(url) => form.text("url", url.clone()),
            ImageSource::Base64(data) => form.text("base64Image", data.clone()),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractionError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "OCR request failed");
            return Err(ExtractionError::Upstream(format!(
                "OCR request failed ({}): {}",
                status, body
            )));
        }

        let parsed: OcrResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Upstream(e.to_string()))?;

        parsed.into_text()
    }
}
