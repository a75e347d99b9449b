use axum::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::vision::OpenAiVision;
use super::{AnalysisError, AnalysisResult, AnalyzerClient};
use crate::config::VisionConfig;
use crate::images::prepare::prepare;

/// Production analysis pipeline: fetch the stored image through its signed
/// URL, normalize it for transport, then ask the vision model.
pub struct Analyzer {
    http: Client,
    vision: OpenAiVision,
}

impl Analyzer {
    pub fn new(cfg: &VisionConfig) -> Self {
        let http = Client::new();
        let vision = OpenAiVision::new(http.clone(), cfg);
        Self { http, vision }
    }
}

#[async_trait]
impl AnalyzerClient for Analyzer {
    async fn analyze_image(
        &self,
        image_url: &str,
        description: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!("starting image analysis");
        let raw = download(&self.http, image_url).await?;
        debug!(bytes = raw.len(), "image downloaded");
        let data_uri = prepare(&raw)?;
        self.vision.analyze_image(&data_uri, description).await
    }

    async fn analyze_text_only(
        &self,
        description: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        info!("starting text-only analysis");
        self.vision.analyze_text_only(description).await
    }
}

async fn download(http: &Client, url: &str) -> Result<Vec<u8>, AnalysisError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| AnalysisError::Service(format!("image download failed: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(AnalysisError::Service(format!(
            "image download returned {status}"
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalysisError::Service(format!("image download failed: {e}")))?;
    Ok(bytes.to_vec())
}
