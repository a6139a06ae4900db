//! Adapter over the external facial-emotion model.
//!
//! The model itself runs out of process as a DeepFace-compatible analysis
//! service. We send it the uploaded image, ask for the emotion action only
//! with face detection enforcement off, and keep the dominant label.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    #[error("request to emotion service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("emotion service responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode emotion service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("classifier returned no face analysis")]
    NoResult,
}

#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Returns the dominant emotion label for the image at `image`.
    async fn classify(&self, image: &Path) -> Result<String, ClassificationError>;
}

pub struct DeepFaceClient {
    client: reqwest::Client,
    base_url: String,
}

impl DeepFaceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClassificationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EmotionClassifier for DeepFaceClient {
    async fn classify(&self, image: &Path) -> Result<String, ClassificationError> {
        let bytes = tokio::fs::read(image).await?;
        let img = format!("data:{};base64,{}", mime_for(image), STANDARD.encode(&bytes));

        let payload = json!({
            "img": img,
            "actions": ["emotion"],
            "enforce_detection": false,
        });

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClassificationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let emotion = dominant_emotion(&body)?;
        debug!("Classified {} as {}", image.display(), emotion);
        Ok(emotion)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnalyzeResponse {
    Wrapped { results: Vec<FaceAnalysis> },
    Bare(Vec<FaceAnalysis>),
}

#[derive(Deserialize)]
struct FaceAnalysis {
    dominant_emotion: Option<String>,
    #[serde(default)]
    emotion: HashMap<String, f64>,
}

/// Picks the label for the first analysed face: `dominant_emotion` when the
/// service reports it, otherwise the highest score.
pub fn dominant_emotion(body: &str) -> Result<String, ClassificationError> {
    let faces = match serde_json::from_str(body)? {
        AnalyzeResponse::Wrapped { results } => results,
        AnalyzeResponse::Bare(results) => results,
    };

    let face = faces.into_iter().next().ok_or(ClassificationError::NoResult)?;
    if let Some(label) = face.dominant_emotion {
        return Ok(label);
    }

    face.emotion
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(label, _)| label)
        .ok_or(ClassificationError::NoResult)
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "image/jpeg",
    }
}
