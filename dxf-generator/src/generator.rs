use std::borrow::Cow;
use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::{ChatRequest, CompletionClient, Message, OpenAiCompatClient};
use crate::config::GeneratorConfig;
use crate::prompt::{system_prompt, user_prompt, Quality};
use crate::sanitize::sanitize;

const TEMPERATURE: f64 = 0.1;

/// Per-request knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default)]
    pub quality: Quality,
    #[serde(default = "default_text_recognition")]
    pub text_recognition: bool,
    /// Overrides the configured default model
    #[serde(default)]
    pub model: Option<String>,
}

fn default_text_recognition() -> bool {
    true
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            quality: Quality::Balanced,
            text_recognition: true,
            model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub model_used: String,
    pub quality_setting: Quality,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_recognition: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    /// Payload is non-empty
    pub processing_successful: bool,
    pub validation_passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one conversion attempt.
///
/// On failure `dxf` is empty, `raw` holds the error text and
/// `metadata.error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub dxf: String,
    pub raw: String,
    pub is_valid: bool,
    pub metadata: GenerationMetadata,
}

impl GenerationOutcome {
    pub fn into_parts(self) -> (String, String, bool, GenerationMetadata) {
        (self.dxf, self.raw, self.is_valid, self.metadata)
    }

    pub fn is_failure(&self) -> bool {
        self.metadata.error.is_some()
    }
}

/// Turns floor plan images into DXF text through a hosted chat model
pub struct DxfGenerator {
    client: Arc<dyn CompletionClient>,
    default_model: String,
    max_tokens: u32,
}

impl DxfGenerator {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self::with_client(config, Arc::new(OpenAiCompatClient::new(config)))
    }

    /// Use a custom completion backend
    pub fn with_client(config: &GeneratorConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            default_model: config.default_model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn build_request(&self, image_url: String, settings: &GenerationSettings) -> ChatRequest {
        let model = settings.model.clone().unwrap_or_else(|| self.default_model.clone());

        ChatRequest {
            model,
            temperature: TEMPERATURE,
            max_tokens: self.max_tokens,
            messages: vec![
                Message::system(system_prompt(settings.quality)),
                Message::user_with_image(user_prompt(settings.text_recognition), image_url),
            ],
        }
    }

    /// Convert image bytes to DXF.
    ///
    /// Never returns an error: client failures become a failed outcome.
    pub async fn generate_from_image_bytes(
        &self,
        image_bytes: &[u8],
        settings: &GenerationSettings,
    ) -> GenerationOutcome {
        let request = self.build_request(image_data_uri(image_bytes).await, settings);
        let model = request.model.clone();

        info!(
            "Generating DXF from {} byte image (model: {}, quality: {})",
            image_bytes.len(),
            model,
            settings.quality
        );

        match self.client.complete(&request).await {
            Ok(completion) => {
                let payload = sanitize(&completion.content);

                info!(
                    "DXF extracted: {} chars, valid: {}, tokens: {}",
                    payload.dxf.len(),
                    payload.is_valid,
                    completion.total_tokens
                );

                GenerationOutcome {
                    metadata: GenerationMetadata {
                        model_used: model,
                        quality_setting: settings.quality,
                        text_recognition: Some(settings.text_recognition),
                        tokens_used: Some(completion.total_tokens),
                        processing_successful: !payload.dxf.is_empty(),
                        validation_passed: payload.is_valid,
                        error: None,
                    },
                    dxf: payload.dxf,
                    raw: completion.content,
                    is_valid: payload.is_valid,
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!("DXF generation failed: {}", message);

                GenerationOutcome {
                    dxf: String::new(),
                    raw: message.clone(),
                    is_valid: false,
                    metadata: GenerationMetadata {
                        model_used: model,
                        quality_setting: settings.quality,
                        text_recognition: None,
                        tokens_used: None,
                        processing_successful: false,
                        validation_passed: false,
                        error: Some(message),
                    },
                }
            }
        }
    }
}

/// `data:image/jpeg;base64,...` for the upload. Decoding and re-encoding
/// run on the blocking pool.
async fn image_data_uri(image_bytes: &[u8]) -> String {
    let owned = image_bytes.to_vec();
    let encoded = tokio::task::spawn_blocking(move || general_purpose::STANDARD.encode(as_jpeg(&owned)))
        .await
        .unwrap_or_else(|e| {
            warn!("Image preparation task failed, sending original bytes: {}", e);
            general_purpose::STANDARD.encode(image_bytes)
        });
    format!("data:image/jpeg;base64,{}", encoded)
}

/// Re-encode decodable non-JPEG rasters so the data URI media type is
/// accurate. Anything else (PDF, corrupt data) is passed through.
fn as_jpeg(image_bytes: &[u8]) -> Cow<'_, [u8]> {
    match image::guess_format(image_bytes) {
        Ok(ImageFormat::Jpeg) | Err(_) => Cow::Borrowed(image_bytes),
        Ok(format) => match image::load_from_memory_with_format(image_bytes, format) {
            Ok(img) => {
                let mut out = Cursor::new(Vec::new());
                match DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut out, ImageFormat::Jpeg) {
                    Ok(()) => Cow::Owned(out.into_inner()),
                    Err(e) => {
                        warn!("JPEG re-encode failed, sending original bytes: {}", e);
                        Cow::Borrowed(image_bytes)
                    }
                }
            }
            Err(e) => {
                warn!("Could not decode {:?} image, sending original bytes: {}", format, e);
                Cow::Borrowed(image_bytes)
            }
        },
    }
}
