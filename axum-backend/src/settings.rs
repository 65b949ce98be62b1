use dxf_generator::{GenerationSettings, Quality};
use serde::{Deserialize, Serialize};

/// Options submitted from the configure form.
///
/// Only `quality`, `text_recognition` and `model` reach the model prompt;
/// the rest are recorded with the conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSettings {
    #[serde(default = "default_output_format")]
    pub output_format: String,
    #[serde(default = "default_quality")]
    pub quality: String,
    #[serde(default = "default_scale")]
    pub scale: String,
    #[serde(default = "default_line_detection")]
    pub line_detection: String,
    #[serde(default = "default_text_recognition")]
    pub text_recognition: String,
    #[serde(default = "default_color_handling")]
    pub color_handling: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_output_format() -> String {
    "dwg".to_string()
}

fn default_quality() -> String {
    "balanced".to_string()
}

fn default_scale() -> String {
    "auto".to_string()
}

fn default_line_detection() -> String {
    "normal".to_string()
}

fn default_text_recognition() -> String {
    "on".to_string()
}

fn default_color_handling() -> String {
    "preserve".to_string()
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            output_format: default_output_format(),
            quality: default_quality(),
            scale: default_scale(),
            line_detection: default_line_detection(),
            text_recognition: default_text_recognition(),
            color_handling: default_color_handling(),
            model: None,
        }
    }
}

impl ConversionSettings {
    pub fn quality(&self) -> Quality {
        Quality::from(self.quality.as_str())
    }

    pub fn text_recognition_enabled(&self) -> bool {
        self.text_recognition == "on"
    }

    pub fn to_generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            quality: self.quality(),
            text_recognition: self.text_recognition_enabled(),
            model: self.model.clone().filter(|m| !m.trim().is_empty()),
        }
    }
}

/// Choices offered on the configure page
pub fn option_catalogue() -> serde_json::Value {
    serde_json::json!({
        "output_format": ["dwg", "dxf"],
        "quality": ["fast", "balanced", "high"],
        "scale": ["auto", "1:50", "1:100", "1:200"],
        "line_detection": ["normal", "sensitive", "strict"],
        "text_recognition": ["on", "off"],
        "color_handling": ["preserve", "monochrome"],
        "defaults": ConversionSettings::default(),
    })
}
