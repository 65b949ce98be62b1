use serde::{Deserialize, Serialize};

/// Prompt preset. Only changes the wording sent to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Quality {
    Fast,
    #[default]
    Balanced,
    High,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Fast => "fast",
            Quality::Balanced => "balanced",
            Quality::High => "high",
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            Quality::Fast => "Use simple approximations for speed. Focus on major structural elements.",
            Quality::Balanced => "Use consistent approximate scale. Balance accuracy with processing speed.",
            Quality::High => "Use precise measurements when possible. Include detailed elements and annotations.",
        }
    }
}

/// Unknown tiers fall back to balanced
impl From<&str> for Quality {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "fast" => Quality::Fast,
            "high" => Quality::High,
            _ => Quality::Balanced,
        }
    }
}

impl From<String> for Quality {
    fn from(value: String) -> Self {
        Quality::from(value.as_str())
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const SYSTEM_PROMPT: &str = "You are a CAD DXF generator. Convert the provided 2D plan image into a valid ASCII DXF. \
     Output only raw DXF text, no explanations, no markdown, no code fences. \
     Requirements: start with '0\\nSECTION' and end with '0\\nEOF'. \
     Use only DXF entities like LINE, LWPOLYLINE, and TEXT. \
     Put geometry on layer WALLS and labels on layer TEXT. \
     Absolutely do not include any prose.";

/// System instruction for the given quality tier
pub fn system_prompt(quality: Quality) -> String {
    format!("{} {}", SYSTEM_PROMPT, quality.instruction())
}

/// User instruction; text recognition toggles whether labels are traced
pub fn user_prompt(text_recognition: bool) -> String {
    let mut prompt =
        String::from("Trace the visible walls/rooms/labels from this floor plan image into straight segments");

    if text_recognition {
        prompt.push_str(" and text. Include room labels and dimensions where visible.");
    } else {
        prompt.push_str(". Focus only on structural elements, ignore text.");
    }

    prompt.push_str(
        " Return only raw ASCII DXF content (AutoCAD-compatible). Do not include any commentary or code fences.",
    );
    prompt
}
