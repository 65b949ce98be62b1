//! Post-processing of model output into a DXF payload.
//!
//! Models wrap DXF in markdown fences or surround it with prose no matter how
//! the prompt is worded, so the response is narrowed down to the text between
//! the first `0\nSECTION` and the last `0\nEOF`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

const FENCE: &str = "```";
const SECTION_MARKER: &str = "0\nSECTION";
const EOF_MARKER: &str = "0\nEOF";

/// Fenced block with an optional info tag (```dxf, ```text, ...).
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[a-zA-Z0-9_-]*\n(.*?)```").expect("fenced block pattern is valid")
});

/// Extracted payload plus the result of [`validate_dxf`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedPayload {
    pub dxf: String,
    pub is_valid: bool,
}

/// Extract and validate in one step
pub fn sanitize(text: &str) -> SanitizedPayload {
    let dxf = extract_dxf(text);
    let is_valid = validate_dxf(&dxf);
    SanitizedPayload { dxf, is_valid }
}

/// Extract clean DXF content from a free-form model response.
///
/// Never fails: unusable input yields an empty or partial string which
/// [`validate_dxf`] will reject.
pub fn extract_dxf(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let unfenced: String = if text.contains(FENCE) {
        FENCED_BLOCK
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|block| block.as_str())
            .find(|block| block.contains("SECTION") && block.contains("EOF"))
            .map(str::to_string)
            .unwrap_or_else(|| text.replace(FENCE, ""))
    } else {
        text.to_string()
    };

    let mut data = unfenced.trim();

    if let Some(start) = data.find(SECTION_MARKER) {
        data = &data[start..];
    }

    if let Some(last_eof) = data.rfind(EOF_MARKER) {
        data = &data[..last_eof + EOF_MARKER.len()];
    }

    data.trim().to_string()
}

/// Structural check: starts with a SECTION, ends with EOF and has an
/// ENTITIES section somewhere in between.
pub fn validate_dxf(data: &str) -> bool {
    !data.is_empty()
        && data.starts_with(SECTION_MARKER)
        && data.contains("ENTITIES")
        && data.ends_with(EOF_MARKER)
}
