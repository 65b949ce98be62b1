//! File name handling for uploads and downloads.

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "pdf"];

/// Extension check on the client-supplied name (case-insensitive)
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied name to `[A-Za-z0-9_.-]`, with whitespace and
/// path separators turned into underscores. Never contains a path.
pub fn secure_filename(filename: &str) -> String {
    let joined = filename
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Download names must already be what we would have generated
pub fn is_plain_filename(filename: &str) -> bool {
    !filename.is_empty() && secure_filename(filename) == filename
}
