//! Floor plan image to DXF conversion through an OpenAI-compatible chat model.
//!
//! The model does the tracing; this crate builds the prompts, makes the call
//! and narrows the reply down to something that looks like a DXF file.

pub mod client;
pub mod config;
pub mod generator;
pub mod prompt;
pub mod sanitize;

pub use client::{ChatRequest, Completion, CompletionClient, OpenAiCompatClient};
pub use config::{ConfigError, GeneratorConfig};
pub use generator::{DxfGenerator, GenerationMetadata, GenerationOutcome, GenerationSettings};
pub use prompt::Quality;
pub use sanitize::{extract_dxf, sanitize, validate_dxf, SanitizedPayload};
