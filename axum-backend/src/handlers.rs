use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::files::{allowed_file, is_plain_filename, secure_filename};
use crate::history::ConversionRecord;
use crate::session::{expired_session_cookie, session_cookie, session_id_from_headers, CurrentSession};
use crate::settings::{option_catalogue, ConversionSettings};
use crate::state::AppState;

const RECENT_CONVERSIONS: usize = 5;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Argon2 runs on the blocking pool
    let credentials = state.credentials.clone();
    let (username, password) = (request.username.clone(), request.password);
    let is_valid = tokio::task::spawn_blocking(move || credentials.verify(&username, &password))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn password verification task: {e}")))?;

    if !is_valid {
        warn!("Failed login attempt for user {:?}", request.username);
        return Err(AppError::InvalidCredentials);
    }

    let id = state.sessions.create(&request.username);
    info!("User {} logged in", request.username);

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&id))]),
        Json(serde_json::json!({ "user": request.username })),
    ))
}

pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    if let Some(id) = session_id_from_headers(&headers) {
        if let Some(data) = state.sessions.remove(&id) {
            info!("User {} logged out", data.user);
        }
    }

    (
        AppendHeaders([(header::SET_COOKIE, expired_session_cookie())]),
        Json(serde_json::json!({ "status": "logged_out" })),
    )
}

pub async fn index_handler(
    State(state): State<Arc<AppState>>,
    session: CurrentSession,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "user": session.data.user,
        "recent_conversions": state.history.recent(RECENT_CONVERSIONS),
    }))
}

pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    session: CurrentSession,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let max_upload_bytes = state.config.max_upload_bytes;
    let multipart_error = |e: MultipartError| AppError::from_multipart(e, max_upload_bytes);

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            upload = Some((filename, bytes));
            break;
        }
    }

    let (filename, bytes) = upload.ok_or(AppError::NoFileSelected)?;
    if filename.is_empty() {
        return Err(AppError::NoFileSelected);
    }
    if !allowed_file(&filename) {
        warn!("Rejected upload with unsupported type: {}", filename);
        return Err(AppError::InvalidFileType);
    }
    if bytes.len() > max_upload_bytes {
        warn!("Rejected upload of {} bytes", bytes.len());
        return Err(AppError::file_too_large(max_upload_bytes));
    }

    let original_filename = secure_filename(&filename);
    let stored_filename = format!("{}_{}", Uuid::new_v4(), original_filename);
    tokio::fs::write(state.config.uploads_dir().join(&stored_filename), &bytes).await?;

    info!("Stored upload {} ({} bytes)", stored_filename, bytes.len());

    state.sessions.update(&session.id, |data| {
        data.uploaded_file = Some(stored_filename.clone());
        data.original_filename = Some(original_filename.clone());
        data.settings = None;
        data.conversion_result = None;
    });

    Ok(Json(serde_json::json!({
        "uploaded_file": stored_filename,
        "original_filename": original_filename,
        "size": bytes.len(),
        "redirect": "/configure",
    })))
}

pub async fn configure_handler(session: CurrentSession) -> Result<Json<serde_json::Value>, AppError> {
    let uploaded_file = session.data.uploaded_file.ok_or(AppError::NoFileUploaded)?;

    Ok(Json(serde_json::json!({
        "uploaded_file": uploaded_file,
        "original_filename": session.data.original_filename,
        "options": option_catalogue(),
    })))
}

/// A progress step shown while the conversion runs; purely presentational
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingStage {
    pub name: &'static str,
    pub duration: u32,
}

pub const PROCESSING_STAGES: [ProcessingStage; 5] = [
    ProcessingStage { name: "Analyzing image content...", duration: 2 },
    ProcessingStage { name: "Detecting lines and shapes...", duration: 3 },
    ProcessingStage { name: "Converting to vector format...", duration: 4 },
    ProcessingStage { name: "Optimizing CAD file...", duration: 2 },
    ProcessingStage { name: "Preparing download...", duration: 1 },
];

pub async fn process_handler(
    State(state): State<Arc<AppState>>,
    session: CurrentSession,
    Form(settings): Form<ConversionSettings>,
) -> Result<Json<serde_json::Value>, AppError> {
    if session.data.uploaded_file.is_none() {
        return Err(AppError::NoFileUploaded);
    }

    info!(
        "Conversion configured: quality={}, text_recognition={}, output_format={}",
        settings.quality, settings.text_recognition, settings.output_format
    );

    state.sessions.update(&session.id, |data| {
        data.settings = Some(settings.clone());
    });

    Ok(Json(serde_json::json!({
        "settings": settings,
        "stages": PROCESSING_STAGES,
        "convert_url": "/api/convert",
    })))
}

pub async fn convert_handler(
    State(state): State<Arc<AppState>>,
    session: CurrentSession,
) -> Result<Json<serde_json::Value>, AppError> {
    let uploaded_file = session.data.uploaded_file.ok_or(AppError::NoFileUploaded)?;
    let settings = session.data.settings.unwrap_or_default();
    let original_filename = session
        .data
        .original_filename
        .unwrap_or_else(|| "unknown".to_string());

    let start = Instant::now();

    if !state.config.convert_delay.is_zero() {
        tokio::time::sleep(state.config.convert_delay).await;
    }

    let image_bytes = match tokio::fs::read(state.config.uploads_dir().join(&uploaded_file)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Uploaded file {} disappeared", uploaded_file);
            return Err(AppError::NoFileUploaded);
        }
        Err(e) => return Err(e.into()),
    };

    let outcome = state
        .generator
        .generate_from_image_bytes(&image_bytes, &settings.to_generation_settings())
        .await;

    if outcome.dxf.is_empty() {
        let reason = outcome
            .metadata
            .error
            .clone()
            .unwrap_or_else(|| "Model returned no DXF content".to_string());
        warn!("Conversion of {} produced no output: {}", original_filename, reason);
        return Err(AppError::ConversionFailed(reason));
    }

    if !outcome.is_valid {
        warn!("Conversion of {} produced DXF that failed validation", original_filename);
    }

    let converted_filename = format!("converted_{}.dxf", Uuid::new_v4());
    tokio::fs::write(state.config.converted_dir().join(&converted_filename), &outcome.dxf).await?;

    let record = ConversionRecord {
        id: Uuid::new_v4(),
        original_filename,
        converted_filename,
        timestamp: chrono::Local::now().to_rfc3339(),
        processing_time_ms: start.elapsed().as_millis() as u64,
        file_size: outcome.dxf.len() as u64,
        quality: outcome.metadata.quality_setting.to_string(),
        is_valid: outcome.is_valid,
        tokens_used: outcome.metadata.tokens_used.unwrap_or(0),
        model_used: outcome.metadata.model_used.clone(),
        settings,
    };

    info!(
        "Conversion {} complete in {}ms ({} bytes, valid: {})",
        record.id, record.processing_time_ms, record.file_size, record.is_valid
    );

    state.history.append(record.clone());
    state.sessions.update(&session.id, |data| {
        data.conversion_result = Some(record.clone());
    });

    Ok(Json(serde_json::json!({
        "status": "complete",
        "redirect": "/results",
        "result": record,
    })))
}

pub async fn results_handler(
    State(state): State<Arc<AppState>>,
    session: CurrentSession,
) -> Result<Json<serde_json::Value>, AppError> {
    let result = session.data.conversion_result.ok_or(AppError::NoResult)?;

    Ok(Json(serde_json::json!({
        "result": result,
        "recent_conversions": state.history.recent(RECENT_CONVERSIONS),
    })))
}

pub async fn download_handler(
    State(state): State<Arc<AppState>>,
    _session: CurrentSession,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_plain_filename(&filename) {
        warn!("Rejected download name {:?}", filename);
        return Err(AppError::InvalidFilename);
    }

    let bytes = match tokio::fs::read(state.config.converted_dir().join(&filename)).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let content_type = if filename.ends_with(".dxf") {
        "application/dxf"
    } else {
        "application/octet-stream"
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}
