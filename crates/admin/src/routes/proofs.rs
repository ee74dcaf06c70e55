//! Payment proof downloads.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::{instrument, warn};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::{ProofError, resolve_proof};
use crate::state::AppState;

/// Serve an uploaded proof to a signed-in admin.
///
/// # Route
///
/// `GET /proofs/{file}`
///
/// # Errors
///
/// Returns `AppError::BadRequest` for malformed names and
/// `AppError::NotFound` when the file does not exist.
#[instrument(skip(admin, state), fields(actor = %admin.id))]
pub async fn show(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<impl IntoResponse> {
    let proof = resolve_proof(&state.config().upload_dir, &file).map_err(|e| {
        warn!(file = %file, error = %e, "Rejected proof request");
        match e {
            ProofError::InvalidName | ProofError::UnsupportedType => {
                AppError::BadRequest("Invalid proof file".to_string())
            }
        }
    })?;

    let bytes = tokio::fs::read(&proof.path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound("Proof not found".to_string())
        } else {
            AppError::Internal(format!("reading proof: {e}"))
        }
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, proof.content_type),
            (header::CACHE_CONTROL, "private, no-store"),
            (header::CONTENT_DISPOSITION, "inline"),
        ],
        bytes,
    ))
}
