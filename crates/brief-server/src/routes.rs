use axum::{Json, extract::State, response::IntoResponse};
use brief_core::{BriefRecord, Field, RecordError, is_valid_email};
use chrono::{Local, Utc};
use serde_json::json;
use tracing::{info, warn};

use crate::config::NotifyPolicy;
use crate::error::AppError;
use crate::notify::{Email, NotifyError, client_copy, internal_email};
use crate::state::AppState;

pub const RECEIVED_MESSAGE: &str = "Brief recibido correctamente";

pub async fn status_handler() -> impl IntoResponse {
    Json(json!({ "status": "online", "timestamp": Utc::now().to_rfc3339() }))
}

pub async fn submit_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::NoData);
    }
    let record = BriefRecord::from_json(&body).map_err(|err| match err {
        RecordError::Json(e) => AppError::MalformedPayload(e.to_string()),
        RecordError::NotAnObject(kind) => {
            AppError::MalformedPayload(format!("se esperaba un objeto, no {kind}"))
        }
    })?;
    check(&record)?;

    let rows = state.sheet.lock().await.append(&record)?;
    info!(client = %record.text(Field::ClienteNombre), rows, "brief stored");

    if let Err(err) = notify(&state, &record).await {
        match state.policy {
            NotifyPolicy::Strict => return Err(err.into()),
            NotifyPolicy::BestEffort => warn!(error = %err, "notification failed, continuing"),
        }
    }

    Ok(Json(json!({ "ok": true, "message": RECEIVED_MESSAGE })))
}

/// The backend's own gate; the form's full rule set runs client side.
fn check(record: &BriefRecord) -> Result<(), AppError> {
    if !is_valid_email(record.text(Field::ContactoEmail)) {
        return Err(AppError::Invalid("Email inválido"));
    }
    if record.text(Field::ClienteNombre).trim().chars().count() < 3 {
        return Err(AppError::Invalid("Nombre de cliente inválido"));
    }
    Ok(())
}

async fn notify(state: &AppState, record: &BriefRecord) -> Result<(), NotifyError> {
    let internal = internal_email(record, &state.recipient, Local::now())?;
    deliver(state, &internal).await?;
    if let Some(copy) = client_copy(record) {
        deliver(state, &copy).await?;
    }
    Ok(())
}

async fn deliver(state: &AppState, email: &Email) -> Result<(), NotifyError> {
    state.mailer.send(email).await?;
    info!(to = %email.to, subject = %email.subject, "mail sent");
    Ok(())
}
