use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::notify::NotifyError;
use crate::sheet::SheetError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No se recibieron datos")]
    NoData,

    #[error("JSON inválido: {0}")]
    MalformedPayload(String),

    #[error("{0}")]
    Invalid(&'static str),

    #[error("Error al guardar: {0}")]
    Storage(#[from] SheetError),

    #[error("Error al enviar email: {0}")]
    Notification(#[from] NotifyError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoData | AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Notification(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "ok": false, "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
