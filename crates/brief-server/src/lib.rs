//! Reference backend for brief submissions.
//!
//! One route does everything: `GET /` answers a liveness probe and `POST /`
//! takes a JSON brief (sent as `text/plain` so browsers skip the preflight),
//! appends it to the CSV sheet, and emails the agency plus an optional client
//! copy. What a mail failure does to the reply is set by [`NotifyPolicy`].

use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub mod config;
pub mod error;
pub mod notify;
pub mod routes;
pub mod sheet;
pub mod state;

pub use config::{NotifyPolicy, ServerConfig};
pub use error::AppError;
pub use state::AppState;

use routes::{status_handler, submit_handler};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(status_handler).post(submit_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind, serve until Ctrl+C or SIGTERM, then drain.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)
        .with_context(|| format!("opening sheet {}", config.sheet.display()))?;
    info!(
        sheet = %config.sheet.display(),
        recipient = %config.recipient,
        policy = ?config.notify_policy,
        "state initialised"
    );

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    info!(address = %listener.local_addr()?, "brief server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("brief server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use brief_core::{BriefRecord, Field};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::notify::{Email, Mailer, NotifyError};
    use crate::sheet::Sheet;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Email>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Delivery("relay refused".to_string()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct Harness {
        _tmp: tempfile::TempDir,
        app: Router,
        mailer: Arc<RecordingMailer>,
        sheet: std::path::PathBuf,
    }

    fn harness(policy: NotifyPolicy, fail: bool, recipient: &str) -> Harness {
        let tmp = tempfile::tempdir().unwrap();
        let sheet = tmp.path().join("responses.csv");
        let mailer = Arc::new(RecordingMailer {
            fail,
            ..Default::default()
        });
        let state = AppState::new(Sheet::open(&sheet).unwrap(), mailer.clone(), recipient, policy);
        Harness {
            _tmp: tmp,
            app: router(state),
            mailer,
            sheet,
        }
    }

    fn brief() -> BriefRecord {
        BriefRecord::new()
            .with(Field::ClienteNombre, "Acme Co")
            .with(Field::ContactoNombre, "Jane")
            .with(Field::ContactoEmail, "jane@acme.com")
            .with(Field::Objetivos, vec!["Leads", "Ventas"])
    }

    async fn post(app: &Router, body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::post("/")
            .header("content-type", "text/plain;charset=utf-8")
            .body(body.into())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn rows(path: &std::path::Path) -> usize {
        Sheet::open(path).unwrap().rows().unwrap().len()
    }

    #[tokio::test]
    async fn accepts_and_stores_a_brief() {
        let h = harness(NotifyPolicy::Strict, false, "team@agency.dev");
        let (status, body) = post(&h.app, serde_json::to_string(&brief()).unwrap()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["message"], "Brief recibido correctamente");
        assert_eq!(rows(&h.sheet), 1);

        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "team@agency.dev");
        assert_eq!(sent[0].subject, "Nuevo Brief: Acme Co");
    }

    #[tokio::test]
    async fn empty_and_malformed_bodies_are_bad_requests() {
        let h = harness(NotifyPolicy::Strict, false, "team@agency.dev");

        let (status, body) = post(&h.app, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "No se recibieron datos");

        let (status, body) = post(&h.app, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("JSON inválido"));

        let (status, _) = post(&h.app, "[1,2]").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(rows(&h.sheet), 0);
    }

    #[tokio::test]
    async fn minimal_validation_rejects_with_422() {
        let h = harness(NotifyPolicy::Strict, false, "team@agency.dev");

        let bad_email = brief().with(Field::ContactoEmail, "jane-at-acme");
        let (status, body) = post(&h.app, serde_json::to_string(&bad_email).unwrap()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Email inválido");

        let short_name = brief().with(Field::ClienteNombre, " Ab ");
        let (status, body) = post(&h.app, serde_json::to_string(&short_name).unwrap()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Nombre de cliente inválido");

        assert_eq!(rows(&h.sheet), 0);
        assert!(h.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn strict_policy_reports_mail_failure() {
        let h = harness(NotifyPolicy::Strict, true, "team@agency.dev");
        let (status, body) = post(&h.app, serde_json::to_string(&brief()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("relay refused"));
        // The row is written before mail goes out.
        assert_eq!(rows(&h.sheet), 1);
    }

    #[tokio::test]
    async fn best_effort_policy_succeeds_despite_mail_failure() {
        let h = harness(NotifyPolicy::BestEffort, true, "team@agency.dev");
        let (status, body) = post(&h.app, serde_json::to_string(&brief()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn invalid_recipient_is_a_notification_failure() {
        let h = harness(NotifyPolicy::Strict, false, "nobody");
        let (status, _) = post(&h.app, serde_json::to_string(&brief()).unwrap()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(h.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn client_copy_follows_consent() {
        let h = harness(NotifyPolicy::Strict, false, "team@agency.dev");
        let without = brief().with(Field::EmailCopia, "copy@acme.com");
        post(&h.app, serde_json::to_string(&without).unwrap()).await;
        assert_eq!(h.mailer.sent.lock().unwrap().len(), 1);

        let with = without.with(Field::ConsentCorreo, "true");
        let (status, _) = post(&h.app, serde_json::to_string(&with).unwrap()).await;
        assert_eq!(status, StatusCode::OK);

        let sent = h.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].to, "copy@acme.com");
        assert_eq!(sent[2].subject, "Copia de tu Brief - Acme Co");
    }

    #[tokio::test]
    async fn liveness_reports_online() {
        let h = harness(NotifyPolicy::Strict, false, "team@agency.dev");
        let request = Request::get("/").body(Body::empty()).unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "online");
        let stamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[tokio::test]
    async fn preflight_is_allowed_from_any_origin() {
        let h = harness(NotifyPolicy::Strict, false, "team@agency.dev");
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/")
            .header("origin", "https://forms.example")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
