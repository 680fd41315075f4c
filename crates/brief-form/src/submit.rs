//! Submission lifecycle: validate, preview, confirm, send, fall back.
//!
//! ```text
//! Editing ──submit──▶ Previewing ──confirm──▶ Confirming ──▶ Sending ──▶ Succeeded | Failed
//!    ▲                    │
//!    └────────edit────────┘
//! ```
//!
//! `Succeeded` and `Failed` accept a new `submit` exactly as `Editing` does.
//! Only one `Sending` exists at a time; while it is in flight the submit
//! control is disabled and both `submit` and `confirm` are refused.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use brief_core::export::{to_csv, to_json};
use brief_core::{BriefRecord, ValidationResult, validate};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::download::{CSV_FILE, DownloadError, DownloadSink, FALLBACK_FILE, JSON_FILE, OFFLINE_FILE};
use crate::draft::DraftStore;
use crate::preview::{PreviewRow, preview_rows};
use crate::serialize::serialize;
use crate::status::{Notice, StatusBoard};
use crate::transport::Transport;
use crate::ui::UiState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Previewing(BriefRecord),
    Confirming,
    Sending,
    Succeeded,
    Failed,
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Phase::Editing => "editing",
            Phase::Previewing(_) => "previewing",
            Phase::Confirming => "confirming",
            Phase::Sending => "sending",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    Busy,
    #[error("nothing to confirm: no preview is open")]
    NotPreviewing,
}

/// Result of a submit intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    /// Validation failed; the form stays editable.
    Invalid(ValidationResult),
    /// Preview opened; awaiting `confirm` or `edit`.
    Preview(Vec<PreviewRow>),
}

/// How a confirmed send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded {
        message: Option<String>,
    },
    Rejected {
        status: u16,
        body: String,
        fallback: Option<PathBuf>,
    },
    Unreachable {
        error: String,
        fallback: Option<PathBuf>,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

#[derive(Deserialize)]
struct SuccessBody {
    message: Option<String>,
}

pub struct SubmissionController {
    transport: Arc<dyn Transport>,
    draft: Arc<DraftStore>,
    downloads: Arc<dyn DownloadSink>,
    status: StatusBoard,
    phase: Mutex<Phase>,
}

impl SubmissionController {
    pub fn new(
        transport: Arc<dyn Transport>,
        draft: Arc<DraftStore>,
        downloads: Arc<dyn DownloadSink>,
        status: StatusBoard,
    ) -> Self {
        Self {
            transport,
            draft,
            downloads,
            status,
            phase: Mutex::new(Phase::Editing),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(phase: &mut Phase, next: Phase) {
        debug!(from = phase.label(), to = next.label(), "submission phase");
        *phase = next;
    }

    pub fn phase(&self) -> Phase {
        self.lock().clone()
    }

    /// Whether the submit control is enabled.
    pub fn submit_enabled(&self) -> bool {
        !matches!(*self.lock(), Phase::Confirming | Phase::Sending)
    }

    /// Submit intent from the form.
    pub fn submit(&self, ui: &UiState) -> Result<Submitted, SubmitError> {
        self.submit_record(serialize(ui))
    }

    /// Submit intent for a record taken as is, such as one loaded from a file.
    pub fn submit_record(&self, record: BriefRecord) -> Result<Submitted, SubmitError> {
        let mut phase = self.lock();
        if matches!(*phase, Phase::Confirming | Phase::Sending) {
            return Err(SubmitError::Busy);
        }

        let result = validate(&record);
        if !result.ok() {
            info!(errors = result.errors.len(), "brief failed validation");
            self.status.push(Notice::Invalid(result.messages()));
            Self::transition(&mut phase, Phase::Editing);
            return Ok(Submitted::Invalid(result));
        }

        let rows = preview_rows(&record);
        Self::transition(&mut phase, Phase::Previewing(record));
        Ok(Submitted::Preview(rows))
    }

    /// Close the preview without sending.
    pub fn edit(&self) -> Result<(), SubmitError> {
        let mut phase = self.lock();
        match &*phase {
            Phase::Previewing(_) => {}
            Phase::Confirming | Phase::Sending => return Err(SubmitError::Busy),
            _ => return Err(SubmitError::NotPreviewing),
        }
        Self::transition(&mut phase, Phase::Editing);
        Ok(())
    }

    /// Send the previewed record. Issues exactly one request.
    pub async fn confirm(&self) -> Result<Outcome, SubmitError> {
        let record = {
            let mut phase = self.lock();
            let record = match &*phase {
                Phase::Previewing(record) => record.clone(),
                Phase::Confirming | Phase::Sending => return Err(SubmitError::Busy),
                _ => return Err(SubmitError::NotPreviewing),
            };
            Self::transition(&mut phase, Phase::Confirming);
            Self::transition(&mut phase, Phase::Sending);
            record
        };
        self.status.push(Notice::Sending);

        let outcome = match self.transport.send(&record).await {
            Ok(reply) if reply.is_success() => {
                let message = serde_json::from_str::<SuccessBody>(&reply.body)
                    .ok()
                    .and_then(|b| b.message);
                self.draft.clear();
                info!(status = reply.status, "brief submitted");
                self.status.push(Notice::Sent {
                    message: message.clone(),
                });
                Outcome::Succeeded { message }
            }
            Ok(reply) => {
                warn!(status = reply.status, "backend rejected brief");
                self.status.push(Notice::ServerError {
                    status: reply.status,
                    body: reply.body.clone(),
                });
                let fallback = self.fallback(FALLBACK_FILE, &record);
                Outcome::Rejected {
                    status: reply.status,
                    body: reply.body,
                    fallback,
                }
            }
            Err(err) => {
                warn!(error = %err, "network error while submitting brief");
                self.status.push(Notice::NetworkError);
                let fallback = self.fallback(OFFLINE_FILE, &record);
                Outcome::Unreachable {
                    error: err.to_string(),
                    fallback,
                }
            }
        };

        let next = if outcome.is_success() {
            Phase::Succeeded
        } else {
            Phase::Failed
        };
        Self::transition(&mut self.lock(), next);
        Ok(outcome)
    }

    fn fallback(&self, filename: &str, record: &BriefRecord) -> Option<PathBuf> {
        let written = to_json(record)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.downloads
                    .deliver(filename, &json)
                    .map_err(|e| e.to_string())
            });
        match written {
            Ok(path) => {
                self.status.push(Notice::FallbackSaved(path.clone()));
                Some(path)
            }
            Err(err) => {
                warn!(file = filename, error = %err, "fallback export failed");
                None
            }
        }
    }

    /// Download the current form as `brief.json`.
    pub fn export_json(&self, ui: &UiState) -> Result<PathBuf, DownloadError> {
        let record = serialize(ui);
        let json = to_json(&record).map_err(|e| DownloadError::Encode(e.to_string()))?;
        self.downloads.deliver(JSON_FILE, &json)
    }

    /// Download the current form as `brief.csv`.
    pub fn export_csv(&self, ui: &UiState) -> Result<PathBuf, DownloadError> {
        self.downloads.deliver(CSV_FILE, &to_csv(&serialize(ui)))
    }
}
