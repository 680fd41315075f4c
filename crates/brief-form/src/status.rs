//! The form's message area.

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    SavedLocally,
    Restored,
    Cleared,
    StorageFailed(String),
    Invalid(Vec<String>),
    Sending,
    Sent { message: Option<String> },
    ServerError { status: u16, body: String },
    NetworkError,
    FallbackSaved(PathBuf),
    ServiceAvailable,
    ServiceUnavailable,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SavedLocally => f.write_str("Guardado localmente."),
            Notice::Restored => f.write_str("Restaurado desde guardado local."),
            Notice::Cleared => f.write_str("Formulario limpiado."),
            Notice::StorageFailed(err) => write!(f, "No se pudo guardar localmente: {err}"),
            Notice::Invalid(messages) => {
                for (i, msg) in messages.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "- {msg}")?;
                }
                Ok(())
            }
            Notice::Sending => f.write_str("Enviando…"),
            Notice::Sent { message } => match message {
                Some(msg) => write!(f, "Enviado correctamente. {msg}"),
                None => f.write_str("Enviado correctamente."),
            },
            Notice::ServerError { status, body } => {
                let detail = if body.is_empty() { "sin detalle" } else { body };
                write!(f, "Error del servidor: {status}. Respuesta: {detail}")
            }
            Notice::NetworkError => {
                f.write_str("Error de red al enviar. Se descargará un JSON como respaldo.")
            }
            Notice::FallbackSaved(path) => write!(f, "Respaldo guardado en {}", path.display()),
            Notice::ServiceAvailable => f.write_str("Servicio de envío disponible."),
            Notice::ServiceUnavailable => f.write_str(
                "Servicio de envío no accesible. Las respuestas podrán descargarse localmente o enviarse cuando esté disponible.",
            ),
        }
    }
}

/// Notices kept for [`StatusBoard::history`]; older ones are dropped.
pub const HISTORY_LIMIT: usize = 64;

#[derive(Debug, Default)]
struct Log {
    notices: VecDeque<Notice>,
    pushed: usize,
}

/// Shared log of recent notices. Cloning shares the same board.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    log: Arc<Mutex<Log>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, notice: Notice) {
        let mut log = self.lock();
        if log.notices.len() == HISTORY_LIMIT {
            log.notices.pop_front();
        }
        log.notices.push_back(notice);
        log.pushed += 1;
    }

    /// The message currently shown.
    pub fn latest(&self) -> Option<Notice> {
        self.lock().notices.back().cloned()
    }

    /// The retained notices, oldest first.
    pub fn history(&self) -> Vec<Notice> {
        self.lock().notices.iter().cloned().collect()
    }

    /// Total notices pushed so far, for use with [`since`](Self::since).
    pub fn mark(&self) -> usize {
        self.lock().pushed
    }

    /// Notices pushed after `mark`, as far as they are still retained.
    pub fn since(&self, mark: usize) -> Vec<Notice> {
        let log = self.lock();
        let fresh = log.pushed.saturating_sub(mark).min(log.notices.len());
        log.notices.iter().skip(log.notices.len() - fresh).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_board() {
        let board = StatusBoard::new();
        let other = board.clone();
        other.push(Notice::Sending);
        assert_eq!(board.latest(), Some(Notice::Sending));
    }

    #[test]
    fn server_error_without_body() {
        let notice = Notice::ServerError {
            status: 503,
            body: String::new(),
        };
        assert_eq!(notice.to_string(), "Error del servidor: 503. Respuesta: sin detalle");
    }

    #[test]
    fn invalid_lists_each_message() {
        let notice = Notice::Invalid(vec!["uno".into(), "dos".into()]);
        assert_eq!(notice.to_string(), "- uno\n- dos");
    }

    #[test]
    fn history_is_bounded() {
        let board = StatusBoard::new();
        for _ in 0..HISTORY_LIMIT * 3 {
            board.push(Notice::SavedLocally);
        }
        board.push(Notice::Sending);
        let history = board.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.last(), Some(&Notice::Sending));
        assert_eq!(board.mark(), HISTORY_LIMIT * 3 + 1);
    }

    #[test]
    fn since_returns_notices_after_mark() {
        let board = StatusBoard::new();
        for _ in 0..HISTORY_LIMIT {
            board.push(Notice::SavedLocally);
        }
        let mark = board.mark();
        board.push(Notice::Sending);
        board.push(Notice::NetworkError);
        assert_eq!(board.since(mark), vec![Notice::Sending, Notice::NetworkError]);
        assert!(board.since(board.mark()).is_empty());
    }
}
