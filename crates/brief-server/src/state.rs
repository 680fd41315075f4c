use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::{NotifyPolicy, ServerConfig};
use crate::notify::{LogMailer, Mailer, OutboxMailer};
use crate::sheet::{Sheet, SheetError};

#[derive(Clone)]
pub struct AppState {
    pub sheet: Arc<Mutex<Sheet>>,
    pub mailer: Arc<dyn Mailer>,
    pub recipient: String,
    pub policy: NotifyPolicy,
}

impl AppState {
    pub fn new(
        sheet: Sheet,
        mailer: Arc<dyn Mailer>,
        recipient: impl Into<String>,
        policy: NotifyPolicy,
    ) -> Self {
        Self {
            sheet: Arc::new(Mutex::new(sheet)),
            mailer,
            recipient: recipient.into(),
            policy,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, SheetError> {
        let sheet = Sheet::open(&config.sheet)?;
        let mailer: Arc<dyn Mailer> = match &config.mail_outbox {
            Some(dir) => Arc::new(OutboxMailer::new(dir)),
            None => Arc::new(LogMailer),
        };
        Ok(Self::new(
            sheet,
            mailer,
            config.recipient.clone(),
            config.notify_policy,
        ))
    }
}
