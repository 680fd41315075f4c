use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

/// What a failed notification email does to the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NotifyPolicy {
    /// Answer with a failure; the row is already stored.
    Strict,
    /// Log the failure and answer with success.
    BestEffort,
}

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "BRIEF_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// CSV file rows are appended to.
    #[arg(long, env = "BRIEF_SHEET", default_value = "data/responses.csv")]
    pub sheet: PathBuf,

    /// Internal address notified of every brief.
    #[arg(long, env = "BRIEF_INTERNAL_RECIPIENT", default_value = "briefs@localhost.dev")]
    pub recipient: String,

    /// Directory outgoing mail is written to. Mail is only logged when unset.
    #[arg(long, env = "BRIEF_MAIL_OUTBOX")]
    pub mail_outbox: Option<PathBuf>,

    #[arg(long, env = "BRIEF_NOTIFY_POLICY", value_enum, default_value_t = NotifyPolicy::Strict)]
    pub notify_policy: NotifyPolicy,
}

impl ServerConfig {
    /// Loopback config keeping its sheet under `dir`, with logged mail.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            sheet: dir.join("responses.csv"),
            recipient: "briefs@localhost.dev".to_string(),
            mail_outbox: None,
            notify_policy: NotifyPolicy::Strict,
        }
    }
}
