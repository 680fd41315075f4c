use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use brief_core::export::{to_csv, to_json};
use brief_core::{BriefRecord, validate};
use brief_form::download::{CSV_FILE, JSON_FILE};
use brief_form::{
    DownloadDir, DownloadSink, DraftStore, FileStorage, HttpTransport, StatusBoard,
    SubmissionController, Submitted, spawn_probe,
};
use brief_server::ServerConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "brief", version, about = "Website brief intake: form client and reference backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reference backend.
    Serve(ServerConfig),
    /// Validate a brief stored as JSON.
    Check { file: PathBuf },
    /// Write a brief as `brief.json` or `brief.csv` into the download directory.
    Export {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        #[arg(long, env = "BRIEF_DOWNLOAD_DIR", default_value = ".")]
        downloads: PathBuf,
    },
    /// Validate, preview and send a brief.
    Submit {
        file: PathBuf,
        /// Send without asking for confirmation.
        #[arg(long)]
        yes: bool,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Check whether the submission service answers.
    Probe {
        #[arg(long, env = "BRIEF_SUBMIT_URL")]
        url: String,
    },
    /// Inspect or discard the locally saved draft.
    Draft {
        #[command(subcommand)]
        action: DraftAction,
        #[arg(long, env = "BRIEF_DRAFT_DIR", default_value = ".brief", global = true)]
        drafts: PathBuf,
    },
}

#[derive(Args)]
struct ClientArgs {
    /// Submission endpoint.
    #[arg(long, env = "BRIEF_SUBMIT_URL")]
    url: String,
    /// Where exports and fallback copies are written.
    #[arg(long, env = "BRIEF_DOWNLOAD_DIR", default_value = ".")]
    downloads: PathBuf,
    /// Where the draft is kept between runs.
    #[arg(long, env = "BRIEF_DRAFT_DIR", default_value = ".brief")]
    drafts: PathBuf,
}

#[derive(Subcommand)]
enum DraftAction {
    Show,
    Clear,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    info!("brief v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Serve(config) => {
            brief_server::serve(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { file } => check(&file),
        Command::Export {
            file,
            format,
            downloads,
        } => export(&file, format, downloads),
        Command::Submit { file, yes, client } => submit(&file, yes, client).await,
        Command::Probe { url } => probe(url).await,
        Command::Draft { action, drafts } => draft(action, drafts),
    }
}

fn read_record(file: &Path) -> anyhow::Result<BriefRecord> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    BriefRecord::from_json(&text).with_context(|| format!("parsing {}", file.display()))
}

fn check(file: &Path) -> anyhow::Result<ExitCode> {
    let result = validate(&read_record(file)?);
    if result.ok() {
        println!("Brief válido.");
        return Ok(ExitCode::SUCCESS);
    }
    for message in result.messages() {
        println!("- {message}");
    }
    Ok(ExitCode::FAILURE)
}

fn export(file: &Path, format: Format, downloads: PathBuf) -> anyhow::Result<ExitCode> {
    let record = read_record(file)?;
    let sink = DownloadDir::new(downloads);
    let path = match format {
        Format::Json => sink.deliver(JSON_FILE, &to_json(&record)?)?,
        Format::Csv => sink.deliver(CSV_FILE, &to_csv(&record))?,
    };
    println!("{}", path.display());
    Ok(ExitCode::SUCCESS)
}

async fn submit(file: &Path, yes: bool, client: ClientArgs) -> anyhow::Result<ExitCode> {
    let status = StatusBoard::new();
    let draft = Arc::new(DraftStore::new(
        Arc::new(FileStorage::new(&client.drafts)),
        status.clone(),
    ));

    let record = read_record(file)?;
    draft.save(&record);

    let controller = SubmissionController::new(
        Arc::new(HttpTransport::new(client.url)),
        draft,
        Arc::new(DownloadDir::new(client.downloads)),
        status.clone(),
    );

    match controller.submit_record(record)? {
        Submitted::Invalid(result) => {
            for message in result.messages() {
                println!("- {message}");
            }
            return Ok(ExitCode::FAILURE);
        }
        Submitted::Preview(rows) => {
            for row in rows {
                println!("{}: {}", row.label, row.value);
            }
        }
    }

    if !yes && !ask("¿Enviar este brief? [s/N] ")? {
        controller.edit()?;
        println!("Envío cancelado; el borrador sigue guardado.");
        return Ok(ExitCode::SUCCESS);
    }

    let mark = status.mark();
    let outcome = controller.confirm().await?;
    for notice in status.since(mark) {
        println!("{notice}");
    }
    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn ask(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}

async fn probe(url: String) -> anyhow::Result<ExitCode> {
    let status = StatusBoard::new();
    let up = spawn_probe(Arc::new(HttpTransport::new(url)), status.clone()).await?;
    if let Some(notice) = status.latest() {
        println!("{notice}");
    }
    Ok(if up { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn draft(action: DraftAction, drafts: PathBuf) -> anyhow::Result<ExitCode> {
    let store = DraftStore::new(Arc::new(FileStorage::new(drafts)), StatusBoard::new());
    match action {
        DraftAction::Show => match store.load() {
            Some(record) => println!("{}", to_json(&record)?),
            None => println!("No hay borrador guardado."),
        },
        DraftAction::Clear => {
            store.clear();
            println!("Borrador eliminado.");
        }
    }
    Ok(ExitCode::SUCCESS)
}
