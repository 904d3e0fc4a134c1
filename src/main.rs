//! govctl
//!
//! Command-line front end for the evidence console backend.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use evidence_console::api::{HttpBackend, UploadFile};
use evidence_console::evidence::{resolve_next_version, EvidenceGroup, EvidenceVersion, VersionDraft};
use evidence_console::lifecycle::{Decision, ItemActions, EVIDENCE_BUCKET};
use evidence_console::notify::{run_action, NoticeLevel};
use evidence_console::services::{EvidenceQuery, EvidenceService, KnowledgeService, NewEvidence};
use evidence_console::utils::{init_logging, text::pad_cell};
use evidence_console::{ConfigManager, ConsoleConfig};

// ──────────────────────────────────────────────────────────────────────────────
// ARGUMENTS
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "govctl", version, about = "Evidence and knowledge review from the terminal")]
struct Cli {
    /// Config file; created with defaults when missing
    #[arg(long, global = true, default_value = "evidence_console.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the next evidence version offline
    ResolveVersion {
        #[arg(long)]
        latest: String,
        #[arg(long = "previous", num_args = 1..)]
        previous: Vec<String>,
        #[arg(long = "new", num_args = 1..)]
        new: Vec<String>,
    },
    #[command(subcommand)]
    Evidence(EvidenceCommand),
    #[command(subcommand)]
    Knowledge(KnowledgeCommand),
}

#[derive(Subcommand, Debug)]
enum EvidenceCommand {
    List {
        #[arg(long)]
        control_id: Option<String>,
        #[arg(long)]
        keywords: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Upload {
        #[arg(long)]
        concept: String,
        #[arg(long)]
        control_id: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        collected_by: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    NewVersion(NewVersionArgs),
    Decide {
        #[arg(long)]
        doc_id: String,
        #[arg(long)]
        control_id: String,
        #[arg(long, conflicts_with = "reject", required_unless_present = "reject")]
        approve: bool,
        #[arg(long)]
        reject: bool,
        #[arg(long)]
        comment: String,
    },
}

#[derive(Args, Debug)]
struct NewVersionArgs {
    /// doc id of the latest version
    #[arg(long)]
    parent: String,
    #[arg(long)]
    concept: String,
    #[arg(long)]
    control_id: String,
    #[arg(long)]
    latest: String,
    #[arg(long = "previous", num_args = 1..)]
    previous: Vec<String>,
    /// Manual override; must be MAJOR.MINOR.PATCH
    #[arg(long)]
    version: Option<String>,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum KnowledgeCommand {
    Collections,
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config)
        .load()
        .await
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.apply_env()?;
    init_logging(Some(&config.log_filter))?;
    config.validate()?;
    debug!("Using backend {}", config.api_base_url);

    match cli.command {
        Command::ResolveVersion { latest, previous, new } => {
            let resolution = resolve_next_version(&latest, previous.as_slice(), new.as_slice());
            println!("{}", resolution.version);
            println!("{}", resolution.reason);
            Ok(())
        }
        Command::Evidence(cmd) => run_evidence(&config, cmd).await,
        Command::Knowledge(KnowledgeCommand::Collections) => {
            let backend = Arc::new(HttpBackend::from_config(&config));
            let service = KnowledgeService::new(backend.clone(), backend);
            let outcome = run_action("knowledge.collections", "Collections loaded", service.collections()).await;
            let collections = report(outcome.value, &outcome.notice)?;
            for c in collections {
                println!("{} {} ({} documents)", pad_cell(&c.id, 12), pad_cell(&c.name, 32), c.documents.len());
            }
            Ok(())
        }
    }
}

async fn run_evidence(config: &ConsoleConfig, cmd: EvidenceCommand) -> Result<()> {
    let backend = Arc::new(HttpBackend::from_config(config));
    let service = EvidenceService::new(backend.clone(), backend);
    let perms = &config.permissions;

    match cmd {
        EvidenceCommand::List { control_id, keywords, page } => {
            let query = EvidenceQuery { page, limit: config.page_size, control_id, keywords };
            let outcome = run_action("evidence.list", "Evidence loaded", service.list(&query)).await;
            let page = report(outcome.value, &outcome.notice)?;
            for group in &page.items {
                let Some(summary) = group.summary() else { continue };
                let actions = ItemActions::for_status(summary.status, perms, EVIDENCE_BUCKET);
                println!(
                    "{} {} {} {} {:>3} {} {}",
                    pad_cell(&summary.name, 28),
                    pad_cell(&summary.control_id, 12),
                    pad_cell(&summary.latest_version, 8),
                    pad_cell(&summary.status.to_string(), 9),
                    summary.version_count,
                    if actions.review { "review" } else { "" },
                    if group.can_add_version(perms) { "+version" } else { "" }
                );
            }
            println!("page {} of {} item(s)", page.page, page.total);
        }
        EvidenceCommand::Upload { concept, control_id, description, collected_by, files } => {
            let files = read_files(&files).await?;
            let evidence = NewEvidence {
                name: concept,
                control_id,
                description,
                is_sensitive: false,
                recurrence: None,
                collected_by,
            };
            let outcome = run_action("evidence.create", "Evidence uploaded", service.create(perms, &evidence, &files)).await;
            let doc_id = report(outcome.value, &outcome.notice)?;
            println!("{}", doc_id);
        }
        EvidenceCommand::NewVersion(args) => {
            // Unparseable --latest falls back to 1.0.0 in the resolver.
            let parent = EvidenceVersion::new(args.parent, args.latest, args.previous);
            let group = EvidenceGroup::from_first(args.concept, args.control_id, parent);

            let mut draft: VersionDraft = group.open_version_draft();
            if let Some(ref version) = args.version {
                draft.override_version(version)?;
            }
            let files = read_files(&args.files).await?;
            let outcome = run_action(
                "evidence.create_version",
                "New version uploaded",
                service.create_version(perms, &group, &draft, &args.description, &files),
            )
            .await;
            let doc_id = report(outcome.value, &outcome.notice)?;
            println!("{}", doc_id);
        }
        EvidenceCommand::Decide { doc_id, control_id, approve, reject: _, comment } => {
            let decision = if approve { Decision::Approve } else { Decision::Reject };
            let outcome = run_action(
                "evidence.decide",
                "Decision recorded",
                service.decide_by_id(perms, &control_id, &doc_id, decision, &comment),
            )
            .await;
            let status = report(outcome.value, &outcome.notice)?;
            info!("{} -> {}", doc_id, status);
        }
    }
    Ok(())
}

async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(UploadFile::from_path(path).await?);
    }
    Ok(files)
}

/// Prints the notice and turns a failed action into a non-zero exit.
fn report<T>(value: Option<T>, notice: &evidence_console::notify::Notice) -> Result<T> {
    match (value, notice.level) {
        (Some(v), _) => {
            eprintln!("✓ {}", notice.message);
            Ok(v)
        }
        (None, NoticeLevel::Warning) => bail!("⚠ {}", notice.message),
        (None, _) => match notice.field {
            Some(ref field) => bail!("✗ {}: {}", field, notice.message),
            None => bail!("✗ {}", notice.message),
        },
    }
}
