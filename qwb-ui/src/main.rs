//! qwb-ui - Questionnaire workbench command-line client
//!
//! Drives the questionnaire workflow (suggest, curate, approve, import)
//! against a running questionnaire API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use uuid::Uuid;

use qwb_common::api::types::RegisterRequest;
use qwb_common::api::{ColumnRole, QuestionnaireStatus, ResponseStatus};
use qwb_common::config::{load_config, ApiSettings};
use qwb_common::events::EventBus;
use qwb_ui::citation::{resolve_citation, Citation, CitationKind};
use qwb_ui::column_mapping::{parse_role, role_label, MappingSession};
use qwb_ui::confirm::{Confirm, FixedAnswer, StdinConfirm};
use qwb_ui::ask::ask;
use qwb_ui::client::PARSED_JSON_ARTIFACT;
use qwb_ui::documents::{
    describe_version, list_documents, register_document, DocumentTab, DocumentView,
    FileFingerprint, DEFAULT_MIME_TYPE,
};
use qwb_ui::items::{truncate_question, SourceLocation};
use qwb_ui::list::QuestionnaireList;
use qwb_ui::orchestrator::{Orchestrator, SuggestionOutcome};
use qwb_ui::response_state::ItemStateExt;
use qwb_ui::{AppState, HttpApiClient, QuestionnaireApi, UiError};

/// Command-line arguments for qwb-ui
#[derive(Parser, Debug)]
#[command(name = "qwb-ui")]
#[command(about = "Questionnaire workbench client")]
#[command(version)]
struct Args {
    /// Config file (default: QWB_CONFIG, then ~/.config/qwb/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and print the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        tenant: String,
    },
    /// Create a tenant and its first user, then print the session token
    Register {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the signed-in user
    Whoami,
    /// Ask the retrieval service a free-standing question
    Ask { question: String },
    /// List questionnaires
    List {
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a questionnaire's items and progress
    Show { questionnaire: Uuid },
    /// Request an answer suggestion for one item
    Suggest { questionnaire: Uuid, item: usize },
    /// Resolve a knowledge-base citation
    Cite { chunk_id: String },
    /// Save an item's answer
    Save {
        questionnaire: Uuid,
        item: usize,
        #[arg(long)]
        answer: String,
        #[arg(long)]
        explanation: Option<String>,
        #[arg(long, value_enum, default_value = "draft")]
        status: SaveStatus,
    },
    /// Preview an uploaded spreadsheet
    Preview {
        questionnaire: Uuid,
        #[arg(long)]
        object_key: String,
    },
    /// Import spreadsheet columns (e.g. --column 0=question --column 1=answer)
    Map {
        questionnaire: Uuid,
        #[arg(long)]
        object_key: String,
        #[arg(long = "column", value_parser = parse_column)]
        columns: Vec<(usize, ColumnRole)>,
    },
    /// Complete a questionnaire
    Complete {
        questionnaire: Uuid,
        /// Import approved answers to the answer library without asking
        #[arg(long, conflicts_with = "no")]
        yes: bool,
        /// Do not import approved answers
        #[arg(long)]
        no: bool,
    },
    /// List approved answers awaiting import
    Pending,
    /// Import pending answers into the answer library
    ImportPending {
        /// Response ids to leave out
        #[arg(long)]
        exclude: Vec<Uuid>,
    },
    /// Work with uploaded documents
    Documents {
        #[command(subcommand)]
        action: DocumentsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DocumentsCommand {
    /// List documents
    List,
    /// Show a document's parsed content
    Open { document: Uuid },
    /// Register a local file and print where to upload it
    Create {
        #[arg(long)]
        title: String,
        /// POLICY, QUESTIONNAIRE or OTHER
        #[arg(long = "type", default_value = "POLICY")]
        document_type: String,
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_MIME_TYPE)]
        mime_type: String,
    },
    /// Mark a version's upload finished so processing starts
    Complete { version: Uuid },
    /// Show a document version and its artifacts
    Version { version: Uuid },
    /// Print a download URL for the original file
    Preview { version: Uuid },
    /// Print a download URL for one artifact
    ArtifactUrl {
        version: Uuid,
        #[arg(long, default_value = PARSED_JSON_ARTIFACT)]
        kind: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusFilter {
    InProgress,
    Approved,
    Completed,
}

impl From<StatusFilter> for QuestionnaireStatus {
    fn from(value: StatusFilter) -> Self {
        match value {
            StatusFilter::InProgress => QuestionnaireStatus::InProgress,
            StatusFilter::Approved => QuestionnaireStatus::Approved,
            StatusFilter::Completed => QuestionnaireStatus::Completed,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SaveStatus {
    Draft,
    NeedsReview,
    Approved,
}

impl From<SaveStatus> for ResponseStatus {
    fn from(value: SaveStatus) -> Self {
        match value {
            SaveStatus::Draft => ResponseStatus::Draft,
            SaveStatus::NeedsReview => ResponseStatus::NeedsReview,
            SaveStatus::Approved => ResponseStatus::Approved,
        }
    }
}

/// Keep the typed error as the cause beneath its banner text
fn failed(e: UiError) -> anyhow::Error {
    let banner = e.banner();
    anyhow::Error::new(e).context(banner)
}

fn parse_column(arg: &str) -> Result<(usize, ColumnRole), String> {
    let (index, role) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=ROLE, got '{arg}'"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid column index '{index}': {e}"))?;
    let role = parse_role(role).ok_or_else(|| format!("unknown column role '{role}'"))?;
    Ok((index, role))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = ApiSettings::resolve(args.api_url.as_deref(), args.token.as_deref(), &config);
    info!(base_url = %settings.base_url, "Using questionnaire API");

    let client = HttpApiClient::new(&settings).context("Failed to create API client")?;
    let state = AppState::new(Arc::new(client), EventBus::default());

    if let Err(e) = run(args.command, &state).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(command: Command, state: &AppState) -> Result<()> {
    let api = state.api.as_ref();

    match command {
        Command::Login {
            email,
            password,
            tenant,
        } => {
            let session = api
                .login(&email, &password, &tenant)
                .await
                .map_err(failed)
                .context("Login failed")?;
            println!("{}", session.token);
            eprintln!("Export QWB_API_TOKEN with this token for subsequent commands.");
        }

        Command::Register {
            tenant,
            name,
            email,
            password,
        } => {
            let request = RegisterRequest {
                tenant_slug: tenant,
                name,
                email,
                password,
            };
            let session = api
                .register(&request)
                .await
                .map_err(failed)
                .context("Registration failed")?;
            println!("{}", session.token);
            eprintln!("Export QWB_API_TOKEN with this token for subsequent commands.");
        }

        Command::Whoami => {
            let me = api.me().await.map_err(failed)?;
            match me.name.as_deref() {
                Some(name) => println!("{name} <{}>", me.email),
                None => println!("{}", me.email),
            }
            if let Some(tenant) = me.tenant_id {
                println!("Tenant: {tenant}");
            }
        }

        Command::Ask { question } => {
            let answer = ask(api, &question)
                .await
                .map_err(failed)
                .context("Question failed")?;
            println!("{}", answer.record.answer_text);
            println!();
            print!("Confidence: {}%", answer.confidence_percent());
            if answer.insufficient_evidence() {
                print!("  (insufficient evidence)");
            }
            println!();
            for citation in answer.citations() {
                println!("  {}  {}", citation.label, citation.id);
            }
        }

        Command::List { status, search } => {
            let mut list = QuestionnaireList::new(state.api.clone(), state.event_bus.clone());
            list.status_filter = status.map(Into::into);
            list.search = search.unwrap_or_default();
            list.refresh()
                .await
                .map_err(failed)
                .context("Failed to load questionnaires")?;

            for q in list.visible() {
                println!(
                    "{}  {:<12} {:>5.1}%  {}",
                    q.id,
                    q.status.as_str(),
                    q.progress_percent,
                    q.name
                );
            }
            println!("Pending answers: {}", list.pending_count());
        }

        Command::Show { questionnaire } => {
            let orchestrator = open(state, questionnaire).await?;
            let session = orchestrator.snapshot().await;
            if let Some(summary) = session.summary() {
                println!("{} ({})", summary.name, summary.status.as_str());
            }
            for (index, item) in session.items().iter().enumerate() {
                let location = SourceLocation::of(item)
                    .map(|l| l.describe())
                    .filter(|d| !d.is_empty())
                    .map(|d| format!("  [{d}]"))
                    .unwrap_or_default();
                println!(
                    "{:>4}  {:<12} {}{}",
                    index,
                    item.current_state.label(),
                    truncate_question(&item.question_text),
                    location
                );
            }
            println!("{}", session.progress().render());
        }

        Command::Suggest {
            questionnaire,
            item,
        } => {
            let orchestrator = open(state, questionnaire).await?;
            orchestrator
                .select_item(item)
                .await
                .map_err(failed)?;
            let outcome = orchestrator
                .request_suggestion()
                .await
                .map_err(failed)
                .context("Suggestion failed")?;
            if outcome != SuggestionOutcome::Applied {
                return Ok(());
            }

            let session = orchestrator.snapshot().await;
            if let Some(suggestion) = session.suggestion() {
                println!("{}", suggestion.record.answer_text);
                println!();
                print!("Confidence: {}%", suggestion.confidence_percent());
                if suggestion.insufficient_evidence() {
                    print!("  (insufficient evidence)");
                }
                println!();
                for citation in suggestion.citations() {
                    println!("  {}  {}", citation.label, citation.id);
                }
            }
        }

        Command::Cite { chunk_id } => {
            let citation = Citation {
                kind: CitationKind::KbChunk,
                id: chunk_id,
                label: "Chunk 1".to_string(),
            };
            println!("{}", resolve_citation(api, &citation).await.render());
        }

        Command::Save {
            questionnaire,
            item,
            answer,
            explanation,
            status,
        } => {
            let orchestrator = open(state, questionnaire).await?;
            orchestrator
                .select_item(item)
                .await
                .map_err(failed)?;
            orchestrator.set_answer_text(answer).await;
            orchestrator
                .set_explanation(explanation.unwrap_or_default())
                .await;
            let transition = orchestrator
                .save(status.into())
                .await
                .map_err(failed)
                .context("Save failed")?;
            println!(
                "{} -> {}",
                transition.old_state.label(),
                transition.new_state.label()
            );
        }

        Command::Preview {
            questionnaire,
            object_key,
        } => {
            let session = MappingSession::load(api, questionnaire, &object_key)
                .await
                .map_err(failed)
                .context("Preview failed")?;
            println!("{}", session.preview.columns.join("\t"));
            for row in &session.preview.rows {
                println!("{}", row.join("\t"));
            }
        }

        Command::Map {
            questionnaire,
            object_key,
            columns,
        } => {
            let mut session = MappingSession::load(api, questionnaire, &object_key)
                .await
                .map_err(failed)
                .context("Preview failed")?;
            for (index, role) in columns {
                session.set_role(index, role)?;
            }
            for (name, role) in session.preview.columns.iter().zip(session.mapping.roles()) {
                println!("{:<24} {}", name, role_label(*role));
            }
            let created = session
                .submit(api, &state.event_bus)
                .await
                .map_err(failed)
                .context("Import failed")?;
            println!("Imported {created} item(s)");
        }

        Command::Complete {
            questionnaire,
            yes,
            no,
        } => {
            let confirm: Arc<dyn Confirm> = if yes || no {
                Arc::new(FixedAnswer(yes))
            } else {
                Arc::new(StdinConfirm)
            };
            let orchestrator = open_with(state, questionnaire, confirm).await?;
            let eligible = orchestrator.snapshot().await.progress().eligible_for_library;
            println!("{eligible} approved answer(s) eligible for the answer library");
            let imported = orchestrator
                .complete()
                .await
                .map_err(failed)
                .context("Completion failed")?;
            if imported {
                println!("Questionnaire completed; approved answers queued for the answer library");
            } else {
                println!("Questionnaire completed");
            }
        }

        Command::Pending => {
            let list = QuestionnaireList::new(state.api.clone(), state.event_bus.clone());
            let review = list
                .review_pending()
                .await
                .map_err(failed)?;
            for answer in review.answers() {
                println!(
                    "{}  [{}] {}",
                    answer.response_id,
                    answer.questionnaire_name,
                    truncate_question(&answer.question_text)
                );
                println!("      {}", answer.answer_text);
            }
            println!("{} pending", review.answers().len());
        }

        Command::ImportPending { exclude } => {
            let mut list = QuestionnaireList::new(state.api.clone(), state.event_bus.clone());
            let mut review = list
                .review_pending()
                .await
                .map_err(failed)?;
            for id in exclude {
                if review.is_selected(id) {
                    review.toggle(id);
                }
            }
            if !review.can_import() {
                println!("Nothing to import");
                return Ok(());
            }
            info!("{}", review.import_caption());
            let outcome = list
                .import_reviewed(&mut review)
                .await
                .map_err(failed)
                .context("Import failed")?;
            println!(
                "Imported {} of {} answer(s); {} still pending",
                outcome.imported,
                outcome.requested,
                list.pending_count()
            );
        }

        Command::Documents { action } => documents(api, action).await?,
    }

    Ok(())
}

async fn documents(api: &dyn QuestionnaireApi, action: DocumentsCommand) -> Result<()> {
    match action {
        DocumentsCommand::List => {
            for doc in list_documents(api).await.map_err(failed)? {
                println!(
                    "{}  {:<10} {}",
                    doc.id,
                    doc.latest_version_status.as_deref().unwrap_or("-"),
                    doc.title
                );
            }
        }

        DocumentsCommand::Open { document } => {
            let documents = list_documents(api).await.map_err(failed)?;
            let doc = documents
                .iter()
                .find(|d| d.id == document)
                .ok_or_else(|| anyhow!("Document {document} not found"))?;
            let mut view = DocumentView::open(api, doc).await.map_err(failed)?;
            let tabs = view.tabs();
            for (i, caption) in tabs.iter().enumerate() {
                let tab = if i == 0 {
                    DocumentTab::Content
                } else {
                    DocumentTab::Table(i - 1)
                };
                view.select_tab(tab);
                println!("== {caption} ==");
                println!("{}", view.render());
            }
        }

        DocumentsCommand::Create {
            title,
            document_type,
            file,
            mime_type,
        } => {
            let fingerprint = FileFingerprint::of(&file)
                .await
                .map_err(failed)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let pending = register_document(api, &title, &document_type, &fingerprint, &mime_type)
                .await
                .map_err(failed)
                .context("Document registration failed")?;
            println!("Document: {}", pending.document_id);
            println!("Version:  {}", pending.version.document_version_id);
            println!("Upload:   {}", pending.version.upload_url);
            eprintln!(
                "PUT the file to the upload URL, then run: qwb-ui documents complete {}",
                pending.version.document_version_id
            );
        }

        DocumentsCommand::Complete { version } => {
            let status = api
                .complete_upload(version)
                .await
                .map_err(failed)
                .context("Upload completion failed")?;
            println!("{version}  {status}");
        }

        DocumentsCommand::Version { version } => {
            let detail = api.get_document_version(version).await.map_err(failed)?;
            for line in describe_version(&detail) {
                println!("{line}");
            }
        }

        DocumentsCommand::Preview { version } => {
            println!("{}", api.get_preview_url(version).await.map_err(failed)?);
        }

        DocumentsCommand::ArtifactUrl { version, kind } => {
            println!("{}", api.get_artifact_url(version, &kind).await.map_err(failed)?);
        }
    }
    Ok(())
}

async fn open(state: &AppState, questionnaire: Uuid) -> Result<Orchestrator> {
    open_with(state, questionnaire, Arc::new(FixedAnswer(false))).await
}

async fn open_with(
    state: &AppState,
    questionnaire: Uuid,
    confirm: Arc<dyn Confirm>,
) -> Result<Orchestrator> {
    Orchestrator::open(state.api.clone(), confirm, state.event_bus.clone(), questionnaire)
        .await
        .map_err(failed)
        .with_context(|| format!("Failed to load questionnaire {questionnaire}"))
}
