//! Repodesk admin command line
//!
//! Lists, deletes, creates and updates repositories and bookings against the
//! repodesk REST API.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use async_trait::async_trait;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use repodesk_admin::{
    AdminContext, ApiClient, ApiError, BookingForm, CommitStatus, Confirm, ConfirmPrompt,
    DeleteOutcome, RecordForm, ResourceListController, SubmitOutcome, TracingNotifier,
};
use repodesk_core::{
    Booking, CompanyRepo, CompanyRepoDraft, Config, ListQuery, OrganisationRepo,
    OrganisationRepoDraft, Record, RecordDraft, ResourceKind, init_logging,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Command line interface for the repodesk admin client
#[derive(Parser)]
#[command(
    name = "repodesk",
    version = env!("CARGO_PKG_VERSION"),
    about = "Admin client for repositories and bookings"
)]
struct Cli {
    /// Configuration file path (defaults to ./repodesk.toml if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Show one page of a resource list
    List {
        /// org-repos, repos or bookings
        kind: ResourceKind,

        /// Page to show
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Free-text filter
        #[arg(short, long, default_value = "")]
        filter: String,
    },

    /// Delete a record
    Delete {
        /// org-repos, repos or bookings
        kind: ResourceKind,

        /// Record id
        id: u64,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show bookable slots for a date
    Slots {
        /// Date as YYYY-MM-DD
        date: NaiveDate,
    },

    /// Book an appointment
    Book {
        /// What the appointment is for
        #[arg(long)]
        reason: String,

        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        /// Slot time as HH:MM
        #[arg(long)]
        time: String,

        /// Name of the person booking
        #[arg(long)]
        name: String,

        /// Email of the person booking
        #[arg(long)]
        email: String,
    },

    /// Create a repository
    Create {
        /// org-repos or repos
        kind: ResourceKind,

        /// Field assignment, repeatable
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },

    /// Update a repository
    Update {
        /// org-repos or repos
        kind: ResourceKind,

        /// Record id
        id: u64,

        /// Field assignment, repeatable
        #[arg(short, long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
    },
}

/// Errors that end the command
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] repodesk_core::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    Failed(String),
}

type CliResult<T> = Result<T, CliError>;

/// Asks on the terminal
#[derive(Debug)]
struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let question = format!("{} {} [{}/N] ", prompt.title, prompt.text, prompt.confirm_label);
        tokio::task::spawn_blocking(move || {
            print!("{question}");
            let _ = std::io::stdout().flush();
            let mut answer = String::new();
            std::io::stdin().lock().read_line(&mut answer).is_ok()
                && matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

/// Confirms without asking, for `--yes`
#[derive(Debug)]
struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_logging(&config.logging)?;
    debug!(base_url = %config.api.base_url, "configuration loaded");

    let client = ApiClient::from_config(&config.api)?;
    let confirm: Arc<dyn Confirm> = match &cli.command {
        Commands::Delete { yes: true, .. } => Arc::new(AssumeYes),
        _ => Arc::new(StdinConfirm),
    };
    let ctx = AdminContext::new(Arc::new(client), Arc::new(TracingNotifier), confirm);

    match cli.command {
        Commands::List { kind, page, filter } => match kind {
            ResourceKind::OrganisationRepo => list::<OrganisationRepo>(ctx, page, filter).await,
            ResourceKind::CompanyRepo => list::<CompanyRepo>(ctx, page, filter).await,
            ResourceKind::Booking => list::<Booking>(ctx, page, filter).await,
        },
        Commands::Delete { kind, id, .. } => match kind {
            ResourceKind::OrganisationRepo => delete::<OrganisationRepo>(ctx, id).await,
            ResourceKind::CompanyRepo => delete::<CompanyRepo>(ctx, id).await,
            ResourceKind::Booking => delete::<Booking>(ctx, id).await,
        },
        Commands::Slots { date } => slots(ctx, date).await,
        Commands::Book {
            reason,
            date,
            time,
            name,
            email,
        } => book(ctx, &reason, date, &time, &name, &email).await,
        Commands::Create { kind, set } => match kind {
            ResourceKind::OrganisationRepo => {
                let form = RecordForm::<OrganisationRepoDraft>::create(ctx);
                submit(form, &set).await
            }
            ResourceKind::CompanyRepo => {
                let form = RecordForm::<CompanyRepoDraft>::create(ctx);
                submit(form, &set).await
            }
            ResourceKind::Booking => Err(CliError::Failed(
                "bookings are created with `repodesk book`".to_string(),
            )),
        },
        Commands::Update { kind, id, set } => match kind {
            ResourceKind::OrganisationRepo => {
                let record = find::<OrganisationRepo>(ctx.clone(), id).await?;
                let form = RecordForm::edit(ctx, id, OrganisationRepoDraft::from(&record))?;
                submit(form, &set).await
            }
            ResourceKind::CompanyRepo => {
                let record = find::<CompanyRepo>(ctx.clone(), id).await?;
                let form = RecordForm::edit(ctx, id, CompanyRepoDraft::from(&record))?;
                submit(form, &set).await
            }
            ResourceKind::Booking => Err(CliError::Failed(
                "bookings cannot be edited".to_string(),
            )),
        },
    }
}

fn print_page<T: Record>(list: &ResourceListController<T>) {
    for item in list.items() {
        println!("{:>6}  {}", item.id(), item.summary());
    }
    if list.items().is_empty() {
        println!("No {} found.", list.kind().plural());
    }
    let page = list.pagination();
    println!("Page {} of {}", page.current_page, page.last_page);
}

async fn list<T: Record>(ctx: AdminContext, page: u32, filter: String) -> CliResult<()> {
    let mut list = ResourceListController::<T>::new(ctx);

    let query = ListQuery::default().with_filter(filter).with_page(page.max(1));
    let pending = list.mount_at(query);
    list.settle(pending).await;
    if list.query().page != page {
        info!(page, last_page = list.pagination().last_page, "page out of range");
    }

    if let Some(error) = list.error() {
        return Err(CliError::Failed(error.to_string()));
    }
    print_page(&list);
    Ok(())
}

async fn delete<T: Record>(ctx: AdminContext, id: u64) -> CliResult<()> {
    let mut list = ResourceListController::<T>::new(ctx);

    match list.delete(id).await {
        DeleteOutcome::Cancelled => {
            println!("Cancelled.");
            Ok(())
        }
        DeleteOutcome::Deleted(pending) => {
            if list.settle(pending).await == CommitStatus::Applied {
                print_page(&list);
            }
            Ok(())
        }
        DeleteOutcome::Failed => Err(CliError::Failed(format!(
            "could not delete {} {id}",
            kind_name(T::KIND)
        ))),
    }
}

fn kind_name(kind: ResourceKind) -> String {
    kind.singular().to_lowercase()
}

/// Walk the list until the record with `id` turns up
async fn find<T: Record>(ctx: AdminContext, id: u64) -> CliResult<T> {
    let mut list = ResourceListController::<T>::new(ctx);
    let mut pending = Some(list.mount());

    while let Some(next) = pending.take() {
        list.settle(next).await;
        if let Some(error) = list.error() {
            return Err(CliError::Failed(error.to_string()));
        }
        if let Some(record) = list.items().iter().find(|item| item.id() == id) {
            return Ok(record.clone());
        }
        let current = list.pagination().current_page;
        pending = list.go_to_page(current.saturating_add(1));
    }

    Err(CliError::Failed(format!("{} {id} not found", kind_name(T::KIND))))
}

fn parse_assignment(raw: &str) -> CliResult<(&str, &str)> {
    raw.split_once('=')
        .map(|(field, value)| (field.trim(), value))
        .ok_or_else(|| CliError::Failed(format!("expected FIELD=VALUE, got '{raw}'")))
}

async fn submit<D: RecordDraft>(mut form: RecordForm<D>, assignments: &[String]) -> CliResult<()> {
    for raw in assignments {
        let (field, value) = parse_assignment(raw)?;
        form.set_field(field, value)?;
    }

    match form.submit().await {
        SubmitOutcome::Saved(_) => Ok(()),
        SubmitOutcome::Invalid => {
            for (field, message) in form.field_errors() {
                eprintln!("{field}: {message}");
            }
            Err(CliError::Failed("the draft was rejected".to_string()))
        }
        SubmitOutcome::Failed => Err(CliError::Failed("the draft was not saved".to_string())),
    }
}

async fn slots(ctx: AdminContext, date: NaiveDate) -> CliResult<()> {
    let mut controller = repodesk_admin::SlotAvailabilityController::new(ctx);

    if let Some(pending) = controller.set_date(Some(date)) {
        controller.settle(pending).await;
    }
    if let Some(error) = controller.error() {
        return Err(CliError::Failed(error.to_string()));
    }

    for slot in controller.slots() {
        let state = if slot.available { "available" } else { "taken" };
        println!("{}  {state}", slot.time);
    }
    Ok(())
}

async fn book(
    ctx: AdminContext,
    reason: &str,
    date: NaiveDate,
    time: &str,
    name: &str,
    email: &str,
) -> CliResult<()> {
    let mut form = BookingForm::new(ctx);
    form.set_field("appointment_for", reason)?;
    form.set_field("booker_name", name)?;
    form.set_field("booker_email", email)?;

    if let Some(pending) = form.set_date(Some(date)) {
        form.settle_slots(pending).await;
    }
    form.select_time(time)
        .map_err(|rejection| CliError::Failed(rejection.to_string()))?;

    match form.submit().await {
        SubmitOutcome::Saved(_) => Ok(()),
        SubmitOutcome::Invalid => {
            for (field, message) in form.field_errors() {
                eprintln!("{field}: {message}");
            }
            Err(CliError::Failed("the booking was rejected".to_string()))
        }
        SubmitOutcome::Failed => Err(CliError::Failed("the booking was not saved".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("name=alpha=beta").ok(),
            Some(("name", "alpha=beta"))
        );
        assert!(parse_assignment("name").is_err());
    }

    #[test]
    fn test_cli_parses_list() {
        let cli = Cli::try_parse_from(["repodesk", "list", "org-repos", "--page", "2"]);

        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::List {
                kind: ResourceKind::OrganisationRepo,
                page: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["repodesk", "list", "users"]).is_err());
    }
}
