use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use forms::{
    FormConfig, FormController, FormEntity, FormFields, FormMode, Gateway, MemoryGateway,
    SubmitOutcome, TracingNotifier,
};
use serde::Serialize;
use shared::{
    domain::{Aspirant, Period, Professor},
    error::{ApiError, ErrorCode},
    protocol::SaveMode,
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url};

#[derive(Parser, Debug)]
#[command(name = "admin", about = "Register periods, professors and aspirants")]
struct Cli {
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long, default_value = "admin.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill a form from a JSON object and submit it.
    Submit {
        entity: EntityKind,
        #[arg(long)]
        file: PathBuf,
        /// Key of a stored record to edit instead of creating a new one.
        #[arg(long)]
        edit: Option<String>,
        /// Submit against an in-memory gateway; nothing is written. Without
        /// `--edit` the database is not opened at all.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a JSON object without submitting it.
    Check {
        entity: EntityKind,
        #[arg(long)]
        file: PathBuf,
    },
    List {
        entity: EntityKind,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum EntityKind {
    Period,
    Professor,
    Aspirant,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.config);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let database_url =
        normalize_database_url(cli.database_url.as_deref().unwrap_or(&settings.database_url));

    match cli.command {
        Command::Check { entity, file } => {
            let fields = read_fields(&file)?;
            match entity {
                EntityKind::Period => check::<Period>(&fields),
                EntityKind::Professor => check::<Professor>(&fields),
                EntityKind::Aspirant => check::<Aspirant>(&fields),
            }
        }
        Command::List { entity } => {
            let storage = Storage::new(&database_url).await?;
            match entity {
                EntityKind::Period => print_lines(&storage.list_periods().await?),
                EntityKind::Professor => print_lines(&storage.list_professors().await?),
                EntityKind::Aspirant => print_lines(&storage.list_aspirants().await?),
            }
        }
        Command::Submit {
            entity,
            file,
            edit,
            dry_run,
        } => {
            let fields = read_fields(&file)?;
            info!(?entity, edit = edit.as_deref(), dry_run, "submitting form");
            run_submit(&database_url, entity, fields, edit.as_deref(), dry_run).await
        }
    }
}

/// Opens storage only when the submission needs it: a real save, or an edit
/// that has to load the stored record first.
async fn run_submit(
    database_url: &str,
    entity: EntityKind,
    fields: FormFields,
    edit: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let storage = match (dry_run, edit) {
        (true, None) => None,
        _ => Some(Storage::new(database_url).await?),
    };

    match entity {
        EntityKind::Period => {
            let existing = match (&storage, edit) {
                (Some(storage), Some(code)) => Some(Period::from(
                    storage
                        .get_period(code)
                        .await?
                        .with_context(|| format!("no period with code '{code}'"))?,
                )),
                _ => None,
            };
            submit(storage.as_ref(), existing, fields, dry_run).await
        }
        EntityKind::Professor => {
            let existing = match (&storage, edit) {
                (Some(storage), Some(national_id)) => Some(Professor::from(
                    storage.get_professor(national_id).await?.with_context(|| {
                        format!("no professor with national id '{national_id}'")
                    })?,
                )),
                _ => None,
            };
            submit(storage.as_ref(), existing, fields, dry_run).await
        }
        EntityKind::Aspirant => {
            let existing = match (&storage, edit) {
                (Some(storage), Some(national_id)) => Some(Aspirant::from(
                    storage.get_aspirant(national_id).await?.with_context(|| {
                        format!("no aspirant with national id '{national_id}'")
                    })?,
                )),
                _ => None,
            };
            submit(storage.as_ref(), existing, fields, dry_run).await
        }
    }
}

fn read_fields(path: &Path) -> Result<FormFields> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read field file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON object of fields", path.display()))
}

fn print_lines<T: Serialize>(records: &[T]) -> Result<()> {
    for record in records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

fn check<E: FormEntity>(fields: &FormFields) -> Result<()> {
    match forms::validate::<E>(fields) {
        Ok(_) => {
            println!("{}", serde_json::json!({ "status": "valid" }));
            Ok(())
        }
        Err(errors) => {
            let error = ApiError::new(ErrorCode::Validation, errors.to_string());
            println!(
                "{}",
                serde_json::json!({ "status": "invalid", "error": error, "violations": errors })
            );
            bail!("{} failed validation: {errors}", E::KIND)
        }
    }
}

async fn submit<E>(
    storage: Option<&Storage>,
    existing: Option<E>,
    fields: FormFields,
    dry_run: bool,
) -> Result<()>
where
    E: FormEntity,
    E::Record: Serialize,
    Storage: Gateway<E>,
{
    let gateway: Arc<dyn Gateway<E>> = match storage.filter(|_| !dry_run) {
        Some(storage) => Arc::new(storage.clone()),
        None => {
            let memory = MemoryGateway::<E>::new();
            if let Some(existing) = &existing {
                memory.save(existing.to_record(), SaveMode::Create).await?;
            }
            Arc::new(memory)
        }
    };

    let mode = existing.map_or(FormMode::Create, FormMode::Edit);
    let save_mode = mode.save_mode();
    let controller = FormController::new(
        FormConfig::new(mode).on_submit(|entity: &E| info!(kind = E::KIND, ?entity, "form submitted")),
        gateway,
        Arc::new(TracingNotifier),
    );
    controller.merge_fields(fields).await?;

    let outcome = controller.submit().await;
    println!("{}", submit_report(&outcome, save_mode));
    match outcome.api_error(save_mode) {
        None => Ok(()),
        Some(err) => bail!("{} not saved ({:?}): {}", E::KIND, err.code, err.message),
    }
}

/// JSON line printed for a submission: the stored record, or the error with any
/// field violations.
fn submit_report<E>(outcome: &SubmitOutcome<E>, mode: SaveMode) -> serde_json::Value
where
    E: FormEntity,
    E::Record: Serialize,
{
    match (outcome, outcome.api_error(mode)) {
        (SubmitOutcome::Saved { entity, id }, _) => serde_json::json!({
            "status": "saved",
            "id": id,
            "record": entity.to_record(),
        }),
        (SubmitOutcome::Invalid(errors), Some(error)) => serde_json::json!({
            "status": "invalid",
            "error": error,
            "violations": errors,
        }),
        (_, error) => serde_json::json!({
            "status": "not_saved",
            "error": error,
        }),
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
