//! Command-line front end over a JSON bill file.

pub mod commands;
pub mod registry;

use std::{io::IsTerminal, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use thiserror::Error;

use self::registry::CommandHandler;

use crate::{
    config::{Config, ConfigError, ConfigManager},
    core::{
        services::DueDateProjector,
        time::{Clock, SystemClock},
    },
    errors::{ScheduleError, StoreError},
    ledger::Bill,
    storage::{BillStore, JsonBillStore},
};

pub type CliResult = Result<(), CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("{0}")]
    Usage(String),
}

/// Everything a command handler needs, resolved once per invocation.
pub struct CliContext {
    pub config: Config,
    pub store: Arc<JsonBillStore>,
    pub today: NaiveDate,
}

impl CliContext {
    pub fn projector(&self) -> DueDateProjector {
        DueDateProjector::from_config(&self.config)
    }

    /// Finds a bill by name (case-insensitive) or id.
    pub fn find_bill(&self, needle: &str) -> Result<Bill, CliError> {
        self.store
            .fetch_all()?
            .into_iter()
            .find(|bill| bill.matches(needle))
            .ok_or_else(|| CliError::Usage(format!("no bill named `{needle}`")))
    }
}

/// Entry point used by the `bill_ledger_cli` binary.
pub fn run_cli() -> CliResult {
    run_with_args(std::env::args().skip(1).collect())
}

pub fn run_with_args(args: Vec<String>) -> CliResult {
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let mut positional = Vec::new();
    let mut today_override = None;
    let mut file_override = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--today" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--today requires a date".into()))?;
                today_override = Some(parse_date(&value)?);
            }
            "--file" => {
                let value = iter
                    .next()
                    .ok_or_else(|| CliError::Usage("--file requires a path".into()))?;
                file_override = Some(PathBuf::from(value));
            }
            _ => positional.push(arg),
        }
    }

    let registry = commands::registry();
    let Some((name, rest)) = positional.split_first() else {
        commands::print_help(&registry);
        return Ok(());
    };
    let entry = registry.resolve(name)?;

    match entry.handler {
        CommandHandler::Standalone(handler) => {
            tracing::debug!(command = entry.name, "dispatching command");
            handler(rest)
        }
        CommandHandler::WithContext(handler) => {
            let context = build_context(today_override, file_override)?;
            tracing::debug!(command = entry.name, today = %context.today, "dispatching command");
            handler(&context, rest)
        }
    }
}

fn build_context(
    today_override: Option<NaiveDate>,
    file_override: Option<PathBuf>,
) -> Result<CliContext, CliError> {
    let manager = ConfigManager::new_default()?;
    let config = manager.load()?;
    let path = file_override.unwrap_or_else(|| config.resolve_bills_path(manager.base_dir()));
    let store = Arc::new(JsonBillStore::new(path)?);
    let today = today_override.unwrap_or_else(|| SystemClock.today());
    Ok(CliContext {
        config,
        store,
        today,
    })
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::Usage(format!("`{value}` is not a YYYY-MM-DD date")))
}
