pub mod config;
pub mod core;
pub mod dashboard;
pub mod providers;
pub mod ui;

use crate::core::cache::Cache;
use crate::core::identity::Role;
use crate::core::records::RawRows;
use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Summary {
        mobile: String,
        role: Option<Role>,
        as_of: Option<String>,
    },
    Details {
        mobile: String,
        role: Option<Role>,
    },
    Tabs,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Mandi ledger starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    // One shared row cache so directory lookups and ledger fetches that hit
    // the same tab only reach the sheet once.
    let row_cache = Arc::new(Cache::<String, RawRows>::new());
    let gateway = providers::sheets::SheetsGateway::new(&config.gateway, Arc::clone(&row_cache));
    let directory =
        providers::directory::SheetDirectory::new(config.directory.clone(), &gateway);

    match command {
        AppCommand::Summary {
            mobile,
            role,
            as_of,
        } => {
            let as_of = resolve_as_of(as_of.as_deref())?;
            dashboard::run_summary(&config, &gateway, &directory, &mobile, role, as_of).await
        }
        AppCommand::Details { mobile, role } => {
            dashboard::run_details(&config, &gateway, &directory, &mobile, role).await
        }
        AppCommand::Tabs => dashboard::run_tabs(&config, &gateway).await,
    }
}

/// The as-of instant defaults to now; the engine itself never reads a clock.
/// An explicit date is anchored at midnight, so accruals come out in exact
/// whole days.
fn resolve_as_of(requested: Option<&str>) -> Result<DateTime<Utc>> {
    match requested {
        Some(text) => core::dates::parse_date(text)
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            .ok_or_else(|| anyhow!("Unrecognized as-of date: {text}")),
        None => Ok(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_resolve_as_of_accepts_ledger_date_formats() {
        let iso = resolve_as_of(Some("2025-06-14")).unwrap();
        let slashed = resolve_as_of(Some("6/14/25")).unwrap();
        assert_eq!(iso, slashed);
        assert_eq!(iso.day(), 14);
        assert_eq!(iso.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_resolve_as_of_rejects_garbage() {
        assert!(resolve_as_of(Some("whenever")).is_err());
    }

    #[test]
    fn test_resolve_as_of_defaults_to_now() {
        let before = Utc::now();
        let resolved = resolve_as_of(None).unwrap();
        assert!(resolved >= before);
    }
}
