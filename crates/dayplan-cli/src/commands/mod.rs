pub mod config;
pub mod occurrence;
pub mod plan;
pub mod recur;

use chrono::{Local, NaiveDate};
use dayplan_core::{parse_date, ClockTime, Config, ValidationError};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// `--owner` if given, otherwise the configured owner.
pub fn resolve_owner(explicit: Option<String>, config: &Config) -> String {
    explicit.unwrap_or_else(|| config.owner.clone())
}

/// Parse an optional `YYYY-MM-DD` argument, defaulting to today.
pub fn date_or_today(arg: Option<&str>) -> Result<NaiveDate, ValidationError> {
    match arg {
        Some(s) => parse_date(s),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn parse_time(arg: Option<&str>) -> Result<Option<ClockTime>, ValidationError> {
    arg.map(str::parse).transpose()
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
