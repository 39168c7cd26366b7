//! Recurring definition commands for CLI.

use clap::Subcommand;
use dayplan_core::{
    format_date, parse_date, Config, Priority, RecurrenceEngine, RecurrenceRule, RecurringDefinition, ScheduleDb,
};

use super::{date_or_today, parse_time, print_json, resolve_owner, CommandResult};

#[derive(Subcommand)]
pub enum RecurAction {
    /// Create a recurring definition
    Add {
        /// Title copied onto each occurrence
        title: String,
        /// daily, weekly:<0-6,...> (0 = Sunday), monthly:<1-31> or yearly
        #[arg(long)]
        rule: String,
        /// Time of day (HH:MM)
        #[arg(long)]
        time: Option<String>,
        #[arg(long, default_value = "")]
        category: String,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Last date (inclusive) to generate for (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
    },
    /// List definitions
    List {
        /// Include deactivated definitions
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Stop generating occurrences for a definition
    Deactivate {
        /// Definition ID
        id: String,
    },
    /// Generate the occurrences due on a date
    Generate {
        /// Target date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the dates a definition will fire on
    Preview {
        /// Definition ID
        id: String,
        /// First date (YYYY-MM-DD, default: today)
        #[arg(long)]
        from: Option<String>,
        /// Number of days (default: `recurrence.preview_days` from config)
        #[arg(long)]
        days: Option<u32>,
    },
}

pub fn run(action: RecurAction, owner: Option<String>) -> CommandResult {
    let config = Config::load()?;
    let owner = resolve_owner(owner, &config);
    let mut db = ScheduleDb::open()?;
    let engine = RecurrenceEngine::new();

    match action {
        RecurAction::Add {
            title,
            rule,
            time,
            category,
            priority,
            end_date,
        } => {
            let rule: RecurrenceRule = rule.parse()?;
            let priority: Priority = priority.parse()?;
            let mut definition = RecurringDefinition::new(owner, title, rule)
                .with_category(category)
                .with_priority(priority);
            if let Some(time) = parse_time(time.as_deref())? {
                definition = definition.with_time(time);
            }
            if let Some(end) = end_date.as_deref() {
                definition = definition.with_end_date(parse_date(end)?);
            }
            db.insert_definition(&definition)?;
            println!("Definition created: {}", definition.id);
            print_json(&definition)?;
        }
        RecurAction::List { all, json } => {
            let definitions = db.list_definitions(&owner, all)?;
            if json {
                return print_json(&definitions);
            }
            if definitions.is_empty() {
                println!("No recurring definitions.");
            }
            for def in &definitions {
                let time = def.time.map(|t| t.to_string()).unwrap_or_else(|| "--:--".into());
                let status = if def.is_active { "" } else { " (inactive)" };
                println!("{}  {}  {:<16} {}{}", def.id, time, def.rule.to_string(), def.title, status);
            }
        }
        RecurAction::Deactivate { id } => {
            db.deactivate_definition(&id)?;
            println!("Definition deactivated: {id}");
        }
        RecurAction::Generate { date } => {
            let date = date_or_today(date.as_deref())?;
            let report = engine.generate_for_owner(&mut db, &owner, date)?;
            println!("{} occurrence(s) generated for {}", report.count(), format_date(date));
            for occurrence in &report.created {
                println!("  + {}", occurrence.title);
            }
            for failure in &report.failures {
                eprintln!("  ! {} ({}): {}", failure.title, failure.definition_id, failure.message);
            }
        }
        RecurAction::Preview { id, from, days } => {
            let definition = db.get_definition(&id)?;
            let from = date_or_today(from.as_deref())?;
            let days = days.unwrap_or(config.recurrence.preview_days);
            let dates = engine.upcoming(&definition, from, days);
            if dates.is_empty() {
                println!("No occurrences in the next {days} day(s).");
            }
            for date in dates {
                println!("{}  {}", format_date(date), date.format("%a"));
            }
        }
    }
    Ok(())
}
