//! Occurrence commands for CLI.

use clap::Subcommand;
use dayplan_core::{format_date, Config, NewOccurrence, Priority, ScheduleDb, ScheduleStore};

use super::{date_or_today, parse_time, print_json, resolve_owner, CommandResult};

#[derive(Subcommand)]
pub enum OccurrenceAction {
    /// Add a one-off occurrence
    Add {
        title: String,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Time of day (HH:MM)
        #[arg(long)]
        time: Option<String>,
        /// Minutes this occurrence blocks on the planner
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long, default_value = "")]
        category: String,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
    },
    /// List the occurrences of a day
    List {
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Mark an occurrence as completed
    Complete {
        /// Occurrence ID
        id: String,
    },
}

pub fn run(action: OccurrenceAction, owner: Option<String>) -> CommandResult {
    let config = Config::load()?;
    let owner = resolve_owner(owner, &config);
    let mut db = ScheduleDb::open()?;

    match action {
        OccurrenceAction::Add {
            title,
            date,
            time,
            duration,
            category,
            priority,
        } => {
            let mut request = NewOccurrence::one_off(owner, title, date_or_today(date.as_deref())?);
            request.category = category;
            request.priority = priority.parse::<Priority>()?;
            if let Some(time) = parse_time(time.as_deref())? {
                request = request.with_time(time);
            }
            if let Some(minutes) = duration {
                request = request.with_duration(minutes);
            }
            let occurrence = db.insert_occurrence(request)?;
            println!("Occurrence created: {}", occurrence.id);
        }
        OccurrenceAction::List { date, json } => {
            let date = date_or_today(date.as_deref())?;
            let occurrences = db.occurrences_on(&owner, date)?;
            if json {
                return print_json(&occurrences);
            }
            if occurrences.is_empty() {
                println!("Nothing on {}.", format_date(date));
            }
            for o in &occurrences {
                let time = o.time.map(|t| t.to_string()).unwrap_or_else(|| "--:--".into());
                let mark = if o.completed { "x" } else { " " };
                let origin = if o.definition_id.is_some() { " (recurring)" } else { "" };
                println!("[{mark}] {time}  {}{origin}  {}", o.title, o.id);
            }
        }
        OccurrenceAction::Complete { id } => {
            db.set_occurrence_completed(&id, true)?;
            println!("Occurrence completed: {id}");
        }
    }
    Ok(())
}
