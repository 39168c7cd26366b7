//! Auto-scheduling command for CLI.

use clap::Args;
use dayplan_core::clock::parse_window_end;
use dayplan_core::{
    format_date, minutes_to_clock, ClockTime, Config, IntervalScheduler, Priority, ScheduleDb, ScheduleStore,
};
use serde::Serialize;
use tracing::{info, warn};

use super::{date_or_today, print_json, resolve_owner, CommandResult};

#[derive(Args)]
pub struct PlanArgs {
    /// Task lines, e.g. "Report writing - 60m" "Workout (1h 30m)"
    #[arg(required = true)]
    lines: Vec<String>,
    /// Day to plan (YYYY-MM-DD, default: today)
    #[arg(long)]
    date: Option<String>,
    /// Window start (HH:MM, default from config)
    #[arg(long)]
    start: Option<String>,
    /// Window end, exclusive (HH:MM or 24:00, default from config)
    #[arg(long)]
    end: Option<String>,
    #[arg(long)]
    break_minutes: Option<u32>,
    /// Minutes for lines that name no duration
    #[arg(long)]
    default_duration: Option<u32>,
    /// Store the scheduled entries as occurrences
    #[arg(long)]
    apply: bool,
    /// Category for applied occurrences
    #[arg(long, default_value = "planned")]
    category: String,
    #[arg(long)]
    json: bool,
    /// Also list the free gaps of the window before planning
    #[arg(long)]
    gaps: bool,
}

#[derive(Serialize)]
struct GapView {
    start: String,
    end: String,
    minutes: u32,
}

pub fn run(args: PlanArgs, owner: Option<String>) -> CommandResult {
    let config = Config::load()?;
    let owner = resolve_owner(owner, &config);

    let mut scheduler_config = config.scheduler_config()?;
    if let Some(start) = args.start.as_deref() {
        scheduler_config.day_start = start.parse::<ClockTime>()?.minutes();
    }
    if let Some(end) = args.end.as_deref() {
        scheduler_config.day_end = parse_window_end(end)?;
    }
    if let Some(minutes) = args.break_minutes {
        scheduler_config.break_minutes = minutes;
    }
    if let Some(minutes) = args.default_duration {
        scheduler_config = scheduler_config.with_default_duration(minutes);
    }
    let scheduler = IntervalScheduler::with_config(scheduler_config);

    let date = date_or_today(args.date.as_deref())?;
    let mut db = ScheduleDb::open()?;
    let existing = db.occurrences_on(&owner, date)?;
    let result = scheduler.plan_day(date, &existing, args.lines.as_slice())?;

    let gaps: Vec<GapView> = if args.gaps {
        scheduler
            .free_gaps(&scheduler.busy_from_occurrences(&existing))
            .into_iter()
            .map(|g| GapView {
                start: minutes_to_clock(g.start),
                end: minutes_to_clock(g.end),
                minutes: g.duration_minutes(),
            })
            .collect()
    } else {
        Vec::new()
    };

    if args.json {
        print_json(&serde_json::json!({
            "date": format_date(date),
            "scheduled": result.scheduled,
            "unscheduled": result.unscheduled,
            "gaps": gaps,
        }))?;
    } else {
        if args.gaps {
            println!("Free time on {}:", format_date(date));
            for gap in &gaps {
                println!("  {}-{}  ({} min)", gap.start, gap.end, gap.minutes);
            }
        }
        println!("Plan for {}:", format_date(date));
        for s in &result.scheduled {
            println!("  {}-{}  {} ({} min)", s.start, s.end, s.title, s.duration_minutes);
        }
        for c in &result.unscheduled {
            println!("  (no room)    {} ({} min)", c.title, c.duration_minutes);
        }
        println!("{}", result.summary());
    }

    if args.apply {
        let requests = result.to_new_occurrences(&owner, &args.category, Priority::Medium);
        let saved = db.insert_occurrences(requests).inspect_err(|e| {
            warn!(%owner, date = %format_date(date), error = %e, "plan not applied");
        })?;
        info!(%owner, date = %format_date(date), count = saved.len(), "plan applied");
        if !args.json {
            println!("{} occurrence(s) saved", saved.len());
        }
    }
    Ok(())
}
