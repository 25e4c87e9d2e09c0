//! Month views. Every view prints JSON.

use almanac_core::{CalendarQuery, MonthRef};
use clap::{Args, Subcommand};

use super::Session;

#[derive(Args)]
pub struct MonthArgs {
    /// Year; defaults to the current one
    #[arg(long)]
    year: Option<i32>,
    /// Month 1-12; defaults to the current one
    #[arg(long)]
    month: Option<u32>,
}

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Six-week grid
    Grid(MonthArgs),
    /// Upcoming events grouped by day
    ByDate(MonthArgs),
    /// Upcoming events grouped by location
    ByLocation(MonthArgs),
    /// Link to the previous month
    Prev(MonthArgs),
    /// Link to the next month
    Next(MonthArgs),
}

impl CalendarAction {
    fn month_args(&self) -> &MonthArgs {
        match self {
            CalendarAction::Grid(args)
            | CalendarAction::ByDate(args)
            | CalendarAction::ByLocation(args)
            | CalendarAction::Prev(args)
            | CalendarAction::Next(args) => args,
        }
    }
}

pub fn run(action: CalendarAction) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open()?;
    let query = CalendarQuery::new(&session.db, &session.clock)
        .with_max_per_cell(session.config.calendar.max_events_per_cell);

    let args = action.month_args();
    let month = MonthRef::resolve(args.year, args.month, &session.clock).ok_or_else(|| {
        format!(
            "invalid month: {}-{}",
            args.year.map_or("current".to_string(), |y| y.to_string()),
            args.month.map_or("current".to_string(), |m| m.to_string()),
        )
    })?;

    match action {
        CalendarAction::Grid(_) => super::print_json(&query.grid(month)?)?,
        CalendarAction::ByDate(_) => super::print_json(&query.by_date(month)?)?,
        CalendarAction::ByLocation(_) => super::print_json(&query.by_location(month)?)?,
        CalendarAction::Prev(_) => super::print_json(&query.prev_month(month))?,
        CalendarAction::Next(_) => super::print_json(&query.next_month(month))?,
    }
    Ok(())
}
