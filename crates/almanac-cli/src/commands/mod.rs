pub mod album;
pub mod calendar;
pub mod config;
pub mod event;
pub mod location;

use almanac_core::{Config, EventDb, SystemClock};

/// Configuration, store and clock shared by the commands that touch events.
pub struct Session {
    pub config: Config,
    pub db: EventDb,
    pub clock: SystemClock,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let clock = SystemClock::new(config.timezone()?);
        let db = EventDb::open(&config.database_path()?)?;
        tracing::debug!(timezone = %config.calendar.timezone, "session opened");
        Ok(Self { config, db, clock })
    }
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
