//! Shared state for one CLI invocation: the database, the loaded config and
//! the owner-scoped stores built from them.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use focus_core::{
    CalendarDb, Config, Database, HabitDb, InsightsDb, JournalDb, KanbanDb, ReferenceClock,
    SessionDb,
};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub struct Workspace {
    pub db: Database,
    pub config: Config,
}

impl Workspace {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let db = Database::open()?;
        debug!(owner_id = %config.profile.owner_id, "opened workspace");
        Ok(Self { db, config })
    }

    pub fn owner(&self) -> &str {
        &self.config.profile.owner_id
    }

    pub fn clock(&self) -> ReferenceClock {
        self.config.clock()
    }

    /// `raw` parsed in the reference zone, or today.
    pub fn date_or_today(&self, raw: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
        match raw {
            Some(raw) => Ok(self.clock().parse_date(raw)?),
            None => Ok(self.clock().today()),
        }
    }

    pub fn kanban(&self) -> KanbanDb<'_> {
        KanbanDb::new(&self.db, self.owner())
            .with_default_columns(self.config.kanban.default_columns.clone())
    }

    pub fn habits(&self) -> HabitDb<'_> {
        HabitDb::new(&self.db, self.owner()).with_clock(self.clock())
    }

    pub fn sessions(&self) -> SessionDb<'_> {
        SessionDb::new(&self.db, self.owner()).with_clock(self.clock())
    }

    pub fn journal(&self) -> JournalDb<'_> {
        JournalDb::new(&self.db, self.owner())
    }

    pub fn calendar(&self) -> CalendarDb<'_> {
        CalendarDb::new(&self.db, self.owner())
    }

    pub fn insights(&self) -> InsightsDb<'_> {
        InsightsDb::new(&self.db, self.owner()).with_clock(self.clock())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Split a comma-separated tag list.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
