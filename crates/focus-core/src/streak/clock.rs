//! Reference time zone for date-granular computations.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};

use crate::error::{CoreError, Result};

/// Maps instants to calendar dates in the owner's reference time zone.
///
/// With no fixed offset configured the system local zone is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceClock {
    offset: Option<FixedOffset>,
}

impl ReferenceClock {
    /// Clock using the system local time zone.
    pub fn local() -> Self {
        Self { offset: None }
    }

    /// Clock pinned to a fixed UTC offset in minutes.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the offset is outside +-24h.
    pub fn with_offset_minutes(minutes: i32) -> Result<Self> {
        let offset = minutes.checked_mul(60).and_then(FixedOffset::east_opt).ok_or_else(|| {
            CoreError::InvalidInput(format!("utc offset out of range: {minutes} minutes"))
        })?;
        Ok(Self {
            offset: Some(offset),
        })
    }

    /// Calendar date of `instant` in the reference zone.
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self.offset {
            Some(offset) => instant.with_timezone(&offset).date_naive(),
            None => instant.with_timezone(&Local).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }

    /// Parse a boundary date value.
    ///
    /// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (time of day is dropped
    /// after conversion to the reference zone).
    ///
    /// # Errors
    /// Returns `InvalidInput` for anything else.
    pub fn parse_date(&self, raw: &str) -> Result<NaiveDate> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| self.date_of(dt.with_timezone(&Utc)))
            .map_err(|_| CoreError::InvalidInput(format!("not a date: '{raw}'")))
    }

    /// Parse a boundary timestamp: RFC 3339, or a bare date meaning local
    /// midnight in the reference zone.
    ///
    /// # Errors
    /// Returns `InvalidInput` for anything else.
    pub fn parse_instant(&self, raw: &str) -> Result<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| CoreError::InvalidInput(format!("not a timestamp: '{raw}'")))?;
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let resolved = match self.offset {
            Some(offset) => midnight
                .and_local_timezone(offset)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
            None => midnight
                .and_local_timezone(Local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        };
        resolved.ok_or_else(|| CoreError::InvalidInput(format!("ambiguous local time: '{raw}'")))
    }
}
