use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Weekday slugs in Monday-start order. These double as the form prefixes
/// and the per-day column names on the organizations table.
pub const DAY_SLUGS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn day_slug(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpeningHoursError {
    #[error("Opening time requires a closing time")]
    OpenWithoutClose,
    #[error("Closing time requires an opening time")]
    CloseWithoutOpen,
}

/// Validation failure for one day out of a submitted week.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{day}: {source}")]
pub struct WeekValidationError {
    pub day: String,
    #[source]
    pub source: OpeningHoursError,
}

/// One day's opening hours: a primary session and an optional second
/// session (e.g. reopening after a lunch break). A session is either fully
/// specified or fully absent; `validate` enforces the pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DayOpeningHours {
    pub hours_id: i64,
    pub open_first: Option<NaiveTime>,
    pub close_first: Option<NaiveTime>,
    pub open_second: Option<NaiveTime>,
    pub close_second: Option<NaiveTime>,
}

impl DayOpeningHours {
    /// Checks that every open time has a close time and vice versa, per
    /// session. The first broken pairing wins: first-session open, then
    /// first-session close, then the second session in the same order.
    pub fn validate(&self) -> Result<(), OpeningHoursError> {
        if self.open_first.is_some() && self.close_first.is_none() {
            return Err(OpeningHoursError::OpenWithoutClose);
        }
        if self.open_first.is_none() && self.close_first.is_some() {
            return Err(OpeningHoursError::CloseWithoutOpen);
        }
        if self.open_second.is_some() && self.close_second.is_none() {
            return Err(OpeningHoursError::OpenWithoutClose);
        }
        if self.open_second.is_none() && self.close_second.is_some() {
            return Err(OpeningHoursError::CloseWithoutOpen);
        }
        Ok(())
    }

    /// The fully paired sessions of this day, primary first.
    ///
    /// Half-specified sessions are skipped; callers that care run
    /// `validate` before persisting, display code just shows what is there.
    pub fn sessions(&self) -> Vec<(NaiveTime, NaiveTime)> {
        let mut sessions = Vec::with_capacity(2);
        if let (Some(open), Some(close)) = (self.open_first, self.close_first) {
            sessions.push((open, close));
        }
        if let (Some(open), Some(close)) = (self.open_second, self.close_second) {
            sessions.push((open, close));
        }
        sessions
    }
}

/// Validates a batch of submitted day schedules, reporting the first
/// failing day. Used by the opening-hours form handler so that nothing is
/// persisted when any single day is invalid.
pub fn validate_days<'a, I>(days: I) -> Result<(), WeekValidationError>
where
    I: IntoIterator<Item = (&'a str, &'a DayOpeningHours)>,
{
    for (day, hours) in days {
        hours.validate().map_err(|source| WeekValidationError {
            day: day.to_string(),
            source,
        })?;
    }
    Ok(())
}

/// The assembled opening-hours context of one organization: either a single
/// floating "today" schedule (daily-override mode) or seven owned weekday
/// schedules. Slots that were never edited are simply absent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OpeningHoursWeek {
    pub update_daily: bool,
    pub today: Option<DayOpeningHours>,
    pub mon: Option<DayOpeningHours>,
    pub tue: Option<DayOpeningHours>,
    pub wed: Option<DayOpeningHours>,
    pub thu: Option<DayOpeningHours>,
    pub fri: Option<DayOpeningHours>,
    pub sat: Option<DayOpeningHours>,
    pub sun: Option<DayOpeningHours>,
}

impl OpeningHoursWeek {
    pub fn day(&self, weekday: Weekday) -> Option<&DayOpeningHours> {
        match weekday {
            Weekday::Mon => self.mon.as_ref(),
            Weekday::Tue => self.tue.as_ref(),
            Weekday::Wed => self.wed.as_ref(),
            Weekday::Thu => self.thu.as_ref(),
            Weekday::Fri => self.fri.as_ref(),
            Weekday::Sat => self.sat.as_ref(),
            Weekday::Sun => self.sun.as_ref(),
        }
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut Option<DayOpeningHours> {
        match weekday {
            Weekday::Mon => &mut self.mon,
            Weekday::Tue => &mut self.tue,
            Weekday::Wed => &mut self.wed,
            Weekday::Thu => &mut self.thu,
            Weekday::Fri => &mut self.fri,
            Weekday::Sat => &mut self.sat,
            Weekday::Sun => &mut self.sun,
        }
    }

    /// The schedule that applies on the date of `now`: the floating today
    /// slot in daily-override mode, otherwise the slot of `now`'s weekday.
    /// `now` is injected by the caller so the lookup stays testable.
    pub fn schedule_for(&self, now: DateTime<Utc>) -> Option<&DayOpeningHours> {
        if self.update_daily {
            self.today.as_ref()
        } else {
            self.day(now.weekday())
        }
    }

    /// Whether the organization counts as open on the date of `now`.
    ///
    /// Open means: today's schedule exists and has a first-session opening
    /// time. The clock time of `now` is not compared against the session
    /// window; only the date's weekday matters.
    pub fn open_today(&self, now: DateTime<Utc>) -> bool {
        self.schedule_for(now)
            .map(|hours| hours.open_first.is_some())
            .unwrap_or(false)
    }
}
