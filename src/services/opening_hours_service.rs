use anyhow::{Result, anyhow};
use chrono::NaiveTime;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::opening_hours::{
    DayOpeningHours, OpeningHoursWeek, WEEKDAYS, WeekValidationError, day_slug, validate_days,
};
use crate::domain::organization::Organization;
use crate::repository::OpeningHoursRepository;

/// The four time fields of one submitted day, already parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayHoursInput {
    pub open_first: Option<NaiveTime>,
    pub close_first: Option<NaiveTime>,
    pub open_second: Option<NaiveTime>,
    pub close_second: Option<NaiveTime>,
}

/// A full opening-hours submission. In daily-override mode only `today` is
/// read; otherwise the seven Monday-start entries of `days`.
#[derive(Debug, Clone, Default)]
pub struct WeekInput {
    pub today: DayHoursInput,
    pub days: [DayHoursInput; 7],
}

impl WeekInput {
    pub fn day(&self, weekday: chrono::Weekday) -> &DayHoursInput {
        &self.days[weekday.num_days_from_monday() as usize]
    }

    pub fn day_mut(&mut self, weekday: chrono::Weekday) -> &mut DayHoursInput {
        &mut self.days[weekday.num_days_from_monday() as usize]
    }
}

#[derive(Debug, Error)]
pub enum SaveWeekError {
    /// A submitted day broke the open/close pairing rule; nothing was saved.
    #[error(transparent)]
    Validation(#[from] WeekValidationError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct OpeningHoursService<H: OpeningHoursRepository> {
    pub repo: Arc<H>,
}

impl<H: OpeningHoursRepository> OpeningHoursService<H> {
    pub fn new(repo: Arc<H>) -> Self {
        Self { repo }
    }

    /// The organization's schedules as currently stored, absent slots
    /// included.
    pub async fn week_for(&self, org: &Organization) -> Result<OpeningHoursWeek> {
        self.repo.week_for(org).await
    }

    /// The schedules for the edit form: every slot the organization's mode
    /// needs exists afterwards, empty rows created on first access.
    pub async fn edit_week(&self, org: &Organization) -> Result<OpeningHoursWeek> {
        self.repo.ensure_week(org).await
    }

    /// Validates the whole submission, then persists it all-or-nothing.
    ///
    /// Expects `edit_week` to have run at least once for this organization,
    /// so that every needed slot has a row to write to.
    pub async fn save_week(&self, org: &Organization, input: &WeekInput) -> Result<(), SaveWeekError> {
        let mut days: Vec<(&'static str, DayOpeningHours)> = Vec::with_capacity(7);

        if org.update_hours_daily {
            let hours_id = org
                .today_hours_id
                .ok_or_else(|| anyhow!("opening hours have not been initialized"))?;
            days.push(("today", day_row(hours_id, &input.today)));
        } else {
            for weekday in WEEKDAYS {
                let slug = day_slug(weekday);
                let hours_id = org
                    .day_slot(weekday)
                    .ok_or_else(|| anyhow!("opening hours have not been initialized"))?;
                days.push((slug, day_row(hours_id, input.day(weekday))));
            }
        }

        validate_days(days.iter().map(|(slug, day)| (*slug, day)))?;

        let rows: Vec<DayOpeningHours> = days.into_iter().map(|(_, day)| day).collect();
        self.repo.save_week(&rows).await.map_err(SaveWeekError::Other)
    }
}

fn day_row(hours_id: i64, input: &DayHoursInput) -> DayOpeningHours {
    DayOpeningHours {
        hours_id,
        open_first: input.open_first,
        close_first: input.close_first,
        open_second: input.open_second,
        close_second: input.close_second,
    }
}
