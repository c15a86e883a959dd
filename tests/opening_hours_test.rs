mod common;

use chrono::{Datelike, TimeZone, Utc, Weekday};
use common::factories::hours_factory::{single_session, split_day, time, weekday_business_hours};
use townbook::domain::opening_hours::{
    DAY_SLUGS, DayOpeningHours, OpeningHoursError, OpeningHoursWeek, WEEKDAYS, day_slug,
};

#[test]
fn validate_accepts_exactly_the_fully_paired_combinations() {
    // Both sessions empty, both paired, and one-of-each all pass.
    assert!(DayOpeningHours::default().validate().is_ok());
    assert!(split_day(1).validate().is_ok());
    assert!(single_session(1, time(9, 0), time(17, 0)).validate().is_ok());

    // Any half-specified session fails.
    let open_only = DayOpeningHours {
        open_first: Some(time(9, 0)),
        ..DayOpeningHours::default()
    };
    assert_eq!(
        open_only.validate(),
        Err(OpeningHoursError::OpenWithoutClose)
    );

    let close_only = DayOpeningHours {
        close_first: Some(time(17, 0)),
        ..DayOpeningHours::default()
    };
    assert_eq!(
        close_only.validate(),
        Err(OpeningHoursError::CloseWithoutOpen)
    );

    let second_open_only = DayOpeningHours {
        open_first: Some(time(9, 0)),
        close_first: Some(time(12, 0)),
        open_second: Some(time(13, 0)),
        ..DayOpeningHours::default()
    };
    assert_eq!(
        second_open_only.validate(),
        Err(OpeningHoursError::OpenWithoutClose)
    );
}

#[test]
fn validation_error_messages_match_the_forms() {
    let open_only = DayOpeningHours {
        open_first: Some(time(9, 0)),
        ..DayOpeningHours::default()
    };
    assert_eq!(
        open_only.validate().unwrap_err().to_string(),
        "Opening time requires a closing time"
    );

    let close_only = DayOpeningHours {
        close_first: Some(time(17, 0)),
        ..DayOpeningHours::default()
    };
    assert_eq!(
        close_only.validate().unwrap_err().to_string(),
        "Closing time requires an opening time"
    );
}

#[test]
fn daily_override_returns_today_slot_for_any_date() {
    let week = OpeningHoursWeek {
        update_daily: true,
        today: Some(single_session(99, time(7, 0), time(15, 0))),
        ..weekday_business_hours()
    };

    // A full week of distinct dates, all resolving to the same slot.
    for day in 1..=7 {
        let now = Utc.with_ymd_and_hms(2024, 4, day, 10, 0, 0).unwrap();
        assert_eq!(week.schedule_for(now).unwrap().hours_id, 99);
        assert!(week.open_today(now));
    }
}

#[test]
fn weekday_mode_resolves_each_slot_by_date() {
    let week = weekday_business_hours();

    // 2024-01-01 was a Monday; walk the whole week.
    for (offset, weekday) in WEEKDAYS.into_iter().enumerate() {
        let now = Utc
            .with_ymd_and_hms(2024, 1, 1 + offset as u32, 10, 0, 0)
            .unwrap();
        assert_eq!(now.weekday(), weekday);
        assert_eq!(day_slug(weekday), DAY_SLUGS[offset]);

        match weekday {
            Weekday::Sat | Weekday::Sun => {
                assert!(week.schedule_for(now).is_none());
                assert!(!week.open_today(now));
            }
            _ => {
                let resolved = week.schedule_for(now).unwrap();
                assert_eq!(resolved.hours_id, offset as i64 + 1);
                assert!(week.open_today(now));
            }
        }
    }
}

#[test]
fn open_today_ignores_the_clock_time() {
    let week = weekday_business_hours();

    // Monday at 03:00, hours before opening: still "open today".
    let before_opening = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
    assert!(week.open_today(before_opening));

    // Monday at 23:00, hours after closing: same.
    let after_closing = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap();
    assert!(week.open_today(after_closing));
}

#[test]
fn wednesday_schedule_scenario() {
    let week = OpeningHoursWeek {
        wed: Some(single_session(3, time(9, 0), time(17, 0))),
        ..OpeningHoursWeek::default()
    };

    // 2024-01-03 was a Wednesday.
    let wednesday = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
    assert!(week.open_today(wednesday));
    let resolved = week.schedule_for(wednesday).unwrap();
    assert_eq!(resolved.hours_id, 3);
    assert_eq!(resolved.open_first, Some(time(9, 0)));
    assert_eq!(resolved.close_first, Some(time(17, 0)));

    // The day after there is no schedule at all.
    let thursday = Utc.with_ymd_and_hms(2024, 1, 4, 12, 0, 0).unwrap();
    assert!(!week.open_today(thursday));
    assert!(week.schedule_for(thursday).is_none());
}

#[test]
fn empty_schedule_row_counts_as_closed() {
    let week = OpeningHoursWeek {
        mon: Some(DayOpeningHours::default()),
        ..OpeningHoursWeek::default()
    };
    let monday = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    assert!(week.schedule_for(monday).is_some());
    assert!(!week.open_today(monday));
}
