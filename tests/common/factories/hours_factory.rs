use chrono::NaiveTime;
use townbook::domain::opening_hours::{DayOpeningHours, OpeningHoursWeek};

#[allow(dead_code)]
pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[allow(dead_code)]
pub fn single_session(hours_id: i64, open: NaiveTime, close: NaiveTime) -> DayOpeningHours {
    DayOpeningHours {
        hours_id,
        open_first: Some(open),
        close_first: Some(close),
        ..DayOpeningHours::default()
    }
}

#[allow(dead_code)]
pub fn split_day(hours_id: i64) -> DayOpeningHours {
    DayOpeningHours {
        hours_id,
        open_first: Some(time(9, 0)),
        close_first: Some(time(12, 30)),
        open_second: Some(time(13, 30)),
        close_second: Some(time(18, 0)),
    }
}

/// A week that is open Monday through Friday, nine to five.
#[allow(dead_code)]
pub fn weekday_business_hours() -> OpeningHoursWeek {
    OpeningHoursWeek {
        mon: Some(single_session(1, time(9, 0), time(17, 0))),
        tue: Some(single_session(2, time(9, 0), time(17, 0))),
        wed: Some(single_session(3, time(9, 0), time(17, 0))),
        thu: Some(single_session(4, time(9, 0), time(17, 0))),
        fri: Some(single_session(5, time(9, 0), time(17, 0))),
        ..OpeningHoursWeek::default()
    }
}
