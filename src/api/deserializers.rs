use chrono::NaiveTime;
use serde::Deserialize;

/// Parses a clock time the way the opening-hours forms submit it:
/// "HH:MM", with "HH:MM:SS" tolerated. Empty or missing means no time.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, String> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{s}', expected HH:MM"))
}

pub fn deserialize_hhmm<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_hhmm(&s).map(Some).map_err(serde::de::Error::custom),
    }
}
