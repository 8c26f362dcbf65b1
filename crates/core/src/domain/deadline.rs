use chrono::NaiveDate;
use thiserror::Error;

pub const DEADLINE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeadlineError {
    #[error("a deadline is required")]
    Missing,
    #[error("deadline `{value}` is not an ISO date (YYYY-MM-DD)")]
    Invalid { value: String },
    #[error("deadline {deadline} is before today ({today})")]
    InPast { deadline: NaiveDate, today: NaiveDate },
}

/// Parses the deadline typed on the deadline step. It must be today or later.
pub fn parse_deadline(input: &str, today: NaiveDate) -> Result<NaiveDate, DeadlineError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DeadlineError::Missing);
    }

    let deadline = NaiveDate::parse_from_str(trimmed, DEADLINE_FORMAT)
        .map_err(|_| DeadlineError::Invalid { value: trimmed.to_owned() })?;
    if deadline < today {
        return Err(DeadlineError::InPast { deadline, today });
    }
    Ok(deadline)
}

/// Serializes an optional deadline as an ISO date, or `""` while unset.
pub mod iso_or_empty {
    use chrono::NaiveDate;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use super::DEADLINE_FORMAT;

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.collect_str(&date.format(DEADLINE_FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw.trim(), DEADLINE_FORMAT).map(Some).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{parse_deadline, DeadlineError};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn today_and_future_dates_are_accepted() {
        let today = date(2026, 3, 10);
        assert_eq!(parse_deadline("2026-03-10", today), Ok(today));
        assert_eq!(parse_deadline(" 2026-04-01 ", today), Ok(date(2026, 4, 1)));
    }

    #[test]
    fn blank_malformed_and_past_dates_are_rejected() {
        let today = date(2026, 3, 10);
        assert_eq!(parse_deadline("", today), Err(DeadlineError::Missing));
        assert!(matches!(parse_deadline("10/03/2026", today), Err(DeadlineError::Invalid { .. })));
        assert_eq!(
            parse_deadline("2026-03-09", today),
            Err(DeadlineError::InPast { deadline: date(2026, 3, 9), today })
        );
    }
}
