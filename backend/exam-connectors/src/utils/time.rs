use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;

/// Layout of the `date` field written by the submission logger.
pub const LOG_DATE_FORMAT: &str = "%Y-%m-%d %H-%M-%S";

/// Hours added to a logged date to get the adjusted submission time.
pub const LOG_OFFSET_HOURS: i64 = 3;

pub fn chrono_to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

pub fn bson_to_chrono(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Submissions at or before this instant are ignored.
pub fn submission_cutoff() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, 9, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Parses a logged `YYYY-MM-DD HH-MM-SS` date and applies the fixed offset.
pub fn adjusted_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), LOG_DATE_FORMAT)
        .with_context(|| format!("Malformed log date: {:?}", raw))?;
    Ok(naive.and_utc() + Duration::hours(LOG_OFFSET_HOURS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cutoff_is_first_of_september() {
        assert_eq!(
            submission_cutoff(),
            Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_adjusted_timestamp_adds_three_hours() {
        let adjusted = adjusted_timestamp("2024-09-10 21-15-00").unwrap();
        assert_eq!(adjusted, Utc.with_ymd_and_hms(2024, 9, 11, 0, 15, 0).unwrap());
    }

    #[test]
    fn test_offset_can_cross_the_cutoff() {
        // 22:00 on Aug 31 becomes 01:00 on Sep 1
        let adjusted = adjusted_timestamp("2024-08-31 22-00-00").unwrap();
        assert!(adjusted > submission_cutoff());
    }

    #[test]
    fn test_colon_separated_time_is_rejected() {
        assert!(adjusted_timestamp("2024-09-10 21:15:00").is_err());
    }

    #[test]
    fn test_bson_round_trip_keeps_millis() {
        let now = Utc.with_ymd_and_hms(2024, 10, 1, 8, 30, 0).unwrap();
        assert_eq!(bson_to_chrono(chrono_to_bson(now)), now);
    }
}
