use std::sync::OnceLock;

use time::{macros::format_description, OffsetDateTime, UtcOffset};

use crate::AppResult;

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

/// Captures the server's UTC offset for [`format_hms`].
///
/// Must run while the process is still single-threaded: on unix `time` refuses
/// to read the offset once other threads exist, and we fall back to UTC.
pub fn init_local_offset() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

/// Milliseconds since the unix epoch.
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Formats an epoch-millisecond instant as `HH:mm:ss` in the offset captured by
/// [`init_local_offset`], or UTC if it never ran.
pub fn format_hms(millis: i64) -> AppResult<String> {
    let instant = OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .map_err(anyhow::Error::from)?;
    let offset = LOCAL_OFFSET.get().copied().unwrap_or(UtcOffset::UTC);

    Ok(instant
        .to_offset(offset)
        .format(format_description!("[hour]:[minute]:[second]"))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_hours_minutes_seconds() {
        let formatted = format_hms(1_700_000_000_123).unwrap();
        let parts: Vec<&str> = formatted.split(':').collect();

        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn formats_in_the_captured_offset() {
        let offset = init_local_offset();
        let expected = (OffsetDateTime::UNIX_EPOCH + time::Duration::milliseconds(3_723_999))
            .to_offset(offset)
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap();

        assert_eq!(format_hms(3_723_999).unwrap(), expected);
        if offset == UtcOffset::UTC {
            assert_eq!(expected, "01:02:03");
        }
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
