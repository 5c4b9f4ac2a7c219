//! Wall-clock lookups for resolved cities.

use chrono::{DateTime, Offset, Utc};
use chrono_tz::{OffsetComponents, OffsetName};

use crate::model::{ResolvedCity, TimeRecord};

/// Compute the current local time for a resolved city.
///
/// Pure function of the city's validated timezone and the supplied instant,
/// which keeps it testable against fixed points in time. It cannot fail: the
/// registry already proved the timezone identifier parses.
pub fn current_time_in(resolved: &ResolvedCity<'_>, now: DateTime<Utc>) -> TimeRecord {
    let record = resolved.record;
    let local = now.with_timezone(&record.timezone);
    let offset = local.offset();

    let tz_abbreviation = match offset.abbreviation() {
        Some(abbr) => abbr.to_string(),
        // Zones without a letter abbreviation fall back to the numeric form.
        None => offset.fix().to_string(),
    };

    TimeRecord {
        city: record.name.clone(),
        timezone_id: record.timezone.name().to_string(),
        local_time: local.fixed_offset(),
        utc_offset_minutes: offset.fix().local_minus_utc() / 60,
        tz_abbreviation,
        is_dst: !offset.dst_offset().is_zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::resolver::resolve;

    fn fixed(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn tokyo_is_utc_plus_nine_year_round_without_dst() {
        let registry = Registry::builtin().unwrap();
        let tokyo = resolve(&registry, "Tokyo").unwrap();

        for instant in ["2024-01-15T12:00:00Z", "2024-07-15T12:00:00Z"] {
            let record = current_time_in(&tokyo, fixed(instant));
            assert_eq!(record.utc_offset_minutes, 540);
            assert!(!record.is_dst);
            assert_eq!(record.tz_abbreviation, "JST");
            assert_eq!(record.timezone_id, "Asia/Tokyo");
        }
    }

    #[test]
    fn london_observes_summer_time() {
        let registry = Registry::builtin().unwrap();
        let london = resolve(&registry, "London").unwrap();

        let winter = current_time_in(&london, fixed("2024-01-15T12:00:00Z"));
        assert_eq!(winter.utc_offset_minutes, 0);
        assert!(!winter.is_dst);
        assert_eq!(winter.tz_abbreviation, "GMT");

        let summer = current_time_in(&london, fixed("2024-07-15T12:00:00Z"));
        assert_eq!(summer.utc_offset_minutes, 60);
        assert!(summer.is_dst);
        assert_eq!(summer.tz_abbreviation, "BST");
    }

    #[test]
    fn local_time_reflects_the_offset() {
        let registry = Registry::builtin().unwrap();
        let sydney = resolve(&registry, "Sydney").unwrap();

        // January is summer time in Sydney: UTC+11.
        let record = current_time_in(&sydney, fixed("2024-01-15T01:30:00Z"));
        assert_eq!(record.utc_offset_minutes, 660);
        assert!(record.is_dst);
        assert_eq!(record.local_time.to_rfc3339(), "2024-01-15T12:30:00+11:00");
    }
}
