//! The time zone calendar days are reckoned in.
//!
//! Prayer times arrive as wall-clock "HH:MM" strings and cache lookups are by
//! calendar day, so every component that turns instants into days (or back)
//! goes through a [`DayZone`].

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayZone {
    /// The host's system time zone.
    #[default]
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

impl DayZone {
    pub fn utc() -> Self {
        DayZone::Fixed(Utc.fix())
    }

    /// Parse "+HH:MM" / "-HH:MM" (also "Z" and "UTC").
    pub fn parse_offset(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }
        let invalid = || ValidationError::InvalidOffset(s.to_string());

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid()),
        };
        let (h, m) = rest.split_once(':').ok_or_else(invalid)?;
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let hours: u8 = h.parse().map_err(|_| invalid())?;
        let minutes: u8 = m.parse().map_err(|_| invalid())?;
        if h.len() != 2 || m.len() != 2 || hours > 14 || minutes > 59 {
            return Err(invalid());
        }
        FixedOffset::east_opt(sign * (i32::from(hours) * 3600 + i32::from(minutes) * 60))
            .map(DayZone::Fixed)
            .ok_or_else(invalid)
    }

    /// Calendar day containing `instant`.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            DayZone::Local => instant.with_timezone(&Local).date_naive(),
            DayZone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.day_of(now)
    }

    /// Absolute instant for a wall-clock time on `date`.
    ///
    /// Returns `None` when the wall-clock time does not exist (DST gap). An
    /// ambiguous time (DST overlap) resolves to the earlier instant.
    pub fn at(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        let naive = date.and_time(time);
        match self {
            DayZone::Local => first_of(Local.from_local_datetime(&naive)),
            DayZone::Fixed(offset) => first_of(offset.from_local_datetime(&naive)),
        }
    }

    /// Local noon of `date`, a point safely inside the day in any zone.
    pub fn noon(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.at(date, NaiveTime::from_hms_opt(12, 0, 0)?)
    }

    /// Render `instant` as wall-clock time in this zone.
    pub fn format(&self, instant: DateTime<Utc>, fmt: &str) -> String {
        match self {
            DayZone::Local => instant.with_timezone(&Local).format(fmt).to_string(),
            DayZone::Fixed(offset) => instant.with_timezone(offset).format(fmt).to_string(),
        }
    }
}

fn first_of<Tz: TimeZone>(result: LocalResult<DateTime<Tz>>) -> Option<DateTime<Utc>> {
    match result {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets() {
        let zone = DayZone::parse_offset("+03:00").unwrap();
        assert_eq!(zone, DayZone::Fixed(FixedOffset::east_opt(3 * 3600).unwrap()));
        let zone = DayZone::parse_offset("-05:30").unwrap();
        assert_eq!(
            zone,
            DayZone::Fixed(FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap())
        );
        assert_eq!(DayZone::parse_offset("UTC").unwrap(), DayZone::utc());
        assert!(DayZone::parse_offset("03:00").is_err());
        assert!(DayZone::parse_offset("+3:00").is_err());
        assert!(DayZone::parse_offset("+15:00").is_err());
    }

    #[test]
    fn day_of_respects_offset() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap();
        assert_eq!(
            DayZone::utc().day_of(instant),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        let plus3 = DayZone::parse_offset("+03:00").unwrap();
        assert_eq!(
            plus3.day_of(instant),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
    }

    #[test]
    fn at_combines_date_and_time() {
        let plus3 = DayZone::parse_offset("+03:00").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let t = plus3.at(date, NaiveTime::from_hms_opt(5, 10, 0).unwrap()).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 3, 2, 2, 10, 0).unwrap());
    }

    #[test]
    fn format_renders_wall_clock() {
        let plus3 = DayZone::parse_offset("+03:00").unwrap();
        let t = Utc.with_ymd_and_hms(2026, 3, 2, 2, 10, 0).unwrap();
        assert_eq!(plus3.format(t, "%H:%M"), "05:10");
    }
}
