//! Weekly rebalance calendar.

use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RebalanceWeekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    #[default]
    Friday,
}

impl RebalanceWeekday {
    pub fn weekday(self) -> Weekday {
        match self {
            RebalanceWeekday::Monday => Weekday::Mon,
            RebalanceWeekday::Tuesday => Weekday::Tue,
            RebalanceWeekday::Wednesday => Weekday::Wed,
            RebalanceWeekday::Thursday => Weekday::Thu,
            RebalanceWeekday::Friday => Weekday::Fri,
        }
    }

    /// True when a `self` weekday falls in `(previous, date]`.
    ///
    /// With no previous trading day only `date` itself is considered. A
    /// holiday on the rebalance weekday rolls the rebalance forward to the
    /// next trading day.
    pub fn is_rebalance_day(self, previous: Option<NaiveDate>, date: NaiveDate) -> bool {
        let target = self.weekday();
        let Some(previous) = previous else {
            return date.weekday() == target;
        };
        if previous >= date {
            return false;
        }
        let mut day = date;
        while day > previous {
            if day.weekday() == target {
                return true;
            }
            match day.pred_opt() {
                Some(p) => day = p,
                None => break,
            }
        }
        false
    }
}

impl fmt::Display for RebalanceWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebalanceWeekday::Monday => "monday",
            RebalanceWeekday::Tuesday => "tuesday",
            RebalanceWeekday::Wednesday => "wednesday",
            RebalanceWeekday::Thursday => "thursday",
            RebalanceWeekday::Friday => "friday",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rebalance weekday '{0}', expected monday..friday")]
pub struct UnknownWeekday(pub String);

impl FromStr for RebalanceWeekday {
    type Err = UnknownWeekday;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mon" | "monday" => Ok(RebalanceWeekday::Monday),
            "tue" | "tuesday" => Ok(RebalanceWeekday::Tuesday),
            "wed" | "wednesday" => Ok(RebalanceWeekday::Wednesday),
            "thu" | "thursday" => Ok(RebalanceWeekday::Thursday),
            "fri" | "friday" => Ok(RebalanceWeekday::Friday),
            _ => Err(UnknownWeekday(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn friday_is_rebalance_day() {
        // 2024-01-05 is a Friday
        let fri = RebalanceWeekday::Friday;
        assert!(fri.is_rebalance_day(Some(d(2024, 1, 4)), d(2024, 1, 5)));
        assert!(!fri.is_rebalance_day(Some(d(2024, 1, 3)), d(2024, 1, 4)));
    }

    #[test]
    fn holiday_friday_rolls_to_next_trading_day() {
        // 2024-03-29 Good Friday: Thursday then Monday
        let fri = RebalanceWeekday::Friday;
        assert!(fri.is_rebalance_day(Some(d(2024, 3, 28)), d(2024, 4, 1)));
        assert!(!fri.is_rebalance_day(Some(d(2024, 4, 1)), d(2024, 4, 2)));
    }

    #[test]
    fn first_day_only_checks_its_own_weekday() {
        let fri = RebalanceWeekday::Friday;
        assert!(fri.is_rebalance_day(None, d(2024, 1, 5)));
        assert!(!fri.is_rebalance_day(None, d(2024, 1, 8)));
    }

    #[test]
    fn other_weekdays() {
        let mon = RebalanceWeekday::Monday;
        assert!(mon.is_rebalance_day(Some(d(2024, 1, 5)), d(2024, 1, 8)));
        assert!(!mon.is_rebalance_day(Some(d(2024, 1, 8)), d(2024, 1, 9)));
    }

    #[test]
    fn non_increasing_dates_never_rebalance() {
        let fri = RebalanceWeekday::Friday;
        assert!(!fri.is_rebalance_day(Some(d(2024, 1, 5)), d(2024, 1, 5)));
    }

    #[test]
    fn parse_weekday() {
        assert_eq!("Friday".parse::<RebalanceWeekday>().unwrap(), RebalanceWeekday::Friday);
        assert_eq!(" wed ".parse::<RebalanceWeekday>().unwrap(), RebalanceWeekday::Wednesday);
        assert!("saturday".parse::<RebalanceWeekday>().is_err());
        assert_eq!(RebalanceWeekday::Thursday.to_string(), "thursday");
    }
}
