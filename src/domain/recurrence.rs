//! Recurrence scheduling
//!
//! A recurring action carries an interval (fixed or a min..max range of
//! days/weeks/months) and optionally a window restricting *when during
//! the day or week* the item is actionable once the interval has
//! elapsed. Completing a recurring item advances its last-done stamp;
//! it is never terminally done.

use std::fmt;

use chrono::{Datelike, Duration, Months, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurUnit {
    Day,
    Week,
    Month,
}

impl RecurUnit {
    pub fn label(&self) -> &'static str {
        match self {
            RecurUnit::Day => "day",
            RecurUnit::Week => "week",
            RecurUnit::Month => "month",
        }
    }
}

/// Restricts when an interval-elapsed item is actually actionable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecurWindow {
    /// Between two times of day; the range may wrap midnight.
    Time { start: NaiveTime, end: NaiveTime },
    /// Between a weekday+time and another weekday+time each week; the
    /// range may wrap the week boundary.
    WeekdayTime {
        start_day: Weekday,
        start: NaiveTime,
        end_day: Weekday,
        end: NaiveTime,
    },
}

fn minutes_into_week(day: Weekday, t: NaiveTime) -> u32 {
    day.num_days_from_monday() * 24 * 60 + t.hour() * 60 + t.minute()
}

impl RecurWindow {
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        match self {
            RecurWindow::Time { start, end } => {
                let t = now.time();
                if start <= end {
                    t >= *start && t <= *end
                } else {
                    t >= *start || t <= *end
                }
            }
            RecurWindow::WeekdayTime {
                start_day,
                start,
                end_day,
                end,
            } => {
                let pos = minutes_into_week(now.weekday(), now.time());
                let s = minutes_into_week(*start_day, *start);
                let e = minutes_into_week(*end_day, *end);
                if s <= e {
                    pos >= s && pos <= e
                } else {
                    pos >= s || pos <= e
                }
            }
        }
    }
}

impl fmt::Display for RecurWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurWindow::Time { start, end } => {
                write!(f, "{} - {}", start.format("%H:%M"), end.format("%H:%M"))
            }
            RecurWindow::WeekdayTime {
                start_day,
                start,
                end_day,
                end,
            } => write!(
                f,
                "{} {} - {} {}",
                start_day,
                start.format("%H:%M"),
                end_day,
                end.format("%H:%M")
            ),
        }
    }
}

/// The computed next-due window for a recurring item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueWindow {
    pub earliest: NaiveDateTime,
    pub latest: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub min_count: u32,
    /// Equal to `min_count` for fixed, non-range specs.
    pub max_count: u32,
    pub unit: RecurUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<RecurWindow>,
}

impl RecurrenceSpec {
    pub fn fixed(count: u32, unit: RecurUnit) -> Self {
        Self {
            min_count: count,
            max_count: count,
            unit,
            window: None,
        }
    }

    pub fn range(min: u32, max: u32, unit: RecurUnit) -> Self {
        Self {
            min_count: min,
            max_count: max,
            unit,
            window: None,
        }
    }

    pub fn with_window(mut self, window: RecurWindow) -> Self {
        self.window = Some(window);
        self
    }

    fn advance(&self, from: NaiveDateTime, count: u32) -> NaiveDateTime {
        match self.unit {
            RecurUnit::Day => from + Duration::days(i64::from(count)),
            RecurUnit::Week => from + Duration::weeks(i64::from(count)),
            // Calendar months; the day clamps when the target month is shorter.
            RecurUnit::Month => from.checked_add_months(Months::new(count)).unwrap_or(from),
        }
    }

    pub fn due_window(&self, last_done: NaiveDateTime) -> DueWindow {
        DueWindow {
            earliest: self.advance(last_done, self.min_count),
            latest: self.advance(last_done, self.max_count),
        }
    }

    /// The next-due window, or `None` when the item has never been done
    /// (a never-done item is always due).
    pub fn next_due(&self, last_done: Option<NaiveDateTime>) -> Option<DueWindow> {
        last_done.map(|ld| self.due_window(ld))
    }

    /// Whether the item is actionable at `now`: the interval has elapsed
    /// (or it was never done) and the window, if any, admits `now`.
    pub fn is_due(&self, last_done: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
        let elapsed = match last_done {
            None => true,
            Some(ld) => now >= self.due_window(ld).earliest,
        };
        elapsed && self.window.map_or(true, |w| w.contains(now))
    }
}

impl fmt::Display for RecurrenceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every ")?;
        if self.min_count == self.max_count {
            if self.min_count == 1 {
                write!(f, "{}", self.unit.label())?;
            } else {
                write!(f, "{} {}s", self.min_count, self.unit.label())?;
            }
        } else {
            write!(
                f,
                "{}-{} {}s",
                self.min_count,
                self.max_count,
                self.unit.label()
            )?;
        }
        if let Some(window) = &self.window {
            write!(f, " [{}]", window)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::date;

    fn dt(s: &str) -> NaiveDateTime {
        date::parse_datetime(s).unwrap()
    }

    #[test]
    fn range_weeks_window() {
        let spec = RecurrenceSpec::range(4, 6, RecurUnit::Week);
        let window = spec.due_window(dt("2013-08-16 21:00"));
        assert_eq!(window.earliest, dt("2013-09-13 21:00"));
        assert_eq!(window.latest, dt("2013-09-27 21:00"));
    }

    #[test]
    fn fixed_spec_has_equal_bounds() {
        let spec = RecurrenceSpec::fixed(3, RecurUnit::Day);
        let window = spec.due_window(dt("2013-08-14 09:00"));
        assert_eq!(window.earliest, dt("2013-08-17 09:00"));
        assert_eq!(window.earliest, window.latest);
    }

    #[test]
    fn month_arithmetic_clamps_short_months() {
        let spec = RecurrenceSpec::fixed(1, RecurUnit::Month);
        let window = spec.due_window(dt("2013-01-31 12:00"));
        assert_eq!(window.earliest, dt("2013-02-28 12:00"));
    }

    #[test]
    fn never_done_is_always_due() {
        let spec = RecurrenceSpec::fixed(1, RecurUnit::Week);
        assert!(spec.next_due(None).is_none());
        assert!(spec.is_due(None, dt("2013-08-20 12:00")));
    }

    #[test]
    fn due_once_interval_elapsed() {
        let spec = RecurrenceSpec::fixed(3, RecurUnit::Day);
        let last = Some(dt("2013-08-14 09:00"));
        assert!(!spec.is_due(last, dt("2013-08-16 12:00")));
        assert!(spec.is_due(last, dt("2013-08-17 09:00")));
    }

    #[test]
    fn time_window_gates_due_items() {
        let spec = RecurrenceSpec::fixed(1, RecurUnit::Day).with_window(RecurWindow::Time {
            start: date::hm(8, 0),
            end: date::hm(10, 0),
        });
        let last = Some(dt("2013-08-14 09:00"));
        assert!(spec.is_due(last, dt("2013-08-20 09:00")));
        assert!(!spec.is_due(last, dt("2013-08-20 12:00")));
    }

    #[test]
    fn time_window_may_wrap_midnight() {
        let window = RecurWindow::Time {
            start: date::hm(22, 0),
            end: date::hm(6, 0),
        };
        assert!(window.contains(dt("2013-08-20 23:30")));
        assert!(window.contains(dt("2013-08-20 05:00")));
        assert!(!window.contains(dt("2013-08-20 12:00")));
    }

    #[test]
    fn weekday_window_spans_days() {
        // Thursday 17:00 through Friday 07:00.
        let window = RecurWindow::WeekdayTime {
            start_day: Weekday::Thu,
            start: date::hm(17, 0),
            end_day: Weekday::Fri,
            end: date::hm(7, 0),
        };
        // 2013-08-22 is a Thursday.
        assert!(window.contains(dt("2013-08-22 18:00")));
        assert!(window.contains(dt("2013-08-23 06:00")));
        assert!(!window.contains(dt("2013-08-23 08:00")));
        assert!(!window.contains(dt("2013-08-21 18:00")));
    }

    #[test]
    fn weekday_window_may_wrap_week() {
        // Saturday 20:00 through Monday 08:00.
        let window = RecurWindow::WeekdayTime {
            start_day: Weekday::Sat,
            start: date::hm(20, 0),
            end_day: Weekday::Mon,
            end: date::hm(8, 0),
        };
        // 2013-08-24 Sat, 2013-08-25 Sun, 2013-08-26 Mon.
        assert!(window.contains(dt("2013-08-24 21:00")));
        assert!(window.contains(dt("2013-08-25 12:00")));
        assert!(window.contains(dt("2013-08-26 07:00")));
        assert!(!window.contains(dt("2013-08-26 09:00")));
    }

    #[test]
    fn display_reads_naturally() {
        assert_eq!(
            RecurrenceSpec::fixed(1, RecurUnit::Day).to_string(),
            "every day"
        );
        assert_eq!(
            RecurrenceSpec::fixed(2, RecurUnit::Month).to_string(),
            "every 2 months"
        );
        assert_eq!(
            RecurrenceSpec::range(4, 6, RecurUnit::Week).to_string(),
            "every 4-6 weeks"
        );
    }
}
