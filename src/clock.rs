use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Source of "today" and "now" for pricing and order stamps.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Wall-clock time truncated to whole seconds, as stamped on orders.
    fn time_of_day(&self) -> NaiveTime {
        let time = self.now().time();
        time.with_nanosecond(0).unwrap_or(time)
    }
}

/// The deployment's local calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        FixedClock(date.and_time(time))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_truncates_subseconds() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let time = NaiveTime::from_hms_milli_opt(12, 30, 5, 750).unwrap();
        let clock = FixedClock::at(date, time);

        assert_eq!(clock.today(), date);
        assert_eq!(clock.time_of_day(), NaiveTime::from_hms_opt(12, 30, 5).unwrap());
    }
}
