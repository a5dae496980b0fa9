use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};

/// Half-open time range `[start, end)`. An open end runs up to "now" and beyond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Window {
    pub fn since(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end: Some(end) }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && self.end.map_or(true, |end| ts < end)
    }
}

const MONTH_DAYS: i64 = 30;
const WEEK_DAYS: i64 = 7;
/// Calendar months in the monthly series, the current one included.
const MONTHLY_SERIES_MONTHS: u32 = 6;

/// Every window the dashboard snapshot needs, derived from a single instant.
#[derive(Debug, Clone, Copy)]
pub struct Windows {
    pub month: Window,
    pub previous_month: Window,
    pub week: Window,
    pub previous_week: Window,
    pub daily_since: DateTime<Utc>,
    pub monthly_since: DateTime<Utc>,
}

impl Windows {
    pub fn at(now: DateTime<Utc>) -> Self {
        let month_start = now - Duration::days(MONTH_DAYS);
        let previous_month_start = now - Duration::days(MONTH_DAYS * 2);
        let week_start = now - Duration::days(WEEK_DAYS);
        let previous_week_start = now - Duration::days(WEEK_DAYS * 2);

        Self {
            month: Window::since(month_start),
            previous_month: Window::between(previous_month_start, month_start),
            week: Window::since(week_start),
            previous_week: Window::between(previous_week_start, week_start),
            daily_since: month_start,
            monthly_since: first_of_month_back(now, MONTHLY_SERIES_MONTHS - 1),
        }
    }
}

/// Midnight on the first day of the month `months` calendar months before `now`'s.
fn first_of_month_back(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let this_month = now.date_naive().with_day(1).unwrap_or(now.date_naive());
    this_month
        .checked_sub_months(Months::new(months))
        .unwrap_or(this_month)
        .and_time(NaiveTime::MIN)
        .and_utc()
}
