use chrono::{DateTime, Datelike, TimeZone, Utc};
use tracing::warn;

use crate::dates::{record_timestamp, MONTH_ABBREVIATIONS};
use crate::models::{Application, Job, MonthBucket, WeekBucket};

pub const TRAILING_BUCKETS: usize = 6;
pub const WEEKLY_WINDOW_DAYS: i64 = 42;
const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// How a posting date is matched against the trailing month labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonthKeying {
    /// Month of year only: a posting from the same month a year earlier lands
    /// in the same bucket.
    #[default]
    MonthOfYear,
    /// Year and month: only postings inside the trailing six calendar months count.
    CalendarMonth,
}

pub fn week_labels() -> Vec<String> {
    (1..=TRAILING_BUCKETS).map(|n| format!("Week {n}")).collect()
}

/// Whole days between `then` and `now`, rounded up. Future or same-instant
/// timestamps count as zero days.
pub fn elapsed_days(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    let millis = (now - then).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    (millis + DAY_MILLIS - 1) / DAY_MILLIS
}

/// Zero is the most recent week, five the oldest. `None` once outside the window.
pub fn week_index(diff_days: i64) -> Option<usize> {
    if diff_days > WEEKLY_WINDOW_DAYS {
        return None;
    }
    let index = diff_days.max(0) / 7;
    Some((index as usize).min(TRAILING_BUCKETS - 1))
}

pub fn weekly_buckets<Tz: TimeZone>(applications: &[Application], now: &DateTime<Tz>) -> Vec<WeekBucket> {
    let now = now.with_timezone(&Utc);
    let mut counts = [0u32; TRAILING_BUCKETS];

    for application in applications {
        let applied = match record_timestamp(
            &application.id,
            "appliedDate",
            application.applied_date.as_deref(),
        ) {
            Ok(applied) => applied,
            Err(err) => {
                warn!("Skipping application in weekly series: {}", err);
                continue;
            }
        };

        if let Some(index) = week_index(elapsed_days(now, applied)) {
            counts[TRAILING_BUCKETS - 1 - index] += 1;
        }
    }

    week_labels()
        .into_iter()
        .zip(counts)
        .map(|(week, applications)| WeekBucket { week, applications })
        .collect()
}

/// Zero-based month indices of the trailing window, oldest first.
pub fn trailing_month_indices(current_month0: u32) -> Vec<usize> {
    (0..TRAILING_BUCKETS)
        .rev()
        .map(|i| (current_month0 as usize + 12 - i) % 12)
        .collect()
}

pub fn trailing_month_labels(current_month0: u32) -> Vec<&'static str> {
    trailing_month_indices(current_month0)
        .into_iter()
        .map(|index| MONTH_ABBREVIATIONS[index])
        .collect()
}

pub fn monthly_postings<Tz: TimeZone>(jobs: &[Job], now: &DateTime<Tz>) -> Vec<MonthBucket> {
    monthly_postings_with(jobs, now, MonthKeying::MonthOfYear)
}

pub fn monthly_postings_with<Tz: TimeZone>(
    jobs: &[Job],
    now: &DateTime<Tz>,
    keying: MonthKeying,
) -> Vec<MonthBucket> {
    let tz = now.timezone();
    let current = now.year() * 12 + now.month0() as i32;
    let mut by_month = [0u32; 12];
    let mut trailing = [0u32; TRAILING_BUCKETS];

    for job in jobs {
        let posted = match record_timestamp(&job.id, "postedDate", job.posted_date.as_deref()) {
            Ok(posted) => posted.with_timezone(&tz),
            Err(err) => {
                warn!("Skipping job in monthly series: {}", err);
                continue;
            }
        };

        by_month[posted.month0() as usize] += 1;

        let months_ago = current - (posted.year() * 12 + posted.month0() as i32);
        if (0..TRAILING_BUCKETS as i32).contains(&months_ago) {
            trailing[TRAILING_BUCKETS - 1 - months_ago as usize] += 1;
        }
    }

    trailing_month_indices(now.month0())
        .into_iter()
        .enumerate()
        .map(|(position, index)| MonthBucket {
            month: MONTH_ABBREVIATIONS[index].to_string(),
            jobs: match keying {
                MonthKeying::MonthOfYear => by_month[index],
                MonthKeying::CalendarMonth => trailing[position],
            },
        })
        .collect()
}
