//! Accounting-period math. A period is the half-open interval `[start, end)`
//! within which a goal may be completed exactly once.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::Recurrence;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// The current period for a recurrence type, anchored to `now`.
///
/// Pure over its inputs; callers inject `now` (see `clock::Clock`) so tests
/// can freeze it. `now` carries the caller's UTC offset and boundaries fall
/// on *local* midnights: a user at UTC-8 gets one daily period per local
/// calendar day, not per UTC day. Weeks start on Monday (ISO), months and
/// quarters follow the calendar. A custom goal's period runs from the start
/// of today to the end of its deadline day, degenerating to daily when no
/// deadline is set.
pub fn current_period(
    recurrence: Recurrence,
    custom_deadline: Option<NaiveDate>,
    now: DateTime<FixedOffset>,
) -> Period {
    let today = now.date_naive();
    let offset = *now.offset();

    match recurrence {
        Recurrence::Daily => day_span(today, today, offset),
        Recurrence::Weekly => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            day_span(monday, monday + Duration::days(6), offset)
        }
        Recurrence::Monthly => {
            let first = month_start(today.year(), today.month());
            let next = if today.month() == 12 {
                month_start(today.year() + 1, 1)
            } else {
                month_start(today.year(), today.month() + 1)
            };
            Period {
                start: midnight(first, offset),
                end: midnight(next, offset),
            }
        }
        Recurrence::Quarterly => {
            let quarter_month = ((today.month() - 1) / 3) * 3 + 1;
            let first = month_start(today.year(), quarter_month);
            let next = if quarter_month >= 10 {
                month_start(today.year() + 1, 1)
            } else {
                month_start(today.year(), quarter_month + 3)
            };
            Period {
                start: midnight(first, offset),
                end: midnight(next, offset),
            }
        }
        Recurrence::Custom => day_span(today, custom_deadline.unwrap_or(today), offset),
    }
}

/// `[start of first_day, start of the day after last_day)`, local days.
fn day_span(first_day: NaiveDate, last_day: NaiveDate, offset: FixedOffset) -> Period {
    Period {
        start: midnight(first_day, offset),
        end: midnight(last_day + Duration::days(1), offset),
    }
}

/// The instant the local calendar day begins, as UTC.
fn midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(date.and_time(NaiveTime::MIN) - offset))
}

fn month_start(year: i32, month: u32) -> NaiveDate {
    // month is always 1..=12 here
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is a valid date")
}
