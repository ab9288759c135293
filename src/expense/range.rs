//! Date parsing and calendar month ranges used by the dashboard, budgets and
//! exports.

use std::ops::RangeInclusive;

use time::{Date, Duration, format_description::BorrowedFormatItem, macros::format_description};

/// The ISO date format used by query parameters and form fields.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Leniently parse an ISO `YYYY-MM-DD` date parameter.
///
/// Empty, missing and malformed values all yield `None`: a bad date narrows
/// nothing rather than failing the request.
pub fn parse_date_param(raw: Option<&str>) -> Option<Date> {
    let raw = raw?.trim();

    if raw.is_empty() {
        return None;
    }

    Date::parse(raw, DATE_FORMAT).ok()
}

/// The current month so far: the 1st of `today`'s month through `today`.
pub fn month_to_date_range(today: Date) -> RangeInclusive<Date> {
    first_of_month(today)..=today
}

/// The whole of the previous calendar month.
pub fn previous_month_range(today: Date) -> RangeInclusive<Date> {
    let last_month_end = first_of_month(today) - Duration::days(1);

    first_of_month(last_month_end)..=last_month_end
}

/// The whole calendar month containing `today`, including days still to come.
pub fn calendar_month_range(today: Date) -> RangeInclusive<Date> {
    let first = first_of_month(today);
    let last_day = today.month().length(today.year());
    let last = today.replace_day(last_day).unwrap();

    first..=last
}

fn first_of_month(date: Date) -> Date {
    date.replace_day(1).unwrap()
}
