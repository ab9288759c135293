//! Expense data aggregation for the dashboard cards, charts and reports.
//!
//! These are pure functions over already-fetched expense rows plus the
//! month-over-month and projection arithmetic. Keeping them free of I/O makes
//! the dashboard's numbers easy to test.

use std::collections::HashMap;

use time::Date;

use crate::{category::Category, expense::Expense};

/// Sum the amounts of `expenses`. An empty slice sums to zero.
pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// Sum expense amounts grouped by category, each value rounded to two
/// decimal places.
///
/// Only categories present in `expenses` appear in the output, ordered as in
/// the fixed category set so the chart legend is stable.
pub fn category_breakdown(expenses: &[Expense]) -> Vec<(Category, f64)> {
    let mut totals: HashMap<Category, f64> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category).or_insert(0.0) += expense.amount;
    }

    crate::category::ALL_CATEGORIES
        .into_iter()
        .filter_map(|category| {
            totals
                .get(&category)
                .map(|&amount| (category, round_to_cents(amount)))
        })
        .collect()
}

/// Sum expense amounts grouped by calendar date, ordered ascending by date,
/// each value rounded to two decimal places.
pub fn daily_breakdown(expenses: &[Expense]) -> Vec<(Date, f64)> {
    let mut totals: HashMap<Date, f64> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.date).or_insert(0.0) += expense.amount;
    }

    let mut breakdown: Vec<(Date, f64)> = totals
        .into_iter()
        .map(|(date, amount)| (date, round_to_cents(amount)))
        .collect();
    breakdown.sort_by_key(|(date, _)| *date);

    breakdown
}

/// How this month's spending compares to the previous calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonthComparison {
    /// The previous month has no spending to compare against.
    NoData,
    /// Spending is up by the contained percentage.
    More(f64),
    /// Spending is down by the contained percentage.
    Less(f64),
    /// Spending is exactly the same.
    Same,
}

impl MonthComparison {
    /// The user-facing comparison message.
    pub fn message(&self) -> String {
        match self {
            MonthComparison::NoData => "No data for last month".to_owned(),
            MonthComparison::More(percent) => format!("{percent:.0}% MORE than last month"),
            MonthComparison::Less(percent) => format!("{percent:.0}% LESS than last month"),
            MonthComparison::Same => "Same as last month".to_owned(),
        }
    }

    /// The text colour class for the comparison message.
    pub fn css_class(&self) -> &'static str {
        match self {
            MonthComparison::More(_) => "text-rose-400",
            MonthComparison::Less(_) => "text-emerald-400",
            MonthComparison::NoData | MonthComparison::Same => "text-slate-400",
        }
    }
}

/// Compare this month's spending (1st through today) against the whole of
/// the previous calendar month.
///
/// The percentage delta is `(this - last) / last * 100`. A previous month
/// with no spending yields [MonthComparison::NoData] rather than a division
/// by zero.
pub fn month_comparison(this_month: f64, last_month: f64) -> MonthComparison {
    if last_month <= 0.0 {
        return MonthComparison::NoData;
    }

    let percent = (this_month - last_month) / last_month * 100.0;

    if percent > 0.0 {
        MonthComparison::More(percent)
    } else if percent < 0.0 {
        MonthComparison::Less(-percent)
    } else {
        MonthComparison::Same
    }
}

/// Linearly project this month's total spend to the end of the month.
///
/// The daily average over the elapsed days of the month (`this_month_sum`
/// divided by today's day-of-month) is scaled to the month's full length.
pub fn month_projection(this_month_sum: f64, today: Date) -> f64 {
    let elapsed_days = today.day();
    let daily_average = this_month_sum / f64::from(elapsed_days);
    let days_in_month = today.month().length(today.year());

    daily_average * f64::from(days_in_month)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
