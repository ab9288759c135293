//! Pie chart geometry for the PDF report.
//!
//! [pie_slices] turns a category breakdown into labelled slices with angles
//! and percentages; the PDF renderer draws them as filled polygons. Pure
//! arithmetic, no drawing here.

use std::f64::consts::TAU;

use crate::category::Category;

/// One slice of the pie: a category's share of the filtered total.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    /// The category the slice represents.
    pub category: Category,
    /// The summed amount for the category.
    pub value: f64,
    /// The slice's share of the total, in percent.
    pub percent: f64,
    /// Where the slice starts, in radians from the positive x axis.
    pub start_angle: f64,
    /// The angle the slice covers, in radians.
    pub sweep: f64,
}

/// Compute the slices for a category breakdown.
///
/// Returns `None` when the breakdown is empty or sums to zero, matching the
/// chart's absence on the dashboard. Zero-valued entries are skipped.
pub fn pie_slices(breakdown: &[(Category, f64)]) -> Option<Vec<PieSlice>> {
    let total: f64 = breakdown.iter().map(|(_, amount)| amount).sum();

    if breakdown.is_empty() || total <= 0.0 {
        return None;
    }

    let mut start_angle: f64 = 0.0;
    let slices = breakdown
        .iter()
        .filter(|(_, amount)| *amount > 0.0)
        .map(|&(category, value)| {
            let fraction = value / total;
            let slice = PieSlice {
                category,
                value,
                percent: fraction * 100.0,
                start_angle,
                sweep: fraction * TAU,
            };
            start_angle += slice.sweep;

            slice
        })
        .collect();

    Some(slices)
}
