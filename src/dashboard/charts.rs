//! Chart generation and rendering for the dashboard.
//!
//! Charts are generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization
//! code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisType, Label, Tooltip, Trigger},
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};
use time::Date;

use crate::{category::Category, html::HeadElement};

/// The ECharts runtime loaded into pages that render charts.
pub const ECHARTS_SCRIPT_URL: &str =
    "https://cdn.jsdelivr.net/npm/echarts@5.5.1/dist/echarts.min.js";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for dashboard charts.
pub fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Creates scripts that initialize ECharts instances with responsive
/// resizing.
pub fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// A pie chart of spending per category with percentage labels.
///
/// Returns `None` when the breakdown is empty or sums to zero: an empty pie
/// is worse than no pie.
pub fn category_pie_chart(breakdown: &[(Category, f64)]) -> Option<Chart> {
    let total: f64 = breakdown.iter().map(|(_, amount)| amount).sum();

    if breakdown.is_empty() || total <= 0.0 {
        return None;
    }

    let data: Vec<(f64, &str)> = breakdown
        .iter()
        .map(|(category, amount)| (*amount, category.as_str()))
        .collect();

    let chart = Chart::new()
        .title(Title::new().text("Spending by category"))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().top("bottom"))
        .series(
            Pie::new()
                .name("Spending by category")
                .radius("55%")
                .label(Label::new().show(true).formatter("{b}: {d}%"))
                .data(data),
        );

    Some(chart)
}

/// A bar chart of spending per day, ordered by date.
///
/// Returns `None` when the breakdown is empty.
pub fn daily_bar_chart(breakdown: &[(Date, f64)]) -> Option<Chart> {
    if breakdown.is_empty() {
        return None;
    }

    let labels: Vec<String> = breakdown.iter().map(|(date, _)| date.to_string()).collect();
    let values: Vec<f64> = breakdown.iter().map(|(_, amount)| *amount).collect();

    let chart = Chart::new()
        .title(Title::new().text("Spending by day"))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(Bar::new().name("Spent").data(values));

    Some(chart)
}
