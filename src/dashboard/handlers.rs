//! Dashboard HTTP handler and view rendering.
//!
//! The dashboard is the landing page: summary cards, the filter and add
//! forms, charts and the filtered expense table.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    alert::Alert,
    category::{ALL_CATEGORIES, AUTO_CATEGORY},
    dashboard::{
        aggregation::{
            MonthComparison, category_breakdown, daily_breakdown, month_comparison,
            month_projection, total,
        },
        charts::{
            DashboardChart, ECHARTS_SCRIPT_URL, category_pie_chart, charts_script, charts_view,
            daily_bar_chart,
        },
    },
    endpoints::{self, format_endpoint},
    expense::{
        Expense, ExpenseFilter, ExpenseOrder, FilterQuery, list_expenses,
        range::{month_to_date_range, previous_month_range},
        sum_expenses,
    },
    flash::take_flash,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base, format_currency,
    },
    navigation::NavBar,
    timezone::today_in,
    user::UserID,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<DashboardState> for Key {
    fn from_ref(state: &DashboardState) -> Self {
        state.cookie_key.clone()
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData<'a> {
    query: &'a FilterQuery,
    expenses: &'a [Expense],
    filtered_total: f64,
    lifetime_total: f64,
    this_month_total: f64,
    comparison: MonthComparison,
    projected_total: f64,
    charts: Vec<DashboardChart>,
    today: Date,
    flash: Option<Alert>,
}

/// Display a page with an overview of the user's expenses.
///
/// The `start`, `end` and `category` query parameters narrow the expense
/// list, the filtered total and the charts. The lifetime total, monthly
/// comparison and projection always cover all of the user's data.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Query(query): Query<FilterQuery>,
) -> Response {
    let filter = query.to_filter();
    let today = today_in(&state.local_timezone);

    let (expenses, lifetime_total, this_month_total, last_month_total) = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        let queries = || -> Result<(Vec<Expense>, f64, f64, f64), Error> {
            let expenses =
                list_expenses(user_id, &filter, ExpenseOrder::DateDescending, &connection)?;
            let lifetime_total = sum_expenses(user_id, &ExpenseFilter::default(), &connection)?;

            let this_month = month_to_date_range(today);
            let this_month_total = sum_expenses(
                user_id,
                &ExpenseFilter {
                    start: Some(*this_month.start()),
                    end: Some(*this_month.end()),
                    category: None,
                },
                &connection,
            )?;

            let last_month = previous_month_range(today);
            let last_month_total = sum_expenses(
                user_id,
                &ExpenseFilter {
                    start: Some(*last_month.start()),
                    end: Some(*last_month.end()),
                    category: None,
                },
                &connection,
            )?;

            Ok((expenses, lifetime_total, this_month_total, last_month_total))
        };

        match queries() {
            Ok(results) => results,
            Err(error) => {
                tracing::error!("could not load dashboard data: {error}");
                return error.into_response();
            }
        }
    };

    let charts = [
        category_pie_chart(&category_breakdown(&expenses))
            .map(|chart| DashboardChart {
                id: "category-chart",
                options: chart.to_string(),
            }),
        daily_bar_chart(&daily_breakdown(&expenses)).map(|chart| DashboardChart {
            id: "daily-chart",
            options: chart.to_string(),
        }),
    ]
    .into_iter()
    .flatten()
    .collect();

    let (jar, flash) = take_flash(jar);

    let data = DashboardData {
        query: &query,
        expenses: &expenses,
        filtered_total: total(&expenses),
        lifetime_total,
        this_month_total,
        comparison: month_comparison(this_month_total, last_month_total),
        projected_total: month_projection(this_month_total, today),
        charts,
        today,
        flash,
    };

    (jar, dashboard_view(&data)).into_response()
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    let mut head_elements = vec![];
    if !data.charts.is_empty() {
        head_elements.push(HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned()));
        head_elements.push(charts_script(&data.charts));
    }

    let content = html! {
        (nav_bar.into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-4"
            {
                @if let Some(alert) = data.flash.clone() {
                    (alert.into_html())
                }

                (summary_cards(data))
                (filter_form(data.query))
                (add_expense_form(data.today))

                @if !data.charts.is_empty() {
                    (charts_view(&data.charts))
                }

                (expenses_table(data.expenses))
            }
        }
    };

    base("Dashboard", &head_elements, &content)
}

fn summary_card(title: &str, value: &str, detail: Option<(&str, &str)>) -> Markup {
    html! {
        div class="bg-white rounded-lg shadow dark:bg-gray-800 p-4"
        {
            p class="text-sm text-gray-500 dark:text-gray-400" { (title) }
            p class="text-2xl font-bold text-gray-900 dark:text-white" { (value) }

            @if let Some((message, css_class)) = detail {
                p class={ "text-sm " (css_class) } { (message) }
            }
        }
    }
}

fn summary_cards(data: &DashboardData) -> Markup {
    let comparison_message = data.comparison.message();

    html! {
        section class="grid grid-cols-1 md:grid-cols-4 gap-4"
        {
            (summary_card("Filtered total", &format_currency(data.filtered_total), None))
            (summary_card("Lifetime total", &format_currency(data.lifetime_total), None))
            (summary_card(
                "This month",
                &format_currency(data.this_month_total),
                Some((comparison_message.as_str(), data.comparison.css_class())),
            ))
            (summary_card(
                "Projected month-end",
                &format_currency(data.projected_total),
                None,
            ))
        }
    }
}

fn filter_form(query: &FilterQuery) -> Markup {
    let start = query.start.as_deref().unwrap_or("");
    let end = query.end.as_deref().unwrap_or("");
    let selected_category = query.category.as_deref().unwrap_or("");

    html! {
        section class="bg-white rounded-lg shadow dark:bg-gray-800 p-4"
        {
            form method="get" action=(endpoints::DASHBOARD_VIEW) class="flex flex-wrap items-end gap-4"
            {
                div
                {
                    label for="start" class=(FORM_LABEL_STYLE) { "From" }
                    input type="date" name="start" id="start" class=(FORM_TEXT_INPUT_STYLE) value=(start);
                }

                div
                {
                    label for="end" class=(FORM_LABEL_STYLE) { "To" }
                    input type="date" name="end" id="end" class=(FORM_TEXT_INPUT_STYLE) value=(end);
                }

                div
                {
                    label for="filter-category" class=(FORM_LABEL_STYLE) { "Category" }
                    select name="category" id="filter-category" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" selected[selected_category.is_empty()] { "All categories" }

                        @for category in ALL_CATEGORIES {
                            option
                                value=(category)
                                selected[category.as_str() == selected_category]
                            {
                                (category)
                            }
                        }
                    }
                }

                button type="submit" class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600 text-white rounded"
                {
                    "Apply"
                }

                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE) { "Clear" }
                a href=(export_href(endpoints::EXPORT_CSV, query)) class=(LINK_STYLE) { "Export CSV" }
                a href=(export_href(endpoints::EXPORT_PDF, query)) class=(LINK_STYLE) { "Export PDF" }
            }
        }
    }
}

/// Build an export link carrying the active filter parameters.
fn export_href(base: &str, query: &FilterQuery) -> String {
    let pairs: Vec<(&str, &str)> = [
        ("start", query.start.as_deref()),
        ("end", query.end.as_deref()),
        ("category", query.category.as_deref()),
    ]
    .into_iter()
    .filter_map(|(name, value)| value.filter(|value| !value.is_empty()).map(|value| (name, value)))
    .collect();

    if pairs.is_empty() {
        return base.to_owned();
    }

    match serde_urlencoded::to_string(&pairs) {
        Ok(params) => format!("{base}?{params}"),
        Err(_) => base.to_owned(),
    }
}

fn add_expense_form(today: Date) -> Markup {
    html! {
        section class="bg-white rounded-lg shadow dark:bg-gray-800 p-4"
        {
            h2 class="text-lg font-semibold text-gray-900 dark:text-white mb-2" { "Add expense" }

            form method="post" action=(endpoints::ADD_EXPENSE) class="flex flex-wrap items-end gap-4"
            {
                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }
                    input
                        type="number"
                        name="amount"
                        id="amount"
                        step="0.01"
                        min="0.01"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                div class="grow"
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                    input
                        type="text"
                        name="description"
                        id="description"
                        placeholder="e.g. Weekly groceries"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                    select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value=(AUTO_CATEGORY) { "Auto (pick for me)" }

                        @for category in ALL_CATEGORIES {
                            option value=(category) { (category) }
                        }
                    }
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                    input type="date" name="date" id="date" class=(FORM_TEXT_INPUT_STYLE) value=(today);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) style="width: auto" { "Add" }
            }
        }
    }
}

fn expenses_table(expenses: &[Expense]) -> Markup {
    html! {
        section class="bg-white rounded-lg shadow dark:bg-gray-800 overflow-x-auto"
        {
            @if expenses.is_empty() {
                p class="p-4 text-gray-500 dark:text-gray-400" { "No expenses recorded for this period." }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th class=(TABLE_CELL_STYLE) { "Date" }
                            th class=(TABLE_CELL_STYLE) { "Description" }
                            th class=(TABLE_CELL_STYLE) { "Category" }
                            th class=(TABLE_CELL_STYLE) { "Amount" }
                            th class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for expense in expenses {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE) { (expense.date) }
                                td class=(TABLE_CELL_STYLE) { (expense.description) }
                                td class=(TABLE_CELL_STYLE) { (expense.category) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(expense.amount)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    div class="flex gap-3"
                                    {
                                        a
                                            href=(format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id))
                                            class=(LINK_STYLE)
                                        {
                                            "Edit"
                                        }

                                        form
                                            method="post"
                                            action=(format_endpoint(endpoints::DELETE_EXPENSE, expense.id))
                                        {
                                            button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod dashboard_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        body::Body,
        extract::{Query, State},
        http::{Response, StatusCode},
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        app_state::create_cookie_key,
        category::Category,
        db::initialize,
        expense::{FilterQuery, NewExpense, create_expense},
        password::PasswordHash,
        user::{User, create_user},
    };

    use super::{DashboardState, get_dashboard_page};

    fn get_test_state() -> (DashboardState, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();

        let state = DashboardState {
            db_connection: Arc::new(Mutex::new(conn)),
            cookie_key: create_cookie_key("foobar"),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user)
    }

    fn add_expense(state: &DashboardState, user: &User, description: &str, amount: f64) {
        let connection = state.db_connection.lock().unwrap();
        create_expense(
            NewExpense {
                description: description.to_owned(),
                amount,
                category: Category::Food,
                date: date!(2024 - 03 - 01),
                user_id: user.id,
            },
            &connection,
        )
        .unwrap();
    }

    async fn body_text(response: Response<Body>) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&body).to_string()
    }

    #[tokio::test]
    async fn renders_expenses_and_charts() {
        let (state, user) = get_test_state();
        add_expense(&state, &user, "Morning coffee", 4.5);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_dashboard_page(
            State(state),
            Extension(user.id),
            jar,
            Query(FilterQuery::default()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("Morning coffee"));
        assert!(text.contains("category-chart"), "want the category chart container");
        assert!(text.contains("echarts"), "want the chart runtime script");
    }

    #[tokio::test]
    async fn renders_empty_state_without_charts() {
        let (state, user) = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_dashboard_page(
            State(state),
            Extension(user.id),
            jar,
            Query(FilterQuery::default()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("No expenses recorded"));
        assert!(
            !text.contains("category-chart"),
            "no chart container should be rendered without data"
        );
    }

    #[tokio::test]
    async fn does_not_show_other_users_expenses() {
        let (state, user) = get_test_state();
        let other_user = {
            let connection = state.db_connection.lock().unwrap();
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &connection).unwrap()
        };
        add_expense(&state, &other_user, "Secret purchase", 99.0);
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_dashboard_page(
            State(state),
            Extension(user.id),
            jar,
            Query(FilterQuery::default()),
        )
        .await;

        let text = body_text(response).await;
        assert!(
            !text.contains("Secret purchase"),
            "one user's dashboard must not show another user's rows"
        );
    }

    #[tokio::test]
    async fn category_filter_narrows_the_table() {
        let (state, user) = get_test_state();
        add_expense(&state, &user, "Morning coffee", 4.5);
        {
            let connection = state.db_connection.lock().unwrap();
            create_expense(
                NewExpense {
                    description: "Bus fare".to_owned(),
                    amount: 3.0,
                    category: Category::Transport,
                    date: date!(2024 - 03 - 02),
                    user_id: user.id,
                },
                &connection,
            )
            .unwrap();
        }
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = get_dashboard_page(
            State(state),
            Extension(user.id),
            jar,
            Query(FilterQuery {
                category: Some("Transport".to_owned()),
                ..Default::default()
            }),
        )
        .await;

        let text = body_text(response).await;
        assert!(text.contains("Bus fare"));
        assert!(!text.contains("Morning coffee"));
    }
}
