//! Renders the budgets page: a form for setting a budget and a progress bar
//! for each existing one.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    budget::{Budget, BudgetStatus, budget_status, list_budgets},
    category::ALL_CATEGORIES,
    endpoints::{self, format_endpoint},
    expense::{ExpenseFilter, range::calendar_month_range, sum_expenses},
    flash::take_flash,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, format_currency,
    },
    navigation::NavBar,
    timezone::today_in,
    user::UserID,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<BudgetsPageState> for Key {
    fn from_ref(state: &BudgetsPageState) -> Self {
        state.cookie_key.clone()
    }
}

/// A budget row with its spend and status for the current calendar month.
struct BudgetRow {
    budget: Budget,
    spent: f64,
    status: BudgetStatus,
}

/// Display the budgets page.
///
/// Each budget shows the spend for the current calendar month against the
/// limit as a progress bar clamped to 100% width.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Response {
    let today = today_in(&state.local_timezone);
    let month = calendar_month_range(today);

    let rows = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        let queries = || -> Result<Vec<BudgetRow>, Error> {
            list_budgets(user_id, &connection)?
                .into_iter()
                .map(|budget| {
                    let spent = sum_expenses(
                        user_id,
                        &ExpenseFilter {
                            start: Some(*month.start()),
                            end: Some(*month.end()),
                            category: Some(budget.category),
                        },
                        &connection,
                    )?;

                    Ok(BudgetRow {
                        status: budget_status(spent, budget.monthly_limit),
                        spent,
                        budget,
                    })
                })
                .collect()
        };

        match queries() {
            Ok(rows) => rows,
            Err(error) => {
                tracing::error!("could not load budgets: {error}");
                return error.into_response();
            }
        }
    };

    let (jar, flash) = take_flash(jar);

    (jar, budgets_view(&rows, flash)).into_response()
}

fn budgets_view(rows: &[BudgetRow], flash: Option<Alert>) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW);

    let content = html! {
        (nav_bar.into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-md space-y-4"
            {
                @if let Some(alert) = flash {
                    (alert.into_html())
                }

                (set_budget_form())

                @if rows.is_empty() {
                    p class="text-gray-500 dark:text-gray-400" { "No budgets set yet." }
                } @else {
                    @for row in rows {
                        (budget_row_view(row))
                    }
                }
            }
        }
    };

    base("Budgets", &[], &content)
}

fn set_budget_form() -> Markup {
    html! {
        section class="bg-white rounded-lg shadow dark:bg-gray-800 p-4"
        {
            h2 class="text-lg font-semibold text-gray-900 dark:text-white mb-2" { "Set a monthly budget" }

            form method="post" action=(endpoints::BUDGETS_VIEW) class="flex flex-wrap items-end gap-4"
            {
                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                    select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for category in ALL_CATEGORIES {
                            option value=(category) { (category) }
                        }
                    }
                }

                div
                {
                    label for="limit" class=(FORM_LABEL_STYLE) { "Monthly limit" }
                    input
                        type="number"
                        name="limit"
                        id="limit"
                        step="0.01"
                        min="0.01"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) style="width: auto" { "Set budget" }
            }
        }
    }
}

fn budget_row_view(row: &BudgetRow) -> Markup {
    let bar_color = if row.status.is_over {
        "bg-rose-500"
    } else {
        "bg-emerald-500"
    };

    html! {
        section class="bg-white rounded-lg shadow dark:bg-gray-800 p-4"
        {
            div class="flex items-center justify-between mb-2"
            {
                span class="font-semibold text-gray-900 dark:text-white" { (row.budget.category) }

                span class="text-sm text-gray-500 dark:text-gray-400"
                {
                    (format_currency(row.spent))
                    " of "
                    (format_currency(row.budget.monthly_limit))
                    " (" (row.status.percent) "%)"
                }
            }

            div class="w-full h-3 bg-gray-200 rounded dark:bg-gray-700"
            {
                div
                    class={ "h-3 rounded " (bar_color) }
                    style={ "width: " (row.status.bar_width) "%" }
                {}
            }

            @if row.status.is_over {
                p class="mt-1 text-sm text-rose-500" { "Over budget!" }
            }

            form
                method="post"
                action=(format_endpoint(endpoints::DELETE_BUDGET, row.budget.id))
                class="mt-2"
            {
                button type="submit" class=(BUTTON_DELETE_STYLE) { "Delete" }
            }
        }
    }
}
