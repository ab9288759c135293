//! Renders the page for editing an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    category::ALL_CATEGORIES,
    endpoints::{self, format_endpoint},
    expense::{Expense, ExpenseId, get_expense},
    flash::{set_flash, take_flash},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base,
    },
    navigation::NavBar,
    user::UserID,
};

/// The flash notice shown when a user tries to act on a row that does not
/// exist or belongs to someone else. One message for both cases so the two
/// are indistinguishable.
pub(crate) const UNAUTHORIZED_MSG: &str = "Unauthorized";

/// The state needed for the edit expense page.
#[derive(Debug, Clone)]
pub struct EditExpensePageState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for EditExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<EditExpensePageState> for Key {
    fn from_ref(state: &EditExpensePageState) -> Self {
        state.cookie_key.clone()
    }
}

fn edit_expense_view(expense: &Expense, flash: Option<Alert>) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_EXPENSE_VIEW);
    let edit_endpoint = format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense.id);

    let content = html! {
        (nav_bar.into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            @if let Some(alert) = flash {
                (alert.into_html())
            }

            div class="w-full max-w-md bg-white rounded-lg shadow dark:bg-gray-800 p-6 space-y-4"
            {
                h1 class="text-xl font-bold text-gray-900 dark:text-white" { "Edit expense" }

                form method="post" action=(edit_endpoint) class="space-y-4"
                {
                    div
                    {
                        label for="description" class=(FORM_LABEL_STYLE) { "Description" }
                        input
                            type="text"
                            name="description"
                            id="description"
                            class=(FORM_TEXT_INPUT_STYLE)
                            value=(expense.description)
                            required;
                    }

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
                            value=(format!("{:.2}", expense.amount))
                            required;
                    }

                    div
                    {
                        label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                        select name="category" id="category" class=(FORM_TEXT_INPUT_STYLE)
                        {
                            // "Auto" is only offered at creation.
                            @for category in ALL_CATEGORIES {
                                option
                                    value=(category)
                                    selected[category == expense.category]
                                {
                                    (category)
                                }
                            }
                        }
                    }

                    div
                    {
                        label for="date" class=(FORM_LABEL_STYLE) { "Date" }
                        input
                            type="date"
                            name="date"
                            id="date"
                            class=(FORM_TEXT_INPUT_STYLE)
                            value=(expense.date);
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save changes" }
                }

                a
                    href=(endpoints::DASHBOARD_VIEW)
                    class="block text-sm text-blue-600 hover:text-blue-500 dark:text-blue-500"
                {
                    "Back to dashboard"
                }
            }
        }
    };

    base("Edit Expense", &[], &content)
}

/// Renders the page for editing an expense.
///
/// Requests for rows that do not exist or belong to another user are
/// redirected to the dashboard with an "Unauthorized" notice.
pub async fn get_edit_expense_page(
    State(state): State<EditExpensePageState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Path(expense_id): Path<ExpenseId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let expense = match get_expense(expense_id, user_id, &connection) {
        Ok(expense) => expense,
        Err(Error::NotFound) => {
            let jar = set_flash(jar, &Alert::error(UNAUTHORIZED_MSG));
            return (jar, Redirect::to(endpoints::DASHBOARD_VIEW)).into_response();
        }
        Err(error) => {
            tracing::error!("Failed to retrieve expense {expense_id}: {error}");
            return error.into_response();
        }
    };

    let (jar, flash) = take_flash(jar);

    (jar, edit_expense_view(&expense, flash)).into_response()
}
