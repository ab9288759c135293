//! Defines the endpoint for creating a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    alert::Alert,
    category::{AUTO_CATEGORY, Category, categorize},
    endpoints,
    expense::{NewExpense, create_expense, range::parse_date_param},
    flash::set_flash,
    timezone::today_in,
    user::UserID,
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<CreateExpenseState> for Key {
    fn from_ref(state: &CreateExpenseState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for creating or editing an expense.
///
/// The amount is kept as a string so that an unparseable value becomes a
/// flash notice instead of a 422 response.
#[derive(Debug, Deserialize)]
pub struct ExpenseForm {
    /// The value of the expense in dollars.
    pub amount: String,
    /// Text detailing the expense.
    pub description: String,
    /// The category display name, or "Auto" to let the categorizer pick one.
    pub category: String,
    /// The date the money was spent, `YYYY-MM-DD`. Missing or malformed
    /// values fall back to today.
    pub date: Option<String>,
}

/// The result of parsing an [ExpenseForm]: the resolved category and whether
/// it was picked automatically.
pub(crate) struct ParsedExpenseForm {
    pub amount: f64,
    pub description: String,
    pub category: Category,
    pub auto_categorized: bool,
    pub date: Date,
}

/// Parse and resolve the expense form fields.
///
/// The category may be [AUTO_CATEGORY], in which case the categorizer picks
/// one from the description. `today` is used when the date is missing or
/// malformed.
pub(crate) fn parse_expense_form(
    form: &ExpenseForm,
    today: Date,
) -> Result<ParsedExpenseForm, Error> {
    let amount: f64 = form
        .amount
        .trim()
        .parse()
        .map_err(|_| Error::InvalidAmount)?;

    let description = form.description.trim().to_owned();

    let (category, auto_categorized) = if form.category == AUTO_CATEGORY {
        (categorize(&description), true)
    } else {
        match Category::from_name(&form.category) {
            Some(category) => (category, false),
            None => return Err(Error::UnknownCategory(form.category.clone())),
        }
    };

    let date = parse_date_param(form.date.as_deref()).unwrap_or(today);

    Ok(ParsedExpenseForm {
        amount,
        description,
        category,
        auto_categorized,
        date,
    })
}

/// A route handler for creating a new expense, redirects to the dashboard
/// with a flash notice describing the outcome.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let today = today_in(&state.local_timezone);

    let parsed = match parse_expense_form(&form, today) {
        Ok(parsed) => parsed,
        Err(error) => {
            let jar = set_flash(jar, &Alert::error(error.to_string()));
            return (jar, Redirect::to(endpoints::DASHBOARD_VIEW)).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let alert = match create_expense(
        NewExpense {
            description: parsed.description,
            amount: parsed.amount,
            category: parsed.category,
            date: parsed.date,
            user_id,
        },
        &connection,
    ) {
        Ok(expense) if parsed.auto_categorized => {
            Alert::success(format!("Expense added, filed under {}", expense.category))
        }
        Ok(_) => Alert::success("Expense added"),
        Err(error @ (Error::InvalidAmount | Error::EmptyDescription)) => {
            Alert::error(error.to_string())
        }
        Err(error) => {
            tracing::error!("could not create expense: {error}");
            return error.into_response();
        }
    };

    let jar = set_flash(jar, &alert);
    (jar, Redirect::to(endpoints::DASHBOARD_VIEW)).into_response()
}
