//! Defines the endpoint for deleting an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints,
    expense::{ExpenseId, delete_expense, edit_page::UNAUTHORIZED_MSG},
    flash::set_flash,
    user::UserID,
};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<DeleteExpenseState> for Key {
    fn from_ref(state: &DeleteExpenseState) -> Self {
        state.cookie_key.clone()
    }
}

/// A route handler for deleting an expense, redirects to the dashboard with
/// a flash notice describing the outcome.
///
/// Rows that do not exist and rows owned by another user fail identically.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
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

    let alert = match delete_expense(expense_id, user_id, &connection) {
        Ok(()) => Alert::success("Expense deleted"),
        Err(Error::NotFound) => Alert::error(UNAUTHORIZED_MSG),
        Err(error) => {
            tracing::error!("could not delete expense {expense_id}: {error}");
            return error.into_response();
        }
    };

    let jar = set_flash(jar, &alert);
    (jar, Redirect::to(endpoints::DASHBOARD_VIEW)).into_response()
}
