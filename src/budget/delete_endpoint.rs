//! Defines the endpoint for deleting a budget.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Error,
    alert::Alert,
    budget::{BudgetId, budgets_page::BudgetsPageState, delete_budget},
    endpoints,
    flash::set_flash,
    user::UserID,
};

/// A route handler for deleting a budget, redirects to the budgets page with
/// a flash notice describing the outcome.
///
/// Rows that do not exist and rows owned by another user fail identically.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Path(budget_id): Path<BudgetId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let alert = match delete_budget(budget_id, user_id, &connection) {
        Ok(()) => Alert::success("Budget deleted"),
        Err(Error::NotFound) => Alert::error("Error deleting budget"),
        Err(error) => {
            tracing::error!("could not delete budget {budget_id}: {error}");
            return error.into_response();
        }
    };

    let jar = set_flash(jar, &alert);
    (jar, Redirect::to(endpoints::BUDGETS_VIEW)).into_response()
}
