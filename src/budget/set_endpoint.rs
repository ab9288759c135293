//! Defines the endpoint for setting a budget.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar};
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    budget::{budgets_page::BudgetsPageState, set_budget},
    category::Category,
    endpoints,
    flash::set_flash,
    user::UserID,
};

/// The form data for setting a budget.
///
/// The limit is kept as a string so that an unparseable value becomes a
/// flash notice instead of a 422 response.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    /// The category display name.
    pub category: String,
    /// The monthly limit in dollars.
    pub limit: String,
}

/// A route handler for setting the budget for a category.
///
/// Writes are upserts: setting a budget for a category that already has one
/// overwrites its limit. Redirects back to the budgets page with a flash
/// notice either way.
pub async fn set_budget_endpoint(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<BudgetForm>,
) -> Response {
    let Some(category) = Category::from_name(form.category.trim()) else {
        let jar = set_flash(
            jar,
            &Alert::error(Error::UnknownCategory(form.category).to_string()),
        );
        return (jar, Redirect::to(endpoints::BUDGETS_VIEW)).into_response();
    };

    let Ok(limit) = form.limit.trim().parse::<f64>() else {
        let jar = set_flash(jar, &Alert::error("Invalid limit"));
        return (jar, Redirect::to(endpoints::BUDGETS_VIEW)).into_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let alert = match set_budget(category, limit, user_id, &connection) {
        Ok(budget) => Alert::success(format!("Budget set for {}", budget.category)),
        Err(error) => {
            tracing::error!("could not set budget: {error}");
            return error.into_response();
        }
    };

    let jar = set_flash(jar, &alert);
    (jar, Redirect::to(endpoints::BUDGETS_VIEW)).into_response()
}

#[cfg(test)]
mod set_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::State,
        http::StatusCode,
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;

    use crate::{
        app_state::create_cookie_key,
        budget::{Budget, budgets_page::BudgetsPageState, list_budgets},
        category::Category,
        db::initialize,
        endpoints,
        password::PasswordHash,
        user::{User, create_user},
    };

    use super::{BudgetForm, set_budget_endpoint};

    fn get_test_state() -> (BudgetsPageState, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();

        let state = BudgetsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
            cookie_key: create_cookie_key("foobar"),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user)
    }

    #[tokio::test]
    async fn sets_a_budget_and_redirects() {
        let (state, user) = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        let form = BudgetForm {
            category: "Food".to_owned(),
            limit: "200".to_owned(),
        };

        let response = set_budget_endpoint(
            State(state.clone()),
            Extension(user.id),
            jar,
            axum_extra::extract::Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::BUDGETS_VIEW
        );
        let connection = state.db_connection.lock().unwrap();
        let budgets = list_budgets(user.id, &connection).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].category, Category::Food);
        assert_eq!(budgets[0].monthly_limit, 200.0);
    }

    #[tokio::test]
    async fn setting_the_same_category_twice_updates_in_place() {
        let (state, user) = get_test_state();

        for limit in ["200", "350"] {
            let jar = PrivateCookieJar::new(state.cookie_key.clone());
            set_budget_endpoint(
                State(state.clone()),
                Extension(user.id),
                jar,
                axum_extra::extract::Form(BudgetForm {
                    category: "Food".to_owned(),
                    limit: limit.to_owned(),
                }),
            )
            .await;
        }

        let connection = state.db_connection.lock().unwrap();
        let budgets = list_budgets(user.id, &connection).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].monthly_limit, 350.0);
    }

    #[tokio::test]
    async fn rejects_unparseable_limit_without_writing() {
        let (state, user) = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        let form = BudgetForm {
            category: "Food".to_owned(),
            limit: "lots".to_owned(),
        };

        let response = set_budget_endpoint(
            State(state.clone()),
            Extension(user.id),
            jar,
            axum_extra::extract::Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            list_budgets(user.id, &connection).unwrap(),
            Vec::<Budget>::new()
        );
    }
}
