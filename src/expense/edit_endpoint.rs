//! Defines the endpoint that applies an edit to an expense.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar};

use crate::{
    Error,
    alert::Alert,
    endpoints::{self, format_endpoint},
    expense::{
        ExpenseId, NewExpense,
        create_endpoint::{CreateExpenseState, ExpenseForm, parse_expense_form},
        edit_page::UNAUTHORIZED_MSG,
        update_expense,
    },
    flash::set_flash,
    timezone::today_in,
    user::UserID,
};

/// A route handler for applying an edit to an expense.
///
/// Validation applies the same rules as creation. Validation failures
/// redirect back to the edit form; success and authorization failures
/// redirect to the dashboard. "Auto" is not offered here: the category is
/// stored exactly as submitted.
pub async fn edit_expense_endpoint(
    State(state): State<CreateExpenseState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Path(expense_id): Path<ExpenseId>,
    Form(form): Form<ExpenseForm>,
) -> Response {
    let today = today_in(&state.local_timezone);
    let edit_view = format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense_id);

    let parsed = match parse_expense_form(&form, today) {
        Ok(parsed) => parsed,
        Err(error) => {
            let jar = set_flash(jar, &Alert::error(error.to_string()));
            return (jar, Redirect::to(&edit_view)).into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let result = update_expense(
        NewExpense {
            description: parsed.description,
            amount: parsed.amount,
            category: parsed.category,
            date: parsed.date,
            user_id,
        },
        expense_id,
        &connection,
    );

    match result {
        Ok(()) => {
            let jar = set_flash(jar, &Alert::success("Expense updated"));
            (jar, Redirect::to(endpoints::DASHBOARD_VIEW)).into_response()
        }
        Err(error @ (Error::InvalidAmount | Error::EmptyDescription)) => {
            let jar = set_flash(jar, &Alert::error(error.to_string()));
            (jar, Redirect::to(&edit_view)).into_response()
        }
        Err(Error::NotFound) => {
            let jar = set_flash(jar, &Alert::error(UNAUTHORIZED_MSG));
            (jar, Redirect::to(endpoints::DASHBOARD_VIEW)).into_response()
        }
        Err(error) => {
            tracing::error!("could not update expense {expense_id}: {error}");
            error.into_response()
        }
    }
}

#[cfg(test)]
mod edit_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        app_state::create_cookie_key,
        category::Category,
        db::initialize,
        expense::{
            Expense, NewExpense, create_endpoint::{CreateExpenseState, ExpenseForm},
            create_expense, get_expense,
        },
        password::PasswordHash,
        user::{User, create_user},
    };

    use super::edit_expense_endpoint;

    fn get_test_state() -> (CreateExpenseState, User, Expense) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        let expense = create_expense(
            NewExpense {
                description: "Coffee".to_owned(),
                amount: 4.5,
                category: Category::Food,
                date: date!(2024 - 03 - 01),
                user_id: user.id,
            },
            &conn,
        )
        .unwrap();

        let state = CreateExpenseState {
            db_connection: Arc::new(Mutex::new(conn)),
            cookie_key: create_cookie_key("foobar"),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user, expense)
    }

    #[tokio::test]
    async fn applies_the_edit() {
        let (state, user, expense) = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        let form = ExpenseForm {
            amount: "7.00".to_owned(),
            description: "Fancy coffee".to_owned(),
            category: "Food".to_owned(),
            date: Some("2024-03-02".to_owned()),
        };

        let response = edit_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            jar,
            Path(expense.id),
            axum_extra::extract::Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let updated = get_expense(expense.id, user.id, &connection).unwrap();
        assert_eq!(updated.description, "Fancy coffee");
        assert_eq!(updated.amount, 7.0);
        assert_eq!(updated.date, date!(2024 - 03 - 02));
    }

    #[tokio::test]
    async fn rejects_invalid_amount_and_leaves_row_unchanged() {
        let (state, user, expense) = get_test_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        let form = ExpenseForm {
            amount: "0".to_owned(),
            description: "Fancy coffee".to_owned(),
            category: "Food".to_owned(),
            date: None,
        };

        let response = edit_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            jar,
            Path(expense.id),
            axum_extra::extract::Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let unchanged = get_expense(expense.id, user.id, &connection).unwrap();
        assert_eq!(unchanged, expense);
    }

    #[tokio::test]
    async fn rejects_edit_by_non_owner() {
        let (state, owner, expense) = get_test_state();
        let other_user = {
            let connection = state.db_connection.lock().unwrap();
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &connection).unwrap()
        };
        let jar = PrivateCookieJar::new(state.cookie_key.clone());
        let form = ExpenseForm {
            amount: "1.00".to_owned(),
            description: "Hijacked".to_owned(),
            category: "Other".to_owned(),
            date: None,
        };

        let response = edit_expense_endpoint(
            State(state.clone()),
            Extension(other_user.id),
            jar,
            Path(expense.id),
            axum_extra::extract::Form(form),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let unchanged = get_expense(expense.id, owner.id, &connection).unwrap();
        assert_eq!(unchanged, expense);
    }
}
