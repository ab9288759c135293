//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{auth_guard, get_log_in_page, get_log_out, get_register_page, post_log_in, post_register},
    budget::{delete_budget_endpoint, get_budgets_page, set_budget_endpoint},
    dashboard::get_dashboard_page,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, edit_expense_endpoint,
        get_edit_expense_page,
    },
    export::{export_csv_endpoint, export_pdf_endpoint},
    not_found::get_404_not_found,
    profile::{get_profile_page, post_profile},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(
            endpoints::LOG_IN_VIEW,
            get(get_log_in_page).post(post_log_in),
        )
        .route(
            endpoints::REGISTER_VIEW,
            get(get_register_page).post(post_register),
        )
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ADD_EXPENSE, post(create_expense_endpoint))
        .route(
            endpoints::EDIT_EXPENSE_VIEW,
            get(get_edit_expense_page).post(edit_expense_endpoint),
        )
        .route(endpoints::DELETE_EXPENSE, post(delete_expense_endpoint))
        .route(endpoints::EXPORT_CSV, get(export_csv_endpoint))
        .route(endpoints::EXPORT_PDF, get(export_pdf_endpoint))
        .route(
            endpoints::PROFILE_VIEW,
            get(get_profile_page).post(post_profile),
        )
        .route(
            endpoints::BUDGETS_VIEW,
            get(get_budgets_page).post(set_budget_endpoint),
        )
        .route(endpoints::DELETE_BUDGET, post(delete_budget_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}
