//! Budgets: per-category monthly spending ceilings, their queries and the
//! HTTP endpoints for setting, viewing and deleting them.

pub mod budgets_page;
pub mod core;
pub mod delete_endpoint;
pub mod set_endpoint;

pub use budgets_page::get_budgets_page;
pub use self::core::{
    Budget, BudgetId, BudgetStatus, budget_status, create_budget_table, delete_budget,
    list_budgets, set_budget,
};
pub use delete_endpoint::delete_budget_endpoint;
pub use set_endpoint::set_budget_endpoint;
