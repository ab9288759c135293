//! Expenses: the core data model, database queries and the HTTP endpoints
//! for creating, editing and deleting them.

pub mod core;
pub mod create_endpoint;
pub mod delete_endpoint;
pub mod edit_endpoint;
pub mod edit_page;
pub mod range;

pub use self::core::{
    Expense, ExpenseFilter, ExpenseId, ExpenseOrder, FilterQuery, NewExpense,
    create_expense, create_expense_table, delete_expense, get_expense, list_expenses,
    sum_expenses, update_expense,
};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use edit_endpoint::edit_expense_endpoint;
pub use edit_page::get_edit_expense_page;
