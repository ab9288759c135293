//! Defines the core data model and database queries for expenses.

use rusqlite::{Connection, Row, params_from_iter};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    category::Category,
    expense::range::parse_date_param,
    user::UserID,
};

/// The database ID of an expense row.
pub type ExpenseId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// A single spend: some money that left the user's pocket on a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// A text description of what the money was spent on.
    pub description: String,
    /// How much was spent. Always greater than zero.
    pub amount: f64,
    /// The category the expense belongs to.
    pub category: Category,
    /// When the money was spent.
    pub date: Date,
    /// The user the expense belongs to.
    pub user_id: UserID,
}

/// The fields needed to create an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// A text description of what the money was spent on.
    pub description: String,
    /// How much was spent. Must be greater than zero.
    pub amount: f64,
    /// The category the expense belongs to.
    pub category: Category,
    /// When the money was spent.
    pub date: Date,
    /// The user the expense belongs to.
    pub user_id: UserID,
}

/// The (start date, end date, category) triple narrowing which expense rows a
/// query considers. All conditions are combined conjunctively; `None` leaves
/// that dimension unfiltered. Both dates are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Only include expenses on or after this date.
    pub start: Option<Date>,
    /// Only include expenses on or before this date.
    pub end: Option<Date>,
    /// Only include expenses with exactly this category.
    pub category: Option<Category>,
}

/// The `start`, `end` and `category` query parameters shared by the dashboard
/// and the export routes.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    /// Start date as `YYYY-MM-DD`.
    pub start: Option<String>,
    /// End date as `YYYY-MM-DD`.
    pub end: Option<String>,
    /// Category display name.
    pub category: Option<String>,
}

impl FilterQuery {
    /// Leniently convert the raw query parameters into a filter.
    ///
    /// Malformed dates and unknown category names act as "unfiltered" rather
    /// than erroring: the UI only emits valid values.
    pub fn to_filter(&self) -> ExpenseFilter {
        ExpenseFilter {
            start: parse_date_param(self.start.as_deref()),
            end: parse_date_param(self.end.as_deref()),
            category: self
                .category
                .as_deref()
                .map(str::trim)
                .and_then(Category::from_name),
        }
    }
}

/// The row order for [list_expenses].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseOrder {
    /// Oldest first. Used by the exports.
    DateAscending,
    /// Newest first, newest insert breaking ties. Used by the dashboard.
    DateDescending,
}

impl ExpenseOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            ExpenseOrder::DateAscending => "date ASC, id ASC",
            ExpenseOrder::DateDescending => "date DESC, id DESC",
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Check the invariants enforced on every write: a positive amount and a
/// non-empty description.
fn validate_fields(amount: f64, description: &str) -> Result<(), Error> {
    // `!(amount > 0.0)` also rejects NaN.
    if !(amount > 0.0) {
        return Err(Error::InvalidAmount);
    }

    if description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    Ok(())
}

/// Create a new expense in the database.
///
/// The description is stored trimmed of surrounding whitespace.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is not greater than zero,
/// - [Error::EmptyDescription] if the description is empty after trimming,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// On a validation error nothing is written to the database.
pub fn create_expense(new_expense: NewExpense, connection: &Connection) -> Result<Expense, Error> {
    validate_fields(new_expense.amount, &new_expense.description)?;

    let expense = connection
        .prepare(
            "INSERT INTO expense (description, amount, category, date, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, description, amount, category, date, user_id",
        )?
        .query_one(
            (
                new_expense.description.trim(),
                new_expense.amount,
                new_expense.category.as_str(),
                new_expense.date,
                new_expense.user_id.as_i64(),
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve the expense `id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by
///   `user_id` — rows owned by other users are indistinguishable from rows
///   that do not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(
    id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, description, amount, category, date, user_id
             FROM expense WHERE id = :id AND user_id = :user_id",
        )?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_expense_row,
        )?;

    Ok(expense)
}

/// Retrieve the expenses of `user_id` matching `filter`, ordered by `order`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_expenses(
    user_id: UserID,
    filter: &ExpenseFilter,
    order: ExpenseOrder,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let (where_clause, params) = build_filter_clause(user_id, filter);
    let query = format!(
        "SELECT id, description, amount, category, date, user_id
         FROM expense WHERE {where_clause} ORDER BY {}",
        order.as_sql()
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(params), map_expense_row)?
        .collect::<Result<Vec<Expense>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Sum the amounts of the expenses of `user_id` matching `filter`.
///
/// An empty result set sums to zero, never an error.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn sum_expenses(
    user_id: UserID,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<f64, Error> {
    let (where_clause, params) = build_filter_clause(user_id, filter);
    let query = format!("SELECT COALESCE(SUM(amount), 0.0) FROM expense WHERE {where_clause}");

    connection
        .prepare(&query)?
        .query_one(params_from_iter(params), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Overwrite the fields of the expense `id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] or [Error::EmptyDescription] on a validation
///   failure, in which case nothing is written,
/// - [Error::NotFound] if `id` does not refer to an expense owned by
///   `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    fields: NewExpense,
    id: ExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    validate_fields(fields.amount, &fields.description)?;

    let rows_affected = connection.execute(
        "UPDATE expense SET description = ?1, amount = ?2, category = ?3, date = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            fields.description.trim(),
            fields.amount,
            fields.category.as_str(),
            fields.date,
            id,
            fields.user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete the expense `id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to an expense owned by
///   `user_id` — deleting an already-deleted row reports the same failure as
///   deleting one that never existed,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_expense(
    id: ExpenseId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the expense table.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Composite index used by the dashboard and export queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Build the conjunctive WHERE clause for `filter`, scoped to `user_id`.
///
/// All parameters are passed as strings; dates serialize to ISO `YYYY-MM-DD`
/// which compares correctly as text.
fn build_filter_clause(user_id: UserID, filter: &ExpenseFilter) -> (String, Vec<String>) {
    let mut clause = "user_id = ?".to_owned();
    let mut params = vec![user_id.as_i64().to_string()];

    if let Some(start) = filter.start {
        clause.push_str(" AND date >= ?");
        params.push(start.to_string());
    }

    if let Some(end) = filter.end {
        clause.push_str(" AND date <= ?");
        params.push(end.to_string());
    }

    if let Some(category) = filter.category {
        clause.push_str(" AND category = ?");
        params.push(category.as_str().to_owned());
    }

    (clause, params)
}

/// Map a database row to an [Expense].
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let description = row.get(1)?;
    let amount = row.get(2)?;
    let raw_category: String = row.get(3)?;
    let date = row.get(4)?;
    let raw_user_id = row.get(5)?;

    Ok(Expense {
        id,
        description,
        amount,
        // The fixed set is enforced on every write, so an unknown name can
        // only come from outside the application.
        category: Category::from_name(&raw_category).unwrap_or(Category::Other),
        date,
        user_id: UserID::new(raw_user_id),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::Category,
        db::initialize,
        expense::{
            Expense, ExpenseFilter, ExpenseOrder, NewExpense, create_expense, delete_expense,
            get_expense, list_expenses, sum_expenses, update_expense,
        },
        password::PasswordHash,
        user::{User, UserID, create_user},
    };

    fn get_test_connection() -> (Connection, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        (conn, user)
    }

    fn new_expense(description: &str, amount: f64, date: time::Date, user_id: UserID) -> NewExpense {
        NewExpense {
            description: description.to_owned(),
            amount,
            category: Category::Food,
            date,
            user_id,
        }
    }

    #[test]
    fn create_succeeds() {
        let (conn, user) = get_test_connection();

        let expense = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();

        assert!(expense.id > 0);
        assert_eq!(expense.description, "Coffee");
        assert_eq!(expense.amount, 4.5);
        assert_eq!(expense.category, Category::Food);
        assert_eq!(expense.date, date!(2024 - 03 - 01));
        assert_eq!(expense.user_id, user.id);
    }

    #[test]
    fn create_trims_description() {
        let (conn, user) = get_test_connection();

        let expense = create_expense(
            new_expense("  Coffee  ", 4.5, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();

        assert_eq!(expense.description, "Coffee");
    }

    #[test]
    fn create_rejects_non_positive_amounts() {
        let (conn, user) = get_test_connection();

        for amount in [0.0, -1.0, -0.01, f64::NAN] {
            let result = create_expense(
                new_expense("Coffee", amount, date!(2024 - 03 - 01), user.id),
                &conn,
            );

            assert_eq!(result, Err(Error::InvalidAmount), "amount {amount}");
        }

        let expenses = list_expenses(
            user.id,
            &ExpenseFilter::default(),
            ExpenseOrder::DateAscending,
            &conn,
        )
        .unwrap();
        assert_eq!(expenses, Vec::<Expense>::new(), "no rows should be written");
    }

    #[test]
    fn create_rejects_blank_description() {
        let (conn, user) = get_test_connection();

        let result = create_expense(
            new_expense("   ", 4.5, date!(2024 - 03 - 01), user.id),
            &conn,
        );

        assert_eq!(result, Err(Error::EmptyDescription));
    }

    #[test]
    fn get_is_scoped_to_the_owner() {
        let (conn, owner) = get_test_connection();
        let other_user =
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &conn).unwrap();
        let expense = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 01), owner.id),
            &conn,
        )
        .unwrap();

        assert!(get_expense(expense.id, owner.id, &conn).is_ok());
        assert_eq!(
            get_expense(expense.id, other_user.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_applies_filters_conjunctively() {
        let (conn, user) = get_test_connection();
        let in_range = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 10), user.id),
            &conn,
        )
        .unwrap();
        // Wrong category.
        create_expense(
            NewExpense {
                category: Category::Transport,
                ..new_expense("Bus", 3.0, date!(2024 - 03 - 10), user.id)
            },
            &conn,
        )
        .unwrap();
        // Outside the date range.
        create_expense(
            new_expense("Dinner", 30.0, date!(2024 - 04 - 02), user.id),
            &conn,
        )
        .unwrap();

        let filter = ExpenseFilter {
            start: Some(date!(2024 - 03 - 01)),
            end: Some(date!(2024 - 03 - 31)),
            category: Some(Category::Food),
        };
        let expenses =
            list_expenses(user.id, &filter, ExpenseOrder::DateAscending, &conn).unwrap();

        assert_eq!(expenses, vec![in_range]);
    }

    #[test]
    fn list_boundary_dates_are_inclusive() {
        let (conn, user) = get_test_connection();
        create_expense(
            new_expense("Start", 1.0, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();
        create_expense(
            new_expense("End", 2.0, date!(2024 - 03 - 31), user.id),
            &conn,
        )
        .unwrap();

        let filter = ExpenseFilter {
            start: Some(date!(2024 - 03 - 01)),
            end: Some(date!(2024 - 03 - 31)),
            category: None,
        };
        let expenses =
            list_expenses(user.id, &filter, ExpenseOrder::DateAscending, &conn).unwrap();

        assert_eq!(expenses.len(), 2);
    }

    #[test]
    fn list_orders_by_date() {
        let (conn, user) = get_test_connection();
        let newer = create_expense(
            new_expense("Newer", 1.0, date!(2024 - 03 - 20), user.id),
            &conn,
        )
        .unwrap();
        let older = create_expense(
            new_expense("Older", 2.0, date!(2024 - 03 - 10), user.id),
            &conn,
        )
        .unwrap();

        let ascending = list_expenses(
            user.id,
            &ExpenseFilter::default(),
            ExpenseOrder::DateAscending,
            &conn,
        )
        .unwrap();
        let descending = list_expenses(
            user.id,
            &ExpenseFilter::default(),
            ExpenseOrder::DateDescending,
            &conn,
        )
        .unwrap();

        assert_eq!(ascending, vec![older.clone(), newer.clone()]);
        assert_eq!(descending, vec![newer, older]);
    }

    #[test]
    fn list_only_returns_own_rows() {
        let (conn, user) = get_test_connection();
        let other_user =
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &conn).unwrap();
        create_expense(
            new_expense("Theirs", 4.5, date!(2024 - 03 - 01), other_user.id),
            &conn,
        )
        .unwrap();

        let expenses = list_expenses(
            user.id,
            &ExpenseFilter::default(),
            ExpenseOrder::DateAscending,
            &conn,
        )
        .unwrap();

        assert_eq!(expenses, Vec::<Expense>::new());
    }

    #[test]
    fn sum_is_zero_for_no_rows() {
        let (conn, user) = get_test_connection();

        let total = sum_expenses(user.id, &ExpenseFilter::default(), &conn).unwrap();

        assert_eq!(total, 0.0);
    }

    #[test]
    fn unfiltered_sum_is_unaffected_by_narrow_date_ranges() {
        let (conn, user) = get_test_connection();
        create_expense(
            new_expense("March", 10.0, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();
        create_expense(
            new_expense("April", 20.0, date!(2024 - 04 - 01), user.id),
            &conn,
        )
        .unwrap();

        // A narrow filter only changes the filtered sum. The lifetime total
        // is computed with the default filter and sees every row.
        let filtered = sum_expenses(
            user.id,
            &ExpenseFilter {
                start: Some(date!(2024 - 03 - 01)),
                end: Some(date!(2024 - 03 - 31)),
                category: None,
            },
            &conn,
        )
        .unwrap();
        let lifetime = sum_expenses(user.id, &ExpenseFilter::default(), &conn).unwrap();

        assert_eq!(filtered, 10.0);
        assert_eq!(lifetime, 30.0);
    }

    #[test]
    fn sum_ignores_other_users() {
        let (conn, user) = get_test_connection();
        let other_user =
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &conn).unwrap();
        create_expense(
            new_expense("Mine", 10.0, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();
        create_expense(
            new_expense("Theirs", 99.0, date!(2024 - 03 - 01), other_user.id),
            &conn,
        )
        .unwrap();

        let total = sum_expenses(user.id, &ExpenseFilter::default(), &conn).unwrap();

        assert_eq!(total, 10.0);
    }

    #[test]
    fn update_overwrites_fields() {
        let (conn, user) = get_test_connection();
        let expense = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();

        update_expense(
            NewExpense {
                description: "Espresso".to_owned(),
                amount: 3.0,
                category: Category::Food,
                date: date!(2024 - 03 - 02),
                user_id: user.id,
            },
            expense.id,
            &conn,
        )
        .unwrap();

        let updated = get_expense(expense.id, user.id, &conn).unwrap();
        assert_eq!(updated.description, "Espresso");
        assert_eq!(updated.amount, 3.0);
        assert_eq!(updated.date, date!(2024 - 03 - 02));
    }

    #[test]
    fn update_by_non_owner_changes_nothing() {
        let (conn, owner) = get_test_connection();
        let other_user =
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &conn).unwrap();
        let expense = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 01), owner.id),
            &conn,
        )
        .unwrap();

        let result = update_expense(
            NewExpense {
                description: "Hijacked".to_owned(),
                amount: 1.0,
                category: Category::Other,
                date: date!(2024 - 03 - 01),
                user_id: other_user.id,
            },
            expense.id,
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound));
        let unchanged = get_expense(expense.id, owner.id, &conn).unwrap();
        assert_eq!(unchanged, expense);
    }

    #[test]
    fn update_rejects_invalid_amount_without_mutating() {
        let (conn, user) = get_test_connection();
        let expense = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();

        let result = update_expense(
            NewExpense {
                amount: -5.0,
                ..new_expense("Coffee", 4.5, date!(2024 - 03 - 01), user.id)
            },
            expense.id,
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidAmount));
        let unchanged = get_expense(expense.id, user.id, &conn).unwrap();
        assert_eq!(unchanged, expense);
    }

    #[test]
    fn delete_removes_the_row() {
        let (conn, user) = get_test_connection();
        let expense = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();

        delete_expense(expense.id, user.id, &conn).unwrap();

        assert_eq!(
            get_expense(expense.id, user.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_by_non_owner_changes_nothing() {
        let (conn, owner) = get_test_connection();
        let other_user =
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &conn).unwrap();
        let expense = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 01), owner.id),
            &conn,
        )
        .unwrap();

        let result = delete_expense(expense.id, other_user.id, &conn);

        assert_eq!(result, Err(Error::NotFound));
        assert!(get_expense(expense.id, owner.id, &conn).is_ok());
    }

    #[test]
    fn deleting_twice_reports_the_same_failure_as_never_existing() {
        let (conn, user) = get_test_connection();
        let expense = create_expense(
            new_expense("Coffee", 4.5, date!(2024 - 03 - 01), user.id),
            &conn,
        )
        .unwrap();

        delete_expense(expense.id, user.id, &conn).unwrap();
        let deleted_again = delete_expense(expense.id, user.id, &conn);
        let never_existed = delete_expense(expense.id + 1000, user.id, &conn);

        assert_eq!(deleted_again, Err(Error::NotFound));
        assert_eq!(deleted_again, never_existed);
    }
}
