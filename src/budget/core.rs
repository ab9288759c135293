//! Defines the core data model and database queries for budgets.

use rusqlite::{Connection, Row};

use crate::{Error, category::Category, user::UserID};

/// The database ID of a budget row.
pub type BudgetId = i64;

/// A per-user, per-category monthly spending ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The category the ceiling applies to.
    pub category: Category,
    /// The monthly spending ceiling in dollars.
    pub monthly_limit: f64,
    /// The user the budget belongs to.
    pub user_id: UserID,
}

/// How far through a budget the user is this month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetStatus {
    /// Spend as a percentage of the limit, rounded to the nearest whole
    /// number. Zero when the limit is zero or negative.
    pub percent: i64,
    /// [BudgetStatus::percent] clamped to 0..=100 for rendering the bar.
    pub bar_width: i64,
    /// Whether the spend has exceeded the limit.
    pub is_over: bool,
}

/// Compute the status of a budget from the month's spend and the limit.
pub fn budget_status(spent: f64, limit: f64) -> BudgetStatus {
    let percent = if limit > 0.0 {
        (spent / limit * 100.0).round() as i64
    } else {
        0
    };

    BudgetStatus {
        percent,
        bar_width: percent.clamp(0, 100),
        is_over: percent > 100,
    }
}

/// Create the budget table.
///
/// There is deliberately no UNIQUE constraint on (user_id, category): the one
/// budget per pair rule is enforced by [set_budget]'s upsert.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY,
                category TEXT NOT NULL,
                monthly_limit REAL NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Set the monthly limit for (`user_id`, `category`), overwriting the
/// existing budget for the pair if there is one.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn set_budget(
    category: Category,
    monthly_limit: f64,
    user_id: UserID,
    connection: &Connection,
) -> Result<Budget, Error> {
    let rows_affected = connection.execute(
        "UPDATE budget SET monthly_limit = ?1 WHERE user_id = ?2 AND category = ?3",
        (monthly_limit, user_id.as_i64(), category.as_str()),
    )?;

    let id = if rows_affected > 0 {
        connection
            .prepare("SELECT id FROM budget WHERE user_id = :user_id AND category = :category")?
            .query_one(
                &[
                    (":user_id", &user_id.as_i64().to_string()),
                    (":category", &category.as_str().to_owned()),
                ],
                |row| row.get(0),
            )?
    } else {
        connection.execute(
            "INSERT INTO budget (category, monthly_limit, user_id) VALUES (?1, ?2, ?3)",
            (category.as_str(), monthly_limit, user_id.as_i64()),
        )?;

        connection.last_insert_rowid()
    };

    Ok(Budget {
        id,
        category,
        monthly_limit,
        user_id,
    })
}

/// Retrieve the budgets of `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, category, monthly_limit, user_id FROM budget
             WHERE user_id = :user_id ORDER BY id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_budget_row)?
        .collect::<Result<Vec<Budget>, rusqlite::Error>>()
        .map_err(|error| error.into())
}

/// Delete the budget `id` belonging to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_category: String = row.get(1)?;
    let monthly_limit = row.get(2)?;
    let raw_user_id = row.get(3)?;

    Ok(Budget {
        id,
        category: Category::from_name(&raw_category).unwrap_or(Category::Other),
        monthly_limit,
        user_id: UserID::new(raw_user_id),
    })
}

#[cfg(test)]
mod budget_status_tests {
    use super::budget_status;

    #[test]
    fn over_budget_clamps_the_bar() {
        let status = budget_status(250.0, 200.0);

        assert_eq!(status.percent, 125);
        assert!(status.is_over);
        assert_eq!(status.bar_width, 100);
    }

    #[test]
    fn under_budget() {
        let status = budget_status(50.0, 200.0);

        assert_eq!(status.percent, 25);
        assert!(!status.is_over);
        assert_eq!(status.bar_width, 25);
    }

    #[test]
    fn exactly_at_the_limit_is_not_over() {
        let status = budget_status(200.0, 200.0);

        assert_eq!(status.percent, 100);
        assert!(!status.is_over);
        assert_eq!(status.bar_width, 100);
    }

    #[test]
    fn zero_limit_reports_zero_percent() {
        let status = budget_status(50.0, 0.0);

        assert_eq!(status.percent, 0);
        assert!(!status.is_over);
        assert_eq!(status.bar_width, 0);
    }

    #[test]
    fn zero_spend_is_zero_percent() {
        let status = budget_status(0.0, 200.0);

        assert_eq!(status.percent, 0);
        assert_eq!(status.bar_width, 0);
    }
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        category::Category,
        db::initialize,
        password::PasswordHash,
        user::{User, create_user},
    };

    use super::{Budget, delete_budget, list_budgets, set_budget};

    fn get_test_connection() -> (Connection, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("alice", PasswordHash::new_unchecked("hunter2"), &conn).unwrap();
        (conn, user)
    }

    #[test]
    fn set_budget_inserts_a_new_row() {
        let (conn, user) = get_test_connection();

        let budget = set_budget(Category::Food, 200.0, user.id, &conn).unwrap();

        assert!(budget.id > 0);
        assert_eq!(budget.category, Category::Food);
        assert_eq!(budget.monthly_limit, 200.0);
        assert_eq!(list_budgets(user.id, &conn).unwrap(), vec![budget]);
    }

    #[test]
    fn set_budget_overwrites_the_existing_pair() {
        let (conn, user) = get_test_connection();
        let original = set_budget(Category::Food, 200.0, user.id, &conn).unwrap();

        let updated = set_budget(Category::Food, 350.0, user.id, &conn).unwrap();

        assert_eq!(updated.id, original.id, "the row should be reused");
        let budgets = list_budgets(user.id, &conn).unwrap();
        assert_eq!(budgets.len(), 1, "no duplicate (user, category) rows");
        assert_eq!(budgets[0].monthly_limit, 350.0);
    }

    #[test]
    fn budgets_for_different_categories_coexist() {
        let (conn, user) = get_test_connection();
        set_budget(Category::Food, 200.0, user.id, &conn).unwrap();
        set_budget(Category::Rent, 1200.0, user.id, &conn).unwrap();

        let budgets = list_budgets(user.id, &conn).unwrap();

        assert_eq!(budgets.len(), 2);
    }

    #[test]
    fn budgets_are_scoped_per_user() {
        let (conn, user) = get_test_connection();
        let other_user =
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &conn).unwrap();
        set_budget(Category::Food, 200.0, user.id, &conn).unwrap();

        // The same category for another user is a separate budget.
        set_budget(Category::Food, 99.0, other_user.id, &conn).unwrap();

        let budgets = list_budgets(user.id, &conn).unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].monthly_limit, 200.0);
    }

    #[test]
    fn delete_budget_removes_the_row() {
        let (conn, user) = get_test_connection();
        let budget = set_budget(Category::Food, 200.0, user.id, &conn).unwrap();

        delete_budget(budget.id, user.id, &conn).unwrap();

        assert_eq!(list_budgets(user.id, &conn).unwrap(), Vec::<Budget>::new());
    }

    #[test]
    fn delete_budget_by_non_owner_changes_nothing() {
        let (conn, user) = get_test_connection();
        let other_user =
            create_user("mallory", PasswordHash::new_unchecked("hunter3"), &conn).unwrap();
        let budget = set_budget(Category::Food, 200.0, user.id, &conn).unwrap();

        let result = delete_budget(budget.id, other_user.id, &conn);

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(list_budgets(user.id, &conn).unwrap().len(), 1);
    }
}
