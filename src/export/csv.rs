//! CSV export of the filtered expense list.

use axum::{
    Extension,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    expense::{Expense, ExpenseOrder, FilterQuery, list_expenses},
    export::ExportState,
    user::UserID,
};

/// Render `expenses` as CSV text.
///
/// The header row is `Date,Description,Category,Amount` and amounts are
/// formatted to two decimal places. Plain fields are written as-is; fields
/// containing the delimiter or quotes are quoted by the writer rather than
/// corrupting the row.
pub fn expenses_to_csv(expenses: &[Expense]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["Date", "Description", "Category", "Amount"])
        .map_err(|error| Error::CsvRenderError(error.to_string()))?;

    for expense in expenses {
        writer
            .write_record([
                expense.date.to_string(),
                expense.description.clone(),
                expense.category.to_string(),
                format!("{:.2}", expense.amount),
            ])
            .map_err(|error| Error::CsvRenderError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvRenderError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvRenderError(error.to_string()))
}

/// A route handler that returns the filtered expenses as a `text/csv`
/// attachment, oldest first.
///
/// Accepts the same `start`, `end` and `category` query parameters as the
/// dashboard.
pub async fn export_csv_endpoint(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<FilterQuery>,
) -> Response {
    let filter = query.to_filter();

    let expenses = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match list_expenses(user_id, &filter, ExpenseOrder::DateAscending, &connection) {
            Ok(expenses) => expenses,
            Err(error) => {
                tracing::error!("could not load expenses for CSV export: {error}");
                return error.into_response();
            }
        }
    };

    let csv_text = match expenses_to_csv(&expenses) {
        Ok(csv_text) => csv_text,
        Err(error) => {
            tracing::error!("could not render CSV export: {error}");
            return error.into_response();
        }
    };

    (
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expenses.csv\"",
            ),
        ],
        csv_text,
    )
        .into_response()
}
