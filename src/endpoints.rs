//! The application's endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/delete/{expense_id}', use
//! [format_endpoint].

/// The dashboard: filterable expense list, summary cards and charts.
pub const DASHBOARD_VIEW: &str = "/";
/// The route for creating an expense.
pub const ADD_EXPENSE: &str = "/add";
/// The route for deleting an expense.
pub const DELETE_EXPENSE: &str = "/delete/{expense_id}";
/// The page and route for editing an expense.
pub const EDIT_EXPENSE_VIEW: &str = "/edit/{expense_id}";
/// The route for downloading the filtered expenses as CSV.
pub const EXPORT_CSV: &str = "/export.csv";
/// The route for downloading the filtered expenses as a PDF report.
pub const EXPORT_PDF: &str = "/export_pdf";
/// The page and route for creating an account.
pub const REGISTER_VIEW: &str = "/register";
/// The page and route for logging in.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for logging out the current user.
pub const LOG_OUT: &str = "/logout";
/// The page and route for updating the username and password.
pub const PROFILE_VIEW: &str = "/profile";
/// The page and route for viewing and setting budgets.
pub const BUDGETS_VIEW: &str = "/budget";
/// The route for deleting a budget.
pub const DELETE_BUDGET: &str = "/delete_budget/{budget_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/delete/{expense_id}', '{expense_id}'
/// is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::ADD_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::DELETE_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::EDIT_EXPENSE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EXPORT_CSV);
        assert_endpoint_is_valid_uri(endpoints::EXPORT_PDF);
        assert_endpoint_is_valid_uri(endpoints::REGISTER_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::PROFILE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::BUDGETS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::DELETE_BUDGET);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/delete/{expense_id}", 1);

        assert_eq!(formatted_path, "/delete/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/budget", 1);

        assert_eq!(formatted_path, "/budget");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/edit/{expense_id}/confirm", 1);

        assert_eq!(formatted_path, "/edit/1/confirm");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
