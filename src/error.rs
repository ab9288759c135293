//! Defines the app level error type and its conversions to HTTP responses.

use axum::response::{IntoResponse, Response};

use crate::{internal_server_error::render_internal_server_error, not_found::not_found_response};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An expense was created or edited with an amount of zero or less.
    #[error("the amount must be greater than zero")]
    InvalidAmount,

    /// An expense was created or edited with a description that is empty
    /// after trimming whitespace.
    #[error("the description cannot be empty")]
    EmptyDescription,

    /// A category name was submitted that is not part of the fixed category
    /// set.
    #[error("{0:?} is not a valid category")]
    UnknownCategory(String),

    /// The username chosen at registration or on the profile page is already
    /// taken by another user.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// The user provided an invalid combination of username and password.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// Either the user ID or expiry cookie is missing from the cookie jar in
    /// the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth cookie's expiry has passed and the user must log in again.
    #[error("the session has expired")]
    SessionExpired,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The requested resource was not found.
    ///
    /// For owner-scoped queries this also covers rows that exist but belong
    /// to another user: both cases must be indistinguishable to the client.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// The PDF report could not be rendered.
    #[error("could not render the PDF report: {0}")]
    PdfRenderError(String),

    /// The CSV export could not be rendered.
    #[error("could not render the CSV export: {0}")]
    CsvRenderError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.username") =>
            {
                // The username is filled in by the caller which has the form data.
                Error::DuplicateUsername(String::new())
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => not_found_response(),
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}
