//! Report rendering: CSV and PDF downloads of the filtered expense list.

pub mod csv;
pub mod pdf;
pub mod pie;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

pub use csv::export_csv_endpoint;
pub use pdf::export_pdf_endpoint;

/// The state needed by the export endpoints.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
