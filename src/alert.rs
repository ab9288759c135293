//! Alert notices displayed to users after an action.

use maud::{Markup, html};

/// A transient user-facing notice, rendered at the top of the next page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// The action succeeded.
    Success {
        /// Short message describing the outcome.
        message: String,
    },
    /// The action failed.
    Error {
        /// Short message describing what went wrong.
        message: String,
    },
}

impl Alert {
    /// Create a success alert.
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    /// Create an error alert.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Render the alert as a dismissable banner.
    pub fn into_html(self) -> Markup {
        let (style, message) = match self {
            Alert::Success { message } => (
                "flex items-center justify-between p-4 mb-4 rounded border \
                text-emerald-800 border-emerald-300 bg-emerald-50 \
                dark:bg-gray-800 dark:text-emerald-400 dark:border-emerald-800",
                message,
            ),
            Alert::Error { message } => (
                "flex items-center justify-between p-4 mb-4 rounded border \
                text-rose-800 border-rose-300 bg-rose-50 \
                dark:bg-gray-800 dark:text-rose-400 dark:border-rose-800",
                message,
            ),
        };

        html! {
            div class=(style) role="alert"
            {
                span class="text-sm font-medium" { (message) }
            }
        }
    }
}
