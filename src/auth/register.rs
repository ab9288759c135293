//! The registration page for creating a new account.
//!
//! A successful registration logs the new user in immediately.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, endpoints,
    auth::set_auth_cookie,
    html::{BUTTON_PRIMARY_STYLE, base, log_in_register, password_input, text_input},
    password::{PasswordHash, ValidatedPassword},
    user::create_user,
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// Which form fields an error message belongs to.
#[derive(Default)]
struct RegistrationErrors<'a> {
    username: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(username: &str, errors: &RegistrationErrors) -> Markup {
    html! {
        form method="post" action=(endpoints::REGISTER_VIEW) class="space-y-4 md:space-y-6"
        {
            (text_input("username", "Username", username, errors.username))
            (password_input("password", "Password", errors.password))
            (password_input("confirm_password", "Confirm Password", errors.confirm_password))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create account" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a
                    href=(endpoints::LOG_IN_VIEW)
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Log in here"
                }
            }
        }
    }
}

fn registration_page(username: &str, errors: &RegistrationErrors) -> Markup {
    let form = registration_form(username, errors);
    let content = log_in_register("Create your account", &form);
    base("Register", &[], &content)
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    registration_page("", &RegistrationErrors::default()).into_response()
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Handler for registration requests via the POST method.
///
/// Creates the user, logs them in by setting the auth cookie and redirects to
/// the dashboard. Validation failures re-render the form with an inline error
/// message.
pub async fn post_register(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    let username = user_data.username.trim();

    if username.is_empty() {
        return registration_page(
            username,
            &RegistrationErrors {
                username: Some("The username cannot be empty."),
                ..Default::default()
            },
        )
        .into_response();
    }

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            return registration_page(
                username,
                &RegistrationErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_page(
            username,
            &RegistrationErrors {
                confirm_password: Some("Passwords do not match."),
                ..Default::default()
            },
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("Could not hash password: {error}");
            return Error::HashingError(error.to_string()).into_response();
        }
    };

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match create_user(username, password_hash, &connection) {
            Ok(user) => user,
            Err(Error::DuplicateUsername(_)) => {
                return registration_page(
                    username,
                    &RegistrationErrors {
                        username: Some("That username is already taken."),
                        ..Default::default()
                    },
                )
                .into_response();
            }
            Err(error) => {
                tracing::error!("Could not create user: {error}");
                return error.into_response();
            }
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(updated_jar) => {
            (updated_jar, Redirect::to(endpoints::DASHBOARD_VIEW)).into_response()
        }
        Err(err) => {
            tracing::error!("Error setting auth cookie: {err}");
            Error::CookieMissing.into_response()
        }
    }
}
