//! The profile page: changing the username and password.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints,
    flash::{set_flash, take_flash},
    html::{BUTTON_PRIMARY_STYLE, PAGE_CONTAINER_STYLE, base, password_input, text_input},
    navigation::NavBar,
    password::{PasswordHash, ValidatedPassword},
    user::{UserID, get_user_by_id, update_password, update_username},
};

/// The state needed for the profile page.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<ProfileState> for Key {
    fn from_ref(state: &ProfileState) -> Self {
        state.cookie_key.clone()
    }
}

fn profile_view(username: &str, flash: Option<Alert>) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW);

    let content = html! {
        (nav_bar.into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md bg-white rounded-lg shadow dark:bg-gray-800 p-6 space-y-4"
            {
                @if let Some(alert) = flash {
                    (alert.into_html())
                }

                h1 class="text-xl font-bold text-gray-900 dark:text-white" { "Profile" }

                form method="post" action=(endpoints::PROFILE_VIEW) class="space-y-4"
                {
                    (text_input("username", "Username", username, None))
                    (password_input("current_password", "Current password", None))
                    (password_input("new_password", "New password (leave blank to keep)", None))

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save changes" }
                }
            }
        }
    };

    base("Profile", &[], &content)
}

/// Display the profile page.
pub async fn get_profile_page(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Response {
    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_id(user_id, &connection) {
            Ok(user) => user,
            Err(error) => {
                tracing::error!("could not load user {user_id}: {error}");
                return error.into_response();
            }
        }
    };

    let (jar, flash) = take_flash(jar);

    (jar, profile_view(&user.username, flash)).into_response()
}

/// The raw data entered by the user in the profile form.
///
/// Empty fields mean "leave unchanged".
#[derive(Deserialize)]
pub struct ProfileForm {
    /// The (possibly unchanged) username.
    pub username: String,
    /// Required to change the password.
    pub current_password: String,
    /// The new password, or empty to keep the current one.
    pub new_password: String,
}

/// Handler for profile updates via the POST method.
///
/// The username and password are updated independently: changing one does
/// not require the other. A password change always requires the current
/// password. Redirects back to the profile page with a flash notice
/// summarising the outcome.
pub async fn post_profile(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<ProfileForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let user = match get_user_by_id(user_id, &connection) {
        Ok(user) => user,
        Err(error) => {
            tracing::error!("could not load user {user_id}: {error}");
            return error.into_response();
        }
    };

    let mut successes: Vec<String> = vec![];
    let mut errors: Vec<String> = vec![];

    let new_username = form.username.trim();
    if !new_username.is_empty() && new_username != user.username {
        match update_username(new_username, user_id, &connection) {
            Ok(()) => successes.push("Username updated".to_owned()),
            Err(Error::DuplicateUsername(_)) => errors.push("Username taken".to_owned()),
            Err(error) => {
                tracing::error!("could not update username: {error}");
                return error.into_response();
            }
        }
    }

    if !form.new_password.is_empty() {
        match change_password(&user.password_hash, &form, user_id, &connection) {
            Ok(()) => successes.push("Password changed".to_owned()),
            Err(Error::InvalidCredentials) => {
                errors.push("Incorrect current password".to_owned())
            }
            Err(Error::TooWeak(reason)) => errors.push(format!("Password is too weak: {reason}")),
            Err(error) => {
                tracing::error!("could not update password: {error}");
                return error.into_response();
            }
        }
    }

    let alert = if !errors.is_empty() {
        Some(Alert::error(errors.join(". ")))
    } else if !successes.is_empty() {
        Some(Alert::success(successes.join(". ")))
    } else {
        None
    };

    let jar = match alert {
        Some(alert) => set_flash(jar, &alert),
        None => jar,
    };

    (jar, Redirect::to(endpoints::PROFILE_VIEW)).into_response()
}

/// Verify the current password, validate the new one and store its hash.
fn change_password(
    current_hash: &PasswordHash,
    form: &ProfileForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let current_password_valid = current_hash
        .verify(&form.current_password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !current_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let validated = ValidatedPassword::new(&form.new_password)?;
    let new_hash = PasswordHash::new(validated, PasswordHash::DEFAULT_COST)?;

    update_password(&new_hash, user_id, connection)
}
