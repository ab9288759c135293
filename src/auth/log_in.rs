//! The log-in page and the handler for log-in requests.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
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
    user::get_user_by_username,
};

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";

fn log_in_form(username: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form method="post" action=(endpoints::LOG_IN_VIEW) class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (text_input("username", "Username", username, None))
            (password_input("password", "Password", error_message))

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Log in" }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW)
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                    "Register here"
                }
            }
        }
    }
}

fn log_in_page(username: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    let form = log_in_form(username, error_message, redirect_url);
    let content = log_in_register("Log in to your account", &form);
    base("Log In", &[], &content)
}

/// Only accept redirect targets that are paths within this app, to avoid
/// open redirects.
pub(crate) fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    if raw_url.starts_with('/') && !raw_url.starts_with("//") {
        Some(raw_url.to_owned())
    } else {
        None
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// The query parameters accepted by the log-in page.
#[derive(Deserialize)]
pub struct RedirectQuery {
    /// Where to send the user after a successful log-in.
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");

    log_in_page("", None, redirect_url.as_deref()).into_response()
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Username entered during log-in.
    pub username: String,
    /// Password entered during log-in. Stored as a plain string; it is only
    /// compared against the stored hash, never persisted.
    pub password: String,
    /// Optional URL to redirect to after logging in.
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in the auth cookie is set and the client is redirected
/// to the dashboard (or the preserved redirect URL). Otherwise, the form is
/// returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_username(user_data.username.trim(), &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                return log_in_page(
                    &user_data.username,
                    Some(INVALID_CREDENTIALS_ERROR_MSG),
                    redirect_url,
                )
                .into_response();
            }
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return log_in_page(
                    &user_data.username,
                    Some("An internal error occurred. Please try again later."),
                    redirect_url,
                )
                .into_response();
            }
        }
    };

    let is_password_valid = match user.password_hash.verify(&user_data.password) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_page(
                &user_data.username,
                Some("An internal error occurred. Please try again later."),
                redirect_url,
            )
            .into_response();
        }
    };

    if !is_password_valid {
        return log_in_page(
            &user_data.username,
            Some(INVALID_CREDENTIALS_ERROR_MSG),
            redirect_url,
        )
        .into_response();
    }

    let redirect_url = redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW);

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(updated_jar) => (updated_jar, Redirect::to(redirect_url)).into_response(),
        Err(err) => {
            tracing::error!("Error setting auth cookie: {err}");
            Error::CookieMissing.into_response()
        }
    }
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        body::Body,
        extract::{Query, State},
        http::{Response, StatusCode, header::SET_COOKIE},
        response::IntoResponse,
    };
    use axum_extra::extract::PrivateCookieJar;
    use rusqlite::Connection;
    use time::Duration;

    use crate::{
        app_state::create_cookie_key,
        auth::cookie::COOKIE_USER_ID,
        endpoints,
        password::PasswordHash,
        user::{create_user, create_user_table},
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInData, LogInState, RedirectQuery, get_log_in_page,
        post_log_in,
    };

    fn get_test_state(username: Option<&str>) -> LogInState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");

        if let Some(username) = username {
            let hash = PasswordHash::from_raw_password("tundra84mosaic!quartz", 4).unwrap();
            create_user(username, hash, &connection).expect("Could not create test user");
        }

        LogInState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: Duration::minutes(5),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    async fn new_log_in_request(state: LogInState, form: LogInData) -> Response<Body> {
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        post_log_in(State(state), jar, Form(form)).await
    }

    async fn body_text(response: Response<Body>) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&body).to_string()
    }

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page(Query(RedirectQuery { redirect_url: None }))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let document = scraper::Html::parse_document(&body_text(response).await);

        let form_selector = scraper::Selector::parse("form").unwrap();
        let forms = document.select(&form_selector).collect::<Vec<_>>();
        assert_eq!(forms.len(), 1, "want 1 form, got {}", forms.len());
        let form = forms.first().unwrap();

        for selector_string in ["input[name=username]", "input[name=password]"] {
            let input_selector = scraper::Selector::parse(selector_string).unwrap();
            let inputs = form.select(&input_selector).collect::<Vec<_>>();
            assert_eq!(
                inputs.len(),
                1,
                "want 1 element matching {selector_string}, got {}",
                inputs.len()
            );
        }
    }

    #[tokio::test]
    async fn log_in_page_preserves_redirect_url() {
        let redirect_url = "/budget".to_string();
        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some(redirect_url.clone()),
        }))
        .await
        .into_response();

        let document = scraper::Html::parse_document(&body_text(response).await);

        let input_selector = scraper::Selector::parse("input[name=redirect_url]").unwrap();
        let inputs = document.select(&input_selector).collect::<Vec<_>>();
        assert_eq!(
            inputs.len(),
            1,
            "want 1 redirect_url input, got {}",
            inputs.len()
        );
        assert_eq!(
            inputs.first().unwrap().value().attr("value"),
            Some(redirect_url.as_str()),
            "expected redirect_url value to be preserved"
        );
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_state(Some("alice"));

        let response = new_log_in_request(
            state,
            LogInData {
                username: "alice".to_owned(),
                password: "tundra84mosaic!quartz".to_owned(),
                redirect_url: None,
            },
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::DASHBOARD_VIEW
        );

        let set_cookie_headers: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert!(
            set_cookie_headers
                .iter()
                .any(|header| header.to_str().unwrap().starts_with(COOKIE_USER_ID)),
            "want a {COOKIE_USER_ID} cookie, got {set_cookie_headers:?}"
        );
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_url() {
        let state = get_test_state(Some("alice"));
        let redirect_url = "/budget";

        let response = new_log_in_request(
            state,
            LogInData {
                username: "alice".to_owned(),
                password: "tundra84mosaic!quartz".to_owned(),
                redirect_url: Some(redirect_url.to_owned()),
            },
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), redirect_url);
    }

    #[tokio::test]
    async fn log_in_falls_back_on_invalid_redirect_url() {
        let state = get_test_state(Some("alice"));

        let response = new_log_in_request(
            state,
            LogInData {
                username: "alice".to_owned(),
                password: "tundra84mosaic!quartz".to_owned(),
                redirect_url: Some("https://example.com".to_owned()),
            },
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            endpoints::DASHBOARD_VIEW
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let state = get_test_state(Some("alice"));

        let response = new_log_in_request(
            state,
            LogInData {
                username: "alice".to_owned(),
                password: "wrongpassword".to_owned(),
                redirect_url: None,
            },
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains(INVALID_CREDENTIALS_ERROR_MSG));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_username() {
        let state = get_test_state(None);

        let response = new_log_in_request(
            state,
            LogInData {
                username: "nobody".to_owned(),
                password: "tundra84mosaic!quartz".to_owned(),
                redirect_url: None,
            },
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(
            text.contains(INVALID_CREDENTIALS_ERROR_MSG),
            "unknown usernames should get the same message as bad passwords"
        );
    }
}
