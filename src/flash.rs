//! Transient flash notices carried between a redirect and the next page
//! render via a private cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};

use crate::alert::Alert;

pub(crate) const COOKIE_FLASH: &str = "flash";

/// The separator between the alert level and message in the cookie value.
const LEVEL_SEPARATOR: char = '\u{1f}';

/// Store `alert` in the flash cookie so the next page render can display it.
///
/// Returns the cookie jar with the cookie added.
pub fn set_flash(jar: PrivateCookieJar, alert: &Alert) -> PrivateCookieJar {
    let value = match alert {
        Alert::Success { message } => format!("success{LEVEL_SEPARATOR}{message}"),
        Alert::Error { message } => format!("error{LEVEL_SEPARATOR}{message}"),
    };

    jar.add(
        Cookie::build((COOKIE_FLASH, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict),
    )
}

/// Take the flash notice out of the cookie jar, if there is one.
///
/// The returned jar removes the cookie from the client, so a notice is shown
/// at most once.
pub fn take_flash(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<Alert>) {
    let Some(cookie) = jar.get(COOKIE_FLASH) else {
        return (jar, None);
    };

    let alert = match cookie.value().split_once(LEVEL_SEPARATOR) {
        Some(("success", message)) => Some(Alert::success(message)),
        Some(("error", message)) => Some(Alert::error(message)),
        _ => None,
    };

    let jar = jar.remove(Cookie::build((COOKIE_FLASH, "")).path("/"));

    (jar, alert)
}
