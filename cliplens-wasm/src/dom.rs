//! Window and location helpers shared by the driver modules.

use cliplens_core::QueryState;
use web_sys::Window;

/// The current location query string as typed state.
pub fn current_query() -> QueryState {
    web_sys::window()
        .and_then(|window| window.location().search().ok())
        .map(|search| QueryState::parse(&search))
        .unwrap_or_default()
}

/// Origin + path of the current page, without the query string.
fn base_url(window: &Window) -> Option<String> {
    let location = window.location();
    Some(format!(
        "{}{}",
        location.origin().ok()?,
        location.pathname().ok()?
    ))
}

/// Commit a query state with a full navigation, so the result stream
/// restarts consistently with the new filter set.
pub fn navigate(query: &QueryState) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(base) = base_url(&window) else {
        return;
    };
    let _ = window.location().set_href(&query.href(&base));
}
