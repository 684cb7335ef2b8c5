//! Action results for HTMX form actions.
//!
//! Every mutating endpoint answers with the fragment that re-renders the
//! component it changed, plus an `HX-Trigger` header. The header carries a
//! `toast` event with the [`ActionResult`] and any extra events (such as
//! `cart-updated`) that other components listen for.

use axum::http::HeaderMap;
use axum::response::AppendHeaders;
use serde::Serialize;
use serde_json::{Map, Value};

/// Event fired when the cart changes; the header badge refreshes on it.
pub const CART_UPDATED: &str = "cart-updated";

/// Event fired when the wishlist changes.
pub const WISHLIST_UPDATED: &str = "wishlist-updated";

/// Outcome of a form action, shown to the shopper as a toast.
///
/// Both fields are optional: an action can succeed silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
}

impl ActionResult {
    /// A successful outcome with a message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            error: None,
            success: Some(message.into()),
        }
    }

    /// A failed outcome with a message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            success: None,
        }
    }

    /// A successful outcome with nothing to announce.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// JSON value for the `HX-Trigger` header.
    ///
    /// `events` are added as payload-less events; the toast is omitted for a
    /// silent result.
    #[must_use]
    pub fn trigger_value(&self, events: &[&str]) -> String {
        let mut map = Map::new();
        if self.error.is_some() || self.success.is_some() {
            let toast = serde_json::to_value(self).unwrap_or(Value::Null);
            map.insert("toast".to_owned(), toast);
        }
        for event in events {
            map.insert((*event).to_owned(), Value::Null);
        }
        Value::Object(map).to_string()
    }

    /// `HX-Trigger` header for an axum response tuple.
    #[must_use]
    pub fn headers(&self, events: &[&str]) -> AppendHeaders<[(&'static str, String); 1]> {
        AppendHeaders([("HX-Trigger", self.trigger_value(events))])
    }
}

/// Whether the request was made by HTMX rather than a plain form post.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::response::IntoResponse;

    use super::*;

    fn parse(value: &str) -> Value {
        serde_json::from_str(value).unwrap()
    }

    #[test]
    fn test_success_toast_with_event() {
        let value = parse(&ActionResult::success("Added to cart").trigger_value(&[CART_UPDATED]));
        assert_eq!(value["toast"]["success"], "Added to cart");
        assert!(value["toast"].get("error").is_none());
        assert!(value.get(CART_UPDATED).is_some());
    }

    #[test]
    fn test_error_toast() {
        let result = ActionResult::error("Out of stock");
        assert!(result.is_error());
        let value = parse(&result.trigger_value(&[]));
        assert_eq!(value["toast"]["error"], "Out of stock");
    }

    #[test]
    fn test_silent_result_has_no_toast() {
        let value = parse(&ActionResult::silent().trigger_value(&[CART_UPDATED]));
        assert!(value.get("toast").is_none());
        assert!(value.get(CART_UPDATED).is_some());
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", "true".parse().unwrap());
        assert!(is_htmx(&headers));
    }

    #[test]
    fn test_headers_set_hx_trigger() {
        let response = (ActionResult::success("Saved").headers(&[]), "").into_response();
        let header = response.headers().get("HX-Trigger").unwrap().to_str().unwrap();
        assert_eq!(parse(header)["toast"]["success"], "Saved");
    }
}
