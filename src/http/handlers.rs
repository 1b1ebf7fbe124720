//! HTTP handlers for the guarded endpoints.
//!
//! The contact and subscribe handlers own input validation only; the rate
//! limit itself is enforced by the route middleware before a request gets
//! here. Delivery of messages and subscriptions is the embedding
//! application's concern.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Response body shared by the guarded endpoints.
///
/// Exactly one of `message` and `error` is present, matching on the
/// `success` flag.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    /// Whether the request was accepted
    pub success: bool,

    /// Human-readable confirmation, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Human-readable failure reason, on error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    /// Build a success response.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Build an error response.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Contact form submission.
///
/// Fields default to empty strings so that missing and blank values get
/// the same validation error.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Newsletter subscription request.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
}

/// Handle a contact form submission.
///
/// The email is validated exactly as submitted; padding around an
/// otherwise valid address fails the shape check.
pub async fn contact(Json(request): Json<ContactRequest>) -> (StatusCode, Json<ApiResponse>) {
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.message.trim().is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Name, email, and message are required")),
        );
    }

    if !is_valid_email(&request.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Invalid email address")),
        );
    }

    debug!("Accepted contact submission");
    (
        StatusCode::OK,
        Json(ApiResponse::ok("Message sent successfully")),
    )
}

/// Handle a newsletter subscription.
///
/// The email is validated exactly as submitted; normalization belongs to
/// whatever stores the subscription, not to this endpoint.
pub async fn subscribe(Json(request): Json<SubscribeRequest>) -> (StatusCode, Json<ApiResponse>) {
    if request.email.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Email is required")),
        );
    }

    if !is_valid_email(&request.email) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Invalid email address")),
        );
    }

    debug!("Accepted subscription");
    (
        StatusCode::OK,
        Json(ApiResponse::ok("Successfully subscribed!")),
    )
}

/// Health check endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tollgate",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Check that an address has the shape `local@domain`: no whitespace, a
/// single `@` with text on both sides, and a dot inside the domain with
/// at least one character on each side.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Any interior dot qualifies; a trailing dot does not disqualify the
    // domain as long as an earlier dot has characters on both sides.
    domain
        .char_indices()
        .any(|(i, ch)| ch == '.' && i > 0 && i + 1 < domain.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_request(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.example.co"));
        // A trailing dot is fine once an interior dot exists.
        assert!(is_valid_email("user@example.com."));
        assert!(is_valid_email("üser@exämple.com"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@@example.com"));
        assert!(!is_valid_email("user name@example.com"));
        // Surrounding whitespace is part of the value under test.
        assert!(!is_valid_email(" user@example.com "));
        assert!(!is_valid_email("user@example.com "));
    }

    #[test]
    fn test_success_body_has_no_error_field() {
        let body = serde_json::to_value(ApiResponse::ok("Message sent successfully")).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "success": true,
                "message": "Message sent successfully",
            })
        );
    }

    #[test]
    fn test_error_body_has_no_message_field() {
        let body = serde_json::to_value(ApiResponse::error("Invalid email address")).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": "Invalid email address",
            })
        );
    }

    #[tokio::test]
    async fn test_contact_requires_all_fields() {
        let (status, Json(body)) =
            contact(Json(contact_request("Ada", "", "Hello there"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body.error.as_deref(),
            Some("Name, email, and message are required")
        );
    }

    #[tokio::test]
    async fn test_contact_treats_blank_fields_as_missing() {
        let (status, _body) =
            contact(Json(contact_request("  ", "ada@example.com", "Hello"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_contact_rejects_invalid_email() {
        let (status, Json(body)) =
            contact(Json(contact_request("Ada", "not-an-email", "Hello"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.as_deref(), Some("Invalid email address"));
    }

    #[tokio::test]
    async fn test_contact_rejects_a_padded_email() {
        let (status, Json(body)) =
            contact(Json(contact_request("Ada", " ada@example.com ", "Hello"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.as_deref(), Some("Invalid email address"));
    }

    #[tokio::test]
    async fn test_contact_accepts_a_valid_submission() {
        let (status, Json(body)) =
            contact(Json(contact_request("Ada", "ada@example.com", "Hello"))).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.message.as_deref(), Some("Message sent successfully"));
    }

    #[tokio::test]
    async fn test_subscribe_requires_an_email() {
        let (status, Json(body)) = subscribe(Json(SubscribeRequest {
            email: "   ".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.as_deref(), Some("Email is required"));
    }

    #[tokio::test]
    async fn test_subscribe_accepts_a_valid_email() {
        let (status, Json(body)) = subscribe(Json(SubscribeRequest {
            email: "Ada@Example.COM".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message.as_deref(), Some("Successfully subscribed!"));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_a_padded_email() {
        let (status, Json(body)) = subscribe(Json(SubscribeRequest {
            email: " ada@example.com ".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.as_deref(), Some("Invalid email address"));
    }

    #[tokio::test]
    async fn test_subscribe_accepts_a_trailing_dot_domain() {
        let (status, Json(body)) = subscribe(Json(SubscribeRequest {
            email: "ada@example.com.".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
    }
}
