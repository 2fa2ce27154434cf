use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Middleware collecting HTTP metrics (latency, request count)
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    // Execute the request
    let response = next.run(req).await;

    // Record metrics
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Normalize URL path to avoid cardinality explosion. Usernames (the segment
/// after "users"), ids and dates are replaced with placeholders.
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized: Vec<String> = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        let after_users = i > 0 && segments[i - 1] == "users";
        if after_users && !segment.is_empty() {
            normalized.push("{username}".to_string());
        } else if is_uuid_like(segment) || is_numeric_id(segment) {
            normalized.push("{id}".to_string());
        } else if is_date_like(segment) {
            normalized.push("{date}".to_string());
        } else {
            normalized.push(segment.to_string());
        }
    }

    normalized.join("/")
}

/// Check if string looks like a UUID
fn is_uuid_like(s: &str) -> bool {
    // UUID format: 8-4-4-4-12 hex characters
    if s.len() != 36 {
        return false;
    }
    s.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Check if string is a numeric ID
fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Check if string looks like a YYYY-MM-DD date
fn is_date_like(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && s.char_indices()
            .all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path("/api/v1/users/alice/quiz"),
            "/api/v1/users/{username}/quiz"
        );
        assert_eq!(
            normalize_path("/api/v1/users/alice/wordle/submit"),
            "/api/v1/users/{username}/wordle/submit"
        );
        assert_eq!(
            normalize_path("/api/v1/quiz/550e8400-e29b-41d4-a716-446655440000"),
            "/api/v1/quiz/{id}"
        );
        assert_eq!(normalize_path("/api/v1/quiz/2025-01-01"), "/api/v1/quiz/{date}");
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/metrics"), "/metrics");
    }

    #[test]
    fn test_is_uuid_like() {
        assert!(is_uuid_like("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_uuid_like("not-a-uuid"));
        assert!(!is_uuid_like("12345"));
    }

    #[test]
    fn test_is_numeric_id() {
        assert!(is_numeric_id("123"));
        assert!(!is_numeric_id("abc"));
        assert!(!is_numeric_id(""));
    }

    #[test]
    fn test_is_date_like() {
        assert!(is_date_like("2025-01-01"));
        assert!(!is_date_like("2025-1-1"));
        assert!(!is_date_like("20250101"));
        assert!(!is_date_like("abcd-ef-gh"));
    }
}
