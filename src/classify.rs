//! Status-code classification for the poll-retry loop and error-body
//! extraction.
//!
//! Everything here is pure: the dispatcher feeds in what it received and acts
//! on the returned [`RetryDecision`].

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;

use crate::ClientOptions;

pub(crate) const GENERIC_REASON: &str = "error";
pub(crate) const GENERIC_MESSAGE: &str = "Request could not be submitted.";
pub(crate) const EXHAUSTED_REASON: &str = "not_found";
pub(crate) const EXHAUSTED_MESSAGE: &str =
    "The requested item was not found, after attempted discovery.";

/// What the dispatcher should do with a completed exchange.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryDecision {
    /// Stop and use this response, successful or not.
    Accept,
    /// Hold for the given duration, then send the same request again.
    RetryAfter(Duration),
    /// Still pending but the attempt budget is spent.
    Abort,
}

/// Decides the fate of attempt `attempt` (zero-based) from its status code.
///
/// The processing status always asks for a retry. The not-found status only
/// does once a retry is underway: a first-attempt 404 is a genuine client
/// error and is accepted as such.
pub fn classify(
    options: &ClientOptions,
    status: u16,
    attempt: usize,
    headers: &HeaderMap,
) -> RetryDecision {
    let pending = status == options.processing_status
        || (attempt > 0 && status == options.not_found_status);

    if !pending {
        return RetryDecision::Accept;
    }
    if attempt >= options.max_retries {
        return RetryDecision::Abort;
    }
    RetryDecision::RetryAfter(hold_from_headers(headers, options.default_hold()))
}

/// Reads `Retry-After` as whole seconds, falling back to `default`.
///
/// HTTP-date values, negative numbers and values above `i32::MAX` are
/// ignored.
pub fn hold_from_headers(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i32>().ok())
        .and_then(|seconds| u64::try_from(seconds).ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Normalized reason and message of a failed response.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassifiedError {
    pub reason: String,
    pub message: String,
}

impl ClassifiedError {
    pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub(crate) fn generic() -> Self {
        Self::new(GENERIC_REASON, GENERIC_MESSAGE)
    }

    pub(crate) fn exhausted() -> Self {
        Self::new(EXHAUSTED_REASON, EXHAUSTED_MESSAGE)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Nested { error: ErrorBody },
    Flat(ErrorBody),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extracts the error carried by a non-success body.
///
/// Both `{"error": {"reason", "message"}}` and the flat `{"reason", "message"}`
/// shapes are understood, and either field may be missing. A body with
/// neither field, or one that is not JSON, yields the generic `error` reason.
pub fn extract_error(body: &[u8]) -> ClassifiedError {
    let error = match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope::Nested { error }) | Ok(ErrorEnvelope::Flat(error)) => error,
        Err(_) => return ClassifiedError::generic(),
    };
    match error {
        ErrorBody {
            reason: None,
            message: None,
        } => ClassifiedError::generic(),
        ErrorBody { reason, message } => {
            ClassifiedError::new(reason.unwrap_or_default(), message.unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    use super::{classify, extract_error, hold_from_headers, ClassifiedError, RetryDecision};
    use crate::ClientOptions;

    fn retry_after(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn success_is_accepted() {
        let options = ClientOptions::graphmob();
        for attempt in 0..3 {
            assert_eq!(
                classify(&options, 200, attempt, &HeaderMap::new()),
                RetryDecision::Accept
            );
        }
    }

    #[test]
    fn processing_status_schedules_default_hold() {
        let options = ClientOptions::graphmob();
        assert_eq!(
            classify(&options, 102, 0, &HeaderMap::new()),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
    }

    #[test]
    fn processing_status_prefers_retry_after_header() {
        let options = ClientOptions::enrich();
        assert_eq!(
            classify(&options, 201, 0, &retry_after("12")),
            RetryDecision::RetryAfter(Duration::from_secs(12))
        );
    }

    #[test]
    fn created_is_plain_success_on_graphmob_surface() {
        let options = ClientOptions::graphmob();
        assert_eq!(
            classify(&options, 201, 0, &HeaderMap::new()),
            RetryDecision::Accept
        );
    }

    #[test]
    fn first_not_found_is_terminal_but_later_ones_retry() {
        let options = ClientOptions::enrich();
        assert_eq!(
            classify(&options, 404, 0, &HeaderMap::new()),
            RetryDecision::Accept
        );
        assert_eq!(
            classify(&options, 404, 1, &retry_after("0")),
            RetryDecision::RetryAfter(Duration::ZERO)
        );
    }

    #[test]
    fn pending_past_budget_aborts() {
        let options = ClientOptions::enrich();
        assert_eq!(
            classify(&options, 201, 2, &HeaderMap::new()),
            RetryDecision::Abort
        );
        assert_eq!(
            classify(&options, 404, 2, &HeaderMap::new()),
            RetryDecision::Abort
        );
    }

    #[test]
    fn zero_retry_budget_aborts_on_first_pending() {
        let options = ClientOptions {
            max_retries: 0,
            ..ClientOptions::enrich()
        };
        assert_eq!(
            classify(&options, 201, 0, &HeaderMap::new()),
            RetryDecision::Abort
        );
    }

    #[test]
    fn unusable_retry_after_falls_back_to_default() {
        let default = Duration::from_secs(5);
        assert_eq!(hold_from_headers(&retry_after("-3"), default), default);
        assert_eq!(hold_from_headers(&retry_after("1.5"), default), default);
        assert_eq!(hold_from_headers(&retry_after("2147483648"), default), default);
        assert_eq!(hold_from_headers(&retry_after("4294967296"), default), default);
        assert_eq!(
            hold_from_headers(&retry_after("18446744073709551615"), default),
            default
        );
        assert_eq!(
            hold_from_headers(&retry_after("2147483647"), default),
            Duration::from_secs(2_147_483_647)
        );
        assert_eq!(
            hold_from_headers(&retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), default),
            default
        );
        assert_eq!(
            hold_from_headers(&retry_after(" 7 "), default),
            Duration::from_secs(7)
        );
    }

    #[test]
    fn nested_envelope_is_extracted() {
        let error = extract_error(br#"{"error":{"reason":"not_found","message":"x"}}"#);
        assert_eq!(error, ClassifiedError::new("not_found", "x"));
    }

    #[test]
    fn flat_envelope_is_extracted() {
        let error = extract_error(br#"{"reason":"invalid_email","message":"bad"}"#);
        assert_eq!(error, ClassifiedError::new("invalid_email", "bad"));
    }

    #[test]
    fn envelope_missing_one_field_keeps_the_other() {
        assert_eq!(
            extract_error(br#"{"error":{"message":"x"}}"#),
            ClassifiedError::new("", "x")
        );
        assert_eq!(
            extract_error(br#"{"reason":"quota_exceeded"}"#),
            ClassifiedError::new("quota_exceeded", "")
        );
    }

    #[test]
    fn malformed_or_empty_body_yields_generic_error() {
        let generic = ClassifiedError::new("error", "Request could not be submitted.");
        assert_eq!(extract_error(b""), generic);
        assert_eq!(extract_error(b"<html>502</html>"), generic);
        assert_eq!(extract_error(br#"{"error":"boom"}"#), generic);
        assert_eq!(extract_error(br#"{"error":{}}"#), generic);
        assert_eq!(extract_error(b"{}"), generic);
    }
}
