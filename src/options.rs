use std::fmt;
use std::time::Duration;

/// Configures per-send timeout and the poll-retry behavior of a client.
///
/// Each API surface signals "accepted, still computing" with its own status
/// code, so the retry trigger lives here rather than in the dispatcher.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-send timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Hold used when the server sends no usable `Retry-After` header.
    pub default_hold_secs: u64,
    /// Status code meaning the lookup is still being processed.
    pub processing_status: u16,
    /// Status code retried only once a retry is already underway.
    pub not_found_status: u16,
    /// Optional wall-clock bound across all attempts of a single call.
    pub deadline_ms: Option<u64>,
}

impl ClientOptions {
    /// Options matching the Enrich API, which answers `201 Created` while a
    /// lookup is computed in the background.
    pub fn enrich() -> Self {
        Self {
            timeout_ms: 5_000,
            max_retries: 2,
            default_hold_secs: 5,
            processing_status: 201,
            not_found_status: 404,
            deadline_ms: None,
        }
    }

    /// Options matching the Graphmob API, which answers `102 Processing`.
    pub fn graphmob() -> Self {
        Self {
            timeout_ms: 40_000,
            processing_status: 102,
            ..Self::enrich()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn default_hold(&self) -> Duration {
        Duration::from_secs(self.default_hold_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::enrich()
    }
}

/// HTTP Basic credentials: the account user ID and its secret key.
#[derive(Clone, Eq, PartialEq)]
pub struct Credentials {
    pub user_id: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(user_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Reads credentials from `<prefix>_USER_ID` and `<prefix>_SECRET_KEY`.
    pub(crate) fn from_env(prefix: &str) -> std::result::Result<Self, String> {
        let user_id = read_env(&format!("{prefix}_USER_ID"))?;
        let secret_key = read_env(&format!("{prefix}_SECRET_KEY"))?;
        Ok(Self::new(user_id, secret_key))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

fn read_env(name: &str) -> std::result::Result<String, String> {
    let value =
        std::env::var(name).map_err(|_| format!("missing {name} environment variable"))?;
    if value.trim().is_empty() {
        return Err(format!("{name} is set but empty"));
    }
    Ok(value.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::{ClientOptions, Credentials};

    #[test]
    fn surfaces_differ_only_in_processing_code_and_timeout() {
        let enrich = ClientOptions::enrich();
        let graphmob = ClientOptions::graphmob();

        assert_eq!(enrich.processing_status, 201);
        assert_eq!(graphmob.processing_status, 102);
        assert_eq!(enrich.max_retries, 2);
        assert_eq!(graphmob.max_retries, 2);
        assert_eq!(graphmob.default_hold_secs, 5);
        assert_eq!(graphmob.not_found_status, 404);
        assert_eq!(ClientOptions::default(), enrich);
    }

    #[test]
    fn debug_redacts_secret_key() {
        let credentials = Credentials::new("ui_user", "sk_secret");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("ui_user"));
        assert!(!debug.contains("sk_secret"));
    }
}
