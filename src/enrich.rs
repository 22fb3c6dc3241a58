//! Client for the Enrich API: email verification plus person and network
//! enrichment.
//!
//! Enrichment lookups are computed asynchronously: the API answers
//! `201 Created` until the record is ready, which [`ClientOptions::enrich`]
//! turns into polling.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    models::{display_as_json, Company, Network, Person},
    CancelToken, ClientOptions, Credentials, Dispatcher, Response, Result,
};

pub const DEFAULT_ENRICH_URL: &str = "https://api.enrichdata.com/v1/";
pub const ENRICH_USER_AGENT: &str = concat!("enrich-api-rust/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Enrich REST API.
#[derive(Clone, Debug)]
pub struct EnrichClient {
    dispatcher: Dispatcher,
}

impl EnrichClient {
    /// Creates an authenticated client against the public endpoint.
    pub fn new(user_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_ENRICH_URL).authenticate(user_id, secret_key)
    }

    /// Creates an unauthenticated client against `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            dispatcher: Dispatcher::new(base_url, ENRICH_USER_AGENT, ClientOptions::enrich()),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `ENRICH_API_USER_ID` and `ENRICH_API_SECRET_KEY` (required)
    /// - `ENRICH_API_URL` (optional, defaults to the public endpoint)
    pub fn from_env() -> std::result::Result<Self, String> {
        let credentials = Credentials::from_env("ENRICH_API")?;
        let base_url = std::env::var("ENRICH_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENRICH_URL.to_owned());
        Ok(Self::with_base_url(base_url).with_credentials(credentials))
    }

    /// Sets the Basic auth credentials sent with every request.
    pub fn authenticate(self, user_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.with_credentials(Credentials::new(user_id, secret_key))
    }

    pub fn with_credentials(self, credentials: Credentials) -> Self {
        Self {
            dispatcher: self.dispatcher.with_credentials(credentials),
        }
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(self, opts: ClientOptions) -> Self {
        Self {
            dispatcher: self.dispatcher.with_options(opts),
        }
    }

    /// Replaces the underlying `reqwest` client.
    pub fn with_http_client(self, http: reqwest::Client) -> Self {
        Self {
            dispatcher: self.dispatcher.with_http_client(http),
        }
    }

    /// Returns a handle whose calls stop once `token` is cancelled.
    pub fn with_cancel(self, token: CancelToken) -> Self {
        Self {
            dispatcher: self.dispatcher.with_cancel(token),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn verify(&self) -> Verify<'_> {
        Verify { client: self }
    }

    pub fn enrich(&self) -> Enrich<'_> {
        Enrich { client: self }
    }

    async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<Response<T>>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let request = self.dispatcher.prepare(Method::GET, path, query)?;
        self.dispatcher.execute_json(&request).await
    }
}

/// Email verification endpoints.
#[derive(Clone, Copy, Debug)]
pub struct Verify<'a> {
    client: &'a EnrichClient,
}

impl Verify<'_> {
    /// Checks whether `email` is valid and whether its mailbox exists.
    pub async fn validate_email(&self, email: &str) -> Result<Response<ValidateEmailData>> {
        self.client
            .get("verify/validate/email", &[("email", email)])
            .await
    }

    /// Formats an email for a person and returns the company email pattern.
    pub async fn format_email(
        &self,
        email_domain: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Response<FormatEmailData>> {
        self.client
            .get(
                "verify/format/email",
                &[
                    ("email_domain", email_domain),
                    ("first_name", first_name),
                    ("last_name", last_name),
                ],
            )
            .await
    }
}

/// Person and network enrichment endpoints.
#[derive(Clone, Copy, Debug)]
pub struct Enrich<'a> {
    client: &'a EnrichClient,
}

impl Enrich<'_> {
    /// Enriches a person looked up by `key` (e.g. `email`) with personal and
    /// company information.
    pub async fn person_by(&self, key: &str, value: &str) -> Result<Response<EnrichPersonData>> {
        self.client.get("enrich/person", &[(key, value)]).await
    }

    /// Enriches a network looked up by `key` (e.g. `ip`) with network and
    /// company information.
    pub async fn network_by(&self, key: &str, value: &str) -> Result<Response<EnrichNetworkData>> {
        self.client.get("enrich/network", &[(key, value)]).await
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichPersonData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<Company>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichNetworkData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateEmailData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ValidateEmailResults>,
}

/// Individual checks behind an email validation verdict.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateEmailResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gravatar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gibberish: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webmail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx_records: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_server: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_check: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spf_policy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dmarc_policy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catch_all: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_volume: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatEmailData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

display_as_json!(
    EnrichPersonData,
    EnrichNetworkData,
    ValidateEmailData,
    ValidateEmailResults,
    FormatEmailData,
);

#[cfg(test)]
mod tests {
    use super::{EnrichClient, ValidateEmailData, ENRICH_USER_AGENT};
    use crate::{CancelToken, ClientOptions};

    #[test]
    fn debug_redacts_secret_key() {
        let client = EnrichClient::new("ui_user", "sk_secret");
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("sk_secret"));
    }

    #[test]
    fn with_cancel_chains_like_other_builders() {
        let client = EnrichClient::with_base_url("http://localhost:8080/v1/")
            .with_cancel(CancelToken::new())
            .with_options(ClientOptions {
                max_retries: 5,
                ..ClientOptions::enrich()
            })
            .authenticate("ui_user", "sk_secret");

        assert_eq!(client.dispatcher().options().max_retries, 5);
        assert_eq!(client.dispatcher().base_url(), "http://localhost:8080/v1/");
    }

    #[test]
    fn user_agent_names_crate_version() {
        assert!(ENRICH_USER_AGENT.starts_with("enrich-api-rust/"));
        assert!(ENRICH_USER_AGENT.len() > "enrich-api-rust/".len());
    }

    #[test]
    fn validate_email_data_renders_only_present_fields() {
        let data: ValidateEmailData =
            serde_json::from_str(r#"{"valid":true,"results":{"webmail":false}}"#)
                .expect("must decode");
        assert_eq!(
            data.to_string(),
            r#"{"valid":true,"results":{"webmail":false}}"#
        );
    }
}
