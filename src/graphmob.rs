//! Client for the Graphmob search API.

use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    models::{display_as_json, Company, Contact, Name, Person},
    CancelToken, ClientOptions, Credentials, Dispatcher, Response, Result,
};

pub const DEFAULT_GRAPHMOB_URL: &str = "https://api.graphmob.com/v1/";
pub const GRAPHMOB_USER_AGENT: &str = concat!("graphmob-api-rust/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Graphmob REST API.
#[derive(Clone, Debug)]
pub struct GraphmobClient {
    dispatcher: Dispatcher,
}

impl GraphmobClient {
    /// Creates an authenticated client against the public endpoint.
    pub fn new(user_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GRAPHMOB_URL).authenticate(user_id, secret_key)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            dispatcher: Dispatcher::new(
                base_url,
                GRAPHMOB_USER_AGENT,
                ClientOptions::graphmob(),
            ),
        }
    }

    /// Creates a client from `GRAPHMOB_API_USER_ID`, `GRAPHMOB_API_SECRET_KEY`
    /// and the optional `GRAPHMOB_API_URL`.
    pub fn from_env() -> std::result::Result<Self, String> {
        let credentials = Credentials::from_env("GRAPHMOB_API")?;
        let base_url = std::env::var("GRAPHMOB_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GRAPHMOB_URL.to_owned());
        Ok(Self::with_base_url(base_url).with_credentials(credentials))
    }

    pub fn authenticate(self, user_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.with_credentials(Credentials::new(user_id, secret_key))
    }

    pub fn with_credentials(self, credentials: Credentials) -> Self {
        Self {
            dispatcher: self.dispatcher.with_credentials(credentials),
        }
    }

    pub fn with_options(self, opts: ClientOptions) -> Self {
        Self {
            dispatcher: self.dispatcher.with_options(opts),
        }
    }

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

    pub fn search(&self) -> Search<'_> {
        Search { client: self }
    }
}

/// Paginated people, company and email search endpoints.
#[derive(Clone, Copy, Debug)]
pub struct Search<'a> {
    client: &'a GraphmobClient,
}

impl Search<'_> {
    /// Looks up people worldwide matching `key=value` (e.g. `company_name`).
    pub async fn lookup_people_by(
        &self,
        page_number: u32,
        key: &str,
        value: &str,
    ) -> Result<Response<LookupPeopleData>> {
        self.get(&format!("search/lookup/people/{page_number}"), &[(key, value)])
            .await
    }

    /// Looks up companies worldwide matching `key=value`.
    pub async fn lookup_companies_by(
        &self,
        page_number: u32,
        key: &str,
        value: &str,
    ) -> Result<Response<LookupCompaniesData>> {
        self.get(
            &format!("search/lookup/companies/{page_number}"),
            &[(key, value)],
        )
        .await
    }

    /// Lists known emails of a company, given its email domain or legal name.
    pub async fn lookup_emails(
        &self,
        page_number: u32,
        email_domain: &str,
        legal_name: &str,
    ) -> Result<Response<LookupEmailsData>> {
        self.get(
            &format!("search/lookup/emails/{page_number}"),
            &[("email_domain", email_domain), ("legal_name", legal_name)],
        )
        .await
    }

    /// Suggests companies whose name resembles `company_name`.
    pub async fn suggest_companies(
        &self,
        page_number: u32,
        company_name: &str,
    ) -> Result<Response<SuggestCompaniesData>> {
        self.get(
            &format!("search/suggest/companies/{page_number}"),
            &[("company_name", company_name)],
        )
        .await
    }

    async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<Response<T>>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let dispatcher = &self.client.dispatcher;
        let request = dispatcher.prepare(Method::GET, path, query)?;
        dispatcher.execute_json(&request).await
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupPeopleData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<Person>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupCompaniesData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<Company>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupEmailsData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_card: Option<LookupEmailsCompanyCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<LookupEmailsEmail>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEmailsCompanyCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_pattern: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupEmailsEmail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_card: Option<LookupEmailsPersonCard>,
}

/// Short person record attached to a looked-up email.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupEmailsPersonCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Name>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestCompaniesData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<SuggestCompaniesItem>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestCompaniesItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

display_as_json!(
    LookupPeopleData,
    LookupCompaniesData,
    LookupEmailsData,
    LookupEmailsCompanyCard,
    LookupEmailsEmail,
    LookupEmailsPersonCard,
    SuggestCompaniesData,
    SuggestCompaniesItem,
);

#[cfg(test)]
mod tests {
    use super::{GraphmobClient, LookupEmailsData};

    #[test]
    fn default_surface_polls_on_processing() {
        let client = GraphmobClient::new("ui_user", "sk_secret");
        let options = client.dispatcher().options();
        assert_eq!(options.processing_status, 102);
        assert_eq!(options.timeout_ms, 40_000);
        assert_eq!(client.dispatcher().base_url(), "https://api.graphmob.com/v1/");
    }

    #[test]
    fn lookup_emails_data_decodes_person_cards() {
        let data: LookupEmailsData = serde_json::from_str(
            r#"{
                "company_card": {"legal_name": "Crisp IM, Inc.", "email_pattern": "{first}"},
                "emails": [{"email": "valerian@crisp.chat", "person_card": {"name": {"first": "Valerian"}}}]
            }"#,
        )
        .expect("must decode");

        let emails = data.emails.expect("emails must be present");
        let card = emails[0].person_card.as_ref().expect("card must be present");
        assert_eq!(
            card.name.as_ref().and_then(|name| name.first.as_deref()),
            Some("Valerian")
        );
        assert_eq!(
            data.company_card.and_then(|card| card.email_pattern),
            Some("{first}".to_owned())
        );
    }
}
