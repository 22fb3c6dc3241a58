//! `enrich-api` is an async HTTP client for the Enrich and Graphmob
//! data-enrichment APIs.
//!
//! Some lookups are computed asynchronously on the server. The client hides
//! this: while the API answers with its "processing" status, the request is
//! re-sent after the server's `Retry-After` hint (or a default hold), up to a
//! bounded number of attempts.
//!
//! - [`EnrichClient::verify`] / [`EnrichClient::enrich`]
//! - [`GraphmobClient::search`]
//! - [`Dispatcher`] for hand-built requests

mod cancel;
mod classify;
mod dispatch;
mod enrich;
mod error;
mod graphmob;
mod models;
mod options;
mod request;
mod types;

pub use cancel::CancelToken;
pub use classify::{classify, extract_error, hold_from_headers, ClassifiedError, RetryDecision};
pub use dispatch::Dispatcher;
pub use enrich::{
    Enrich, EnrichClient, EnrichNetworkData, EnrichPersonData, FormatEmailData,
    ValidateEmailData, ValidateEmailResults, Verify, DEFAULT_ENRICH_URL, ENRICH_USER_AGENT,
};
pub use error::EnrichError;
pub use graphmob::{
    GraphmobClient, LookupCompaniesData, LookupEmailsCompanyCard, LookupEmailsData,
    LookupEmailsEmail, LookupEmailsPersonCard, LookupPeopleData, Search, SuggestCompaniesData,
    SuggestCompaniesItem, DEFAULT_GRAPHMOB_URL, GRAPHMOB_USER_AGENT,
};
pub use models::{
    Address, Company, CompanyCategory, CompanyMetrics, CompanyMetricsAnnualRevenue, Contact,
    Coordinates, Geolocation, Name, Network, NetworkBlock, NetworkBlockOwner, NetworkHost,
    NetworkReverse, NetworkUsage, Person, PersonEmployment, PersonSocial, PersonSocialNetwork,
};
pub use options::{ClientOptions, Credentials};
pub use request::PreparedRequest;
pub use types::{RawResponse, Response};

pub use reqwest::{Method, StatusCode};

pub type Result<T> = std::result::Result<T, EnrichError>;
