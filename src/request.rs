use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT},
    Method, Url,
};
use serde::Serialize;

use crate::{ClientOptions, Credentials, EnrichError, Result};

const JSON_CONTENT_TYPE: &str = "application/json";

/// A fully built request, re-sent verbatim on every attempt of a call.
///
/// Method, URL, headers, credentials and body are fixed at construction;
/// only the wall-clock time of each send changes between attempts.
#[derive(Debug)]
pub struct PreparedRequest {
    inner: reqwest::Request,
}

impl PreparedRequest {
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.inner.body().and_then(|body| body.as_bytes())
    }

    /// Copy of the request for a single send.
    pub(crate) fn attempt(&self) -> Result<reqwest::Request> {
        self.inner.try_clone().ok_or_else(|| {
            EnrichError::InvalidRequest("request body cannot be replayed".to_owned())
        })
    }
}

/// Resolves `path` against `base_url` and appends percent-encoded query pairs.
pub(crate) fn resolve_url(base_url: &str, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let base = normalize_base_url(base_url);
    let base = Url::parse(&base)
        .map_err(|err| EnrichError::InvalidRequest(format!("invalid base url '{base}': {err}")))?;
    let mut url = base
        .join(path.trim_start_matches('/'))
        .map_err(|err| EnrichError::InvalidRequest(format!("invalid path '{path}': {err}")))?;

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

pub(crate) struct RequestParts<'a> {
    pub method: Method,
    pub url: Url,
    pub body: Option<Vec<u8>>,
    pub user_agent: &'a str,
    pub credentials: Option<&'a Credentials>,
    pub options: &'a ClientOptions,
}

pub(crate) fn build(http: &reqwest::Client, parts: RequestParts<'_>) -> Result<PreparedRequest> {
    let user_agent = HeaderValue::from_str(parts.user_agent)
        .map_err(|err| EnrichError::InvalidRequest(format!("invalid user agent: {err}")))?;

    let mut builder = http
        .request(parts.method, parts.url)
        .header(ACCEPT, JSON_CONTENT_TYPE)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(USER_AGENT, user_agent)
        .timeout(parts.options.timeout());

    if let Some(credentials) = parts.credentials {
        builder = builder.basic_auth(&credentials.user_id, Some(&credentials.secret_key));
    }
    if let Some(body) = parts.body {
        builder = builder.body(body);
    }

    let inner = builder
        .build()
        .map_err(|err| EnrichError::InvalidRequest(err.to_string()))?;
    Ok(PreparedRequest { inner })
}

pub(crate) fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body)
        .map_err(|err| EnrichError::InvalidRequest(format!("body could not be encoded: {err}")))
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT},
        Method,
    };

    use super::{build, resolve_url, RequestParts};
    use crate::{ClientOptions, Credentials};

    #[test]
    fn resolves_relative_path_under_versioned_base() {
        let url = resolve_url(
            "https://api.enrichdata.com/v1/",
            "verify/validate/email",
            &[("email", "valerian@crisp.chat")],
        )
        .expect("url must resolve");

        assert_eq!(
            url.as_str(),
            "https://api.enrichdata.com/v1/verify/validate/email?email=valerian%40crisp.chat"
        );
    }

    #[test]
    fn base_without_trailing_slash_keeps_its_last_segment() {
        let url = resolve_url("http://127.0.0.1:9000/v1", "/search/suggest/companies/1", &[])
            .expect("url must resolve");
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/v1/search/suggest/companies/1");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let url = resolve_url(
            "https://api.graphmob.com/v1/",
            "search/lookup/emails/1",
            &[("email_domain", "crisp.chat"), ("legal_name", "Crisp IM, Inc.")],
        )
        .expect("url must resolve");

        assert_eq!(
            url.query(),
            Some("email_domain=crisp.chat&legal_name=Crisp+IM%2C+Inc.")
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(resolve_url("not a url", "verify", &[]).is_err());
    }

    #[test]
    fn prepared_request_carries_json_headers_and_basic_auth() {
        let http = reqwest::Client::new();
        let options = ClientOptions::enrich();
        let credentials = Credentials::new("user", "secret");
        let url = resolve_url("https://api.enrichdata.com/v1/", "enrich/person", &[])
            .expect("url must resolve");

        let request = build(
            &http,
            RequestParts {
                method: Method::GET,
                url,
                body: None,
                user_agent: "enrich-api-rust/test",
                credentials: Some(&credentials),
                options: &options,
            },
        )
        .expect("request must build");

        let headers = request.headers();
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[USER_AGENT], "enrich-api-rust/test");
        // base64("user:secret")
        assert_eq!(headers[AUTHORIZATION], "Basic dXNlcjpzZWNyZXQ=");
        assert!(request.body().is_none());

        let replay = request.attempt().expect("request must be replayable");
        assert_eq!(replay.url(), request.url());
        assert_eq!(replay.headers(), request.headers());
    }
}
