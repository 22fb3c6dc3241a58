use std::fmt;
use std::future::Future;
use std::io::Write;
use std::time::Duration;

use reqwest::{header::HeaderMap, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use tokio::time::{sleep, Instant};

use crate::{
    classify::{classify, extract_error, ClassifiedError, RetryDecision},
    request::{self, PreparedRequest, RequestParts},
    CancelToken, ClientOptions, Credentials, EnrichError, RawResponse, Response, Result,
};

/// Sends prepared requests and runs the poll-retry loop around them.
///
/// Holds only immutable configuration, so one dispatcher (or its clones) can
/// serve any number of concurrent calls.
#[derive(Clone)]
pub struct Dispatcher {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    credentials: Option<Credentials>,
    options: ClientOptions,
    cancel: Option<CancelToken>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            user_agent: user_agent.into(),
            credentials: None,
            options,
            cancel: None,
        }
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Binds calls made through this handle to `token`.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Builds a bodyless request for `path` (relative to the base URL).
    pub fn prepare(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<PreparedRequest> {
        self.prepare_inner(method, path, query, None)
    }

    /// Builds a request whose body is `body` encoded as JSON.
    pub fn prepare_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<PreparedRequest> {
        let body = request::encode_body(body)?;
        self.prepare_inner(method, path, query, Some(body))
    }

    fn prepare_inner(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<PreparedRequest> {
        let url = request::resolve_url(&self.base_url, path, query)?;
        request::build(
            &self.http,
            RequestParts {
                method,
                url,
                body,
                user_agent: &self.user_agent,
                credentials: self.credentials.as_ref(),
                options: &self.options,
            },
        )
    }

    /// Executes `request` and decodes its body as JSON into `T`.
    ///
    /// An empty body leaves every field of `T` at its default.
    pub async fn execute_json<T>(&self, request: &PreparedRequest) -> Result<Response<T>>
    where
        T: DeserializeOwned + Default,
    {
        let exchange = self.execute_exchange(request).await?;
        decode_json(exchange)
    }

    /// Executes `request` and returns the raw success body.
    pub async fn execute_bytes(&self, request: &PreparedRequest) -> Result<Response<Vec<u8>>> {
        let exchange = self.execute_exchange(request).await?;
        into_success(exchange)
    }

    /// Executes `request` and copies the raw success body into `sink`.
    pub async fn execute_into<W: Write>(
        &self,
        request: &PreparedRequest,
        sink: &mut W,
    ) -> Result<RawResponse> {
        let response = self.execute_bytes(request).await?;
        if let Err(err) = sink.write_all(&response.data) {
            return Err(EnrichError::Decode {
                message: format!("response body could not be written: {err}"),
                response: response.raw,
            });
        }
        Ok(response.raw)
    }

    /// Executes `request` and discards any success body.
    pub async fn execute_discard(&self, request: &PreparedRequest) -> Result<RawResponse> {
        self.execute_bytes(request).await.map(|response| response.raw)
    }

    async fn execute_exchange(&self, request: &PreparedRequest) -> Result<Exchange> {
        run_attempts(&self.options, self.cancel.as_ref(), move |attempt| {
            self.send_once(request, attempt)
        })
        .await
    }

    async fn send_once(&self, request: &PreparedRequest, attempt: usize) -> Result<Exchange> {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            attempt,
            "sending request"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = attempt;

        let response = self
            .http
            .execute(request.attempt()?)
            .await
            .map_err(EnrichError::Transport)?;

        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        // Reading the whole body hands the connection back to the pool.
        let body = response.bytes().await.map_err(EnrichError::Transport)?;

        Ok(Exchange {
            status,
            headers,
            url,
            body: body.to_vec(),
            attempts: 0,
        })
    }
}

/// One completed HTTP exchange.
#[derive(Debug)]
pub(crate) struct Exchange {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
    pub body: Vec<u8>,
    /// Sends performed for the call so far, set by the retry loop.
    pub attempts: usize,
}

impl Exchange {
    fn into_parts(self) -> (RawResponse, Vec<u8>) {
        let raw = RawResponse {
            status: self.status,
            headers: self.headers,
            url: self.url,
            attempts: self.attempts,
        };
        (raw, self.body)
    }
}

/// Runs the bounded poll-retry loop.
///
/// `send` performs attempt `n` (zero-based). Transport failures returned by
/// `send` end the call immediately; only status codes drive retries.
pub(crate) async fn run_attempts<F, Fut>(
    options: &ClientOptions,
    cancel: Option<&CancelToken>,
    mut send: F,
) -> Result<Exchange>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Exchange>>,
{
    let started = Instant::now();
    let mut attempt = 0usize;
    let mut hold = Duration::ZERO;

    loop {
        if !hold.is_zero() {
            wait_before_retry(hold, cancel, attempt).await?;
        }
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(EnrichError::Cancelled { attempts: attempt });
        }

        let mut exchange = send(attempt).await?;
        exchange.attempts = attempt + 1;

        match classify(
            options,
            exchange.status.as_u16(),
            attempt,
            &exchange.headers,
        ) {
            RetryDecision::Accept => return Ok(exchange),
            RetryDecision::RetryAfter(next_hold) => {
                if let Some(deadline) = options.deadline() {
                    // An unrepresentable end time counts as past the deadline.
                    let crosses = started
                        .elapsed()
                        .checked_add(next_hold)
                        .map_or(true, |end| end > deadline);
                    if crosses {
                        return Err(EnrichError::DeadlineExceeded {
                            attempts: exchange.attempts,
                        });
                    }
                }

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    status = exchange.status.as_u16(),
                    attempt,
                    hold_secs = next_hold.as_secs(),
                    "request still processing, scheduling retry"
                );

                hold = next_hold;
                attempt += 1;
            }
            RetryDecision::Abort => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    status = exchange.status.as_u16(),
                    attempts = exchange.attempts,
                    "retry budget exhausted"
                );

                let attempts = exchange.attempts;
                let (response, _) = exchange.into_parts();
                return Err(EnrichError::Exhausted {
                    error: ClassifiedError::exhausted(),
                    attempts,
                    response,
                });
            }
        }
    }
}

async fn wait_before_retry(
    hold: Duration,
    cancel: Option<&CancelToken>,
    attempts: usize,
) -> Result<()> {
    match cancel {
        Some(token) => tokio::select! {
            _ = sleep(hold) => Ok(()),
            _ = token.cancelled() => Err(EnrichError::Cancelled { attempts }),
        },
        None => {
            sleep(hold).await;
            Ok(())
        }
    }
}

/// Splits an accepted exchange into success body or classified error.
pub(crate) fn into_success(exchange: Exchange) -> Result<Response<Vec<u8>>> {
    let (raw, body) = exchange.into_parts();
    if !raw.status.is_success() {
        let error = extract_error(&body);

        #[cfg(feature = "tracing")]
        tracing::debug!(status = raw.status.as_u16(), reason = %error.reason, "request failed");

        return Err(EnrichError::Api {
            error,
            response: raw,
        });
    }
    Ok(Response { data: body, raw })
}

pub(crate) fn decode_json<T>(exchange: Exchange) -> Result<Response<T>>
where
    T: DeserializeOwned + Default,
{
    let Response { data: body, raw } = into_success(exchange)?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Response {
            data: T::default(),
            raw,
        });
    }
    match serde_json::from_slice::<T>(&body) {
        Ok(data) => Ok(Response { data, raw }),
        Err(err) => Err(EnrichError::Decode {
            message: format!(
                "invalid response JSON: {err}; body: {}",
                String::from_utf8_lossy(&body)
            ),
            response: raw,
        }),
    }
}
