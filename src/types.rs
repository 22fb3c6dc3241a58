use reqwest::{header::HeaderMap, StatusCode, Url};

/// Transport-level view of the final HTTP exchange of a call.
///
/// Kept on both success and error paths so callers can inspect the status
/// code and headers even when decoding failed.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
    /// Number of sends performed for the call, including the first one.
    pub attempts: usize,
}

/// Decoded payload together with the raw response it came from.
#[derive(Clone, Debug)]
pub struct Response<T> {
    pub data: T,
    pub raw: RawResponse,
}

impl<T> Response<T> {
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn status(&self) -> StatusCode {
        self.raw.status
    }
}
