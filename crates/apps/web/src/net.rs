use futures_util::future::LocalBoxFuture;
use gloo_net::http::Request;
use sections::host::{FetchError, PathSource};

/// Fetches trail GeoJSON over HTTP.
#[derive(Default)]
pub struct FetchPathSource;

async fn fetch_text(url: String) -> Result<String, FetchError> {
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    if !resp.ok() {
        return Err(FetchError::Status(resp.status()));
    }
    resp.text()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))
}

impl PathSource for FetchPathSource {
    fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<String, FetchError>> {
        Box::pin(fetch_text(url.to_string()))
    }
}
