//! Browser fetch for the search endpoint.

use cliplens_core::{CliplensError, RawSearchResponse, Result, SearchRequest, SEARCH_ENDPOINT};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

/// Perform one search request. A rejected fetch, a non-OK status, or an
/// undecodable body all end the stream; the caller never retries.
pub async fn fetch_search(request: &SearchRequest) -> Result<RawSearchResponse> {
    let window = web_sys::window()
        .ok_or_else(|| CliplensError::TransportFailure("no window".into()))?;

    let url = request.url(SEARCH_ENDPOINT);
    let response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(|err| CliplensError::TransportFailure(format!("{err:?}")))?;
    let response: Response = response
        .dyn_into()
        .map_err(|_| CliplensError::TransportFailure("fetch did not yield a Response".into()))?;

    if !response.ok() {
        return Err(CliplensError::TransportFailure(format!(
            "status {}",
            response.status()
        )));
    }

    let body = response
        .json()
        .map_err(|err| CliplensError::MalformedResponse(format!("{err:?}")))?;
    let body = JsFuture::from(body)
        .await
        .map_err(|err| CliplensError::MalformedResponse(format!("{err:?}")))?;

    serde_wasm_bindgen::from_value(body)
        .map_err(|err| CliplensError::MalformedResponse(err.to_string()))
}
