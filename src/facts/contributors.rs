use super::link_header::LinkHeader;
use super::transport::ApiResponse;
use super::{FetchError, Transport};
use serde::de::IgnoredAny;

const LOG_TARGET: &str = "contributors";

/// Exact number of contributors to `owner/name`, anonymous ones included, in one request.
///
/// With `per_page=1` every page holds one contributor, so the page number of the
/// `rel="last"` link is the total. Without that link there is at most one page and the
/// items in it are counted directly. A missing repository counts as zero.
pub async fn exact_count(transport: &Transport, owner: &str, name: &str) -> Result<u64, FetchError> {
    let url = transport.config().rest_url(&["repos", owner, name, "contributors"])?;
    let params = [("per_page", "1".to_string()), ("anon", "true".to_string())];

    let Some(response) = transport.get(&url, &params).await? else {
        return Ok(0);
    };

    count_from_response(&response)
}

fn count_from_response(response: &ApiResponse) -> Result<u64, FetchError> {
    if let Some(last) = LinkHeader::from_headers(response.headers()).and_then(|h| h.last()) {
        log::debug!(target: LOG_TARGET, "Contributor count from Link header of '{}': {last}", response.url());
        return Ok(last);
    }

    // Empty repositories answer 204 with no body.
    if response.body().iter().all(u8::is_ascii_whitespace) {
        return Ok(0);
    }

    count_json_array_elements(response)
}

/// Count elements in a JSON array without materializing them.
fn count_json_array_elements(response: &ApiResponse) -> Result<u64, FetchError> {
    let array: Vec<IgnoredAny> = response.json()?;
    Ok(array.len() as u64)
}
