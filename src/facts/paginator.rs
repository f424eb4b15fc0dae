//! Lazy traversal of page-based listing endpoints.

use super::link_header::LinkHeader;
use super::{FetchError, Transport};
use futures::stream::{self, Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use url::Url;

const LOG_TARGET: &str = "  paginator";

/// Position within a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    /// The next page to request (1-based).
    Page(u32),
    Exhausted,
}

/// Stream every item of a listing endpoint, in server order.
///
/// Requests `per_page` and `page` (starting at 1) on top of `params`. The stream ends after
/// a 404, an empty page, a body that is not a JSON array, or a page shorter than `per_page`.
/// When the server sends a `Link` header, its `next` relation picks the following page and
/// its absence ends the listing.
/// Nothing is fetched until the stream is polled, and dropping it stops further requests.
pub fn paginate<'a, T>(
    transport: &'a Transport,
    url: &'a Url,
    params: &'a [(&'a str, String)],
    per_page: u32,
) -> impl Stream<Item = Result<T, FetchError>> + 'a
where
    T: DeserializeOwned + 'a,
{
    stream::try_unfold(PageCursor::Page(1), move |cursor| advance::<T>(transport, url, params, per_page, cursor))
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, FetchError>)))
        .try_flatten()
}

async fn advance<T: DeserializeOwned>(
    transport: &Transport,
    url: &Url,
    params: &[(&str, String)],
    per_page: u32,
    cursor: PageCursor,
) -> Result<Option<(Vec<T>, PageCursor)>, FetchError> {
    let PageCursor::Page(page) = cursor else {
        return Ok(None);
    };

    let Some((items, link)) = fetch_page::<T>(transport, url, params, per_page, page).await? else {
        return Ok(None);
    };

    let next = if items.len() < per_page as usize {
        PageCursor::Exhausted
    } else {
        match link {
            Some(link) => link
                .next()
                .and_then(|next| u32::try_from(next).ok())
                .map_or(PageCursor::Exhausted, PageCursor::Page),
            None => PageCursor::Page(page + 1),
        }
    };

    Ok(Some((items, next)))
}

/// Fetch one page and its `Link` header. `None` means the listing is over.
async fn fetch_page<T: DeserializeOwned>(
    transport: &Transport,
    url: &Url,
    params: &[(&str, String)],
    per_page: u32,
    page: u32,
) -> Result<Option<(Vec<T>, Option<LinkHeader>)>, FetchError> {
    let mut query: Vec<(&str, String)> = params.to_vec();
    query.push(("per_page", per_page.to_string()));
    query.push(("page", page.to_string()));

    log::debug!(target: LOG_TARGET, "Fetching page {page} of '{url}'");

    let Some(response) = transport.get(url, &query).await? else {
        return Ok(None);
    };

    let serde_json::Value::Array(values) = response.json::<serde_json::Value>()? else {
        log::warn!(target: LOG_TARGET, "Page {page} of '{url}' is not a list, stopping pagination");
        return Ok(None);
    };

    if values.is_empty() {
        return Ok(None);
    }

    let items = values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(|e| FetchError::malformed(response.url(), e)))
        .collect::<Result<Vec<T>, _>>()?;

    Ok(Some((items, LinkHeader::from_headers(response.headers()))))
}
