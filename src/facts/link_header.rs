//! Parsing of the `Link` response header used for page-based pagination.
//!
//! ```text
//! <https://api.github.com/repositories/1/contributors?per_page=1&anon=true&page=2>; rel="next",
//! <https://api.github.com/repositories/1/contributors?per_page=1&anon=true&page=473>; rel="last"
//! ```

use std::sync::LazyLock;
use url::Url;

/// Pattern matching a single `<url>; rel="name"` entry
static LINK_ENTRY_REGEX: LazyLock<Option<regex::Regex>> =
    LazyLock::new(|| regex::Regex::new(r#"<([^>]*)>\s*;\s*rel\s*=\s*"?([A-Za-z]+)"?"#).ok());

/// A pagination relation and the page number it points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    First(u64),
    Prev(u64),
    Next(u64),
    Last(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkHeader {
    links: Vec<PageLink>,
}

impl LinkHeader {
    /// Parse a `Link` header value.
    ///
    /// Entries with unknown relations, unparsable URLs, or no `page` query parameter are skipped.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let Some(regex) = LINK_ENTRY_REGEX.as_ref() else {
            return Self::default();
        };

        let links = regex
            .captures_iter(value)
            .filter_map(|caps| {
                let page = page_number(caps.get(1)?.as_str())?;
                match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
                    "first" => Some(PageLink::First(page)),
                    "prev" => Some(PageLink::Prev(page)),
                    "next" => Some(PageLink::Next(page)),
                    "last" => Some(PageLink::Last(page)),
                    _ => None,
                }
            })
            .collect();

        Self { links }
    }

    /// Read and parse the `Link` header from a response, if present.
    #[must_use]
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Option<Self> {
        let value = headers.get(reqwest::header::LINK)?.to_str().ok()?;
        Some(Self::parse(value))
    }

    #[must_use]
    pub fn next(&self) -> Option<u64> {
        self.links.iter().find_map(|link| match link {
            PageLink::Next(page) => Some(*page),
            _ => None,
        })
    }

    #[must_use]
    pub fn last(&self) -> Option<u64> {
        self.links.iter().find_map(|link| match link {
            PageLink::Last(page) => Some(*page),
            _ => None,
        })
    }
}

fn page_number(target: &str) -> Option<u64> {
    let url = Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GITHUB_LINK: &str = r#"<https://api.github.com/repositories/1300192/contributors?per_page=1&anon=true&page=2>; rel="next", <https://api.github.com/repositories/1300192/contributors?per_page=1&anon=true&page=473>; rel="last""#;

    #[test]
    fn test_parse_next_and_last() {
        let header = LinkHeader::parse(GITHUB_LINK);
        assert_eq!(header.links, [PageLink::Next(2), PageLink::Last(473)]);
        assert_eq!(header.next(), Some(2));
        assert_eq!(header.last(), Some(473));
    }

    #[test]
    fn test_parse_middle_page() {
        let value = r#"<https://api.github.com/orgs/acme/repos?page=1>; rel="first", <https://api.github.com/orgs/acme/repos?page=2>; rel="prev", <https://api.github.com/orgs/acme/repos?page=4>; rel="next", <https://api.github.com/orgs/acme/repos?page=9>; rel="last""#;
        let header = LinkHeader::parse(value);
        assert_eq!(
            header.links,
            [PageLink::First(1), PageLink::Prev(2), PageLink::Next(4), PageLink::Last(9)]
        );
    }

    #[test]
    fn test_parse_last_page_has_no_next() {
        let value = r#"<https://api.github.com/x?page=1>; rel="first", <https://api.github.com/x?page=2>; rel="prev""#;
        let header = LinkHeader::parse(value);
        assert_eq!(header.next(), None);
        assert_eq!(header.last(), None);
    }

    #[test]
    fn test_parse_page_not_last_query_param() {
        let value = r#"<https://api.github.com/x?page=7&per_page=1>; rel="last""#;
        assert_eq!(LinkHeader::parse(value).last(), Some(7));
    }

    #[test]
    fn test_parse_ignores_unknown_relations_and_garbage() {
        assert!(LinkHeader::parse("").links.is_empty());
        assert!(LinkHeader::parse("garbage").links.is_empty());
        assert!(LinkHeader::parse(r#"<https://x.test/?page=3>; rel="alternate""#).links.is_empty());
        assert_eq!(LinkHeader::parse(r#"<https://x.test/?page=abc>; rel="last""#).last(), None);
        assert_eq!(LinkHeader::parse(r#"<not a url>; rel="last""#).last(), None);
    }

    #[test]
    fn test_from_headers() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert!(LinkHeader::from_headers(&headers).is_none());

        let _ = headers.insert(reqwest::header::LINK, reqwest::header::HeaderValue::from_static(GITHUB_LINK));
        assert_eq!(LinkHeader::from_headers(&headers).and_then(|h| h.last()), Some(473));
    }
}
