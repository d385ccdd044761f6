//! Turning backend pages into typed [`PageResult`]s

use crate::backend::{WireLink, WirePage};
use crate::error::ApiResult;
use repodesk_core::{PageLink, PageResult};
use reqwest::Url;
use serde::de::DeserializeOwned;

/// Base used to resolve relative link URLs; only the query string matters
const LINK_BASE: &str = "http://localhost/";

/// Page number carried by a pagination URL, `None` if the link is not navigable
pub fn page_from_url(url: Option<&str>) -> Option<u32> {
    let raw = url?.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = Url::parse(raw)
        .or_else(|_| Url::parse(LINK_BASE).and_then(|base| base.join(raw)))
        .ok()?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
}

/// Decode the handful of HTML entities pagination labels use
pub fn decode_label(label: &str) -> String {
    label
        .replace("&laquo;", "«")
        .replace("&raquo;", "»")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

impl From<&WireLink> for PageLink {
    fn from(link: &WireLink) -> Self {
        Self {
            page: page_from_url(link.url.as_deref()),
            active: link.active,
            label: decode_label(&link.label),
        }
    }
}

/// Decode the items of a backend page and restore the page invariants
///
/// # Errors
///
/// Returns a decode error if any item does not match `T`.
pub fn page_from_wire<T: DeserializeOwned>(wire: WirePage) -> ApiResult<PageResult<T>> {
    let items = wire
        .data
        .unwrap_or_default()
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()?;

    let links = wire.links.iter().map(PageLink::from).collect();

    Ok(PageResult::new(
        items,
        wire.current_page.unwrap_or(1),
        wire.last_page.unwrap_or(1),
        links,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use pretty_assertions::assert_eq;
    use repodesk_core::OrganisationRepo;
    use rstest::rstest;

    #[rstest]
    #[case(Some("http://api.test/user/booking/fetch?page=2"), Some(2))]
    #[case(Some("/user/booking/fetch?filter=a&page=7"), Some(7))]
    #[case(Some("?page=3"), Some(3))]
    #[case(Some("http://api.test/user/booking/fetch"), None)]
    #[case(Some("http://api.test/user/booking/fetch?page=abc"), None)]
    #[case(Some("http://api.test/user/booking/fetch?page=0"), None)]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn test_page_from_url(#[case] url: Option<&str>, #[case] expected: Option<u32>) {
        assert_eq!(page_from_url(url), expected);
    }

    #[rstest]
    #[case("&laquo; Previous", "« Previous")]
    #[case("Next &raquo;", "Next »")]
    #[case("...", "...")]
    #[case("Tom &amp; Jerry", "Tom & Jerry")]
    fn test_decode_label(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(decode_label(raw), expected);
    }

    #[test]
    fn test_page_from_wire() {
        let wire: WirePage = serde_json::from_value(serde_json::json!({
            "data": [{"id": 1, "name": "alpha"}],
            "current_page": 1,
            "last_page": 3,
            "links": [
                {"url": null, "label": "&laquo; Previous", "active": false},
                {"url": "http://api.test/x?page=1", "label": "1", "active": true},
                {"url": "http://api.test/x?page=2", "label": "2", "active": false},
                {"url": "http://api.test/x?page=2", "label": "Next &raquo;", "active": false}
            ]
        }))
        .unwrap();

        let page: PageResult<OrganisationRepo> = page_from_wire(wire).unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "alpha");
        assert_eq!(page.last_page, 3);
        assert_eq!(page.links.len(), 4);
        assert!(!page.links[0].is_navigable());
        assert_eq!(page.links[0].label, "« Previous");
        assert_eq!(page.links[3].page, Some(2));
    }

    #[test]
    fn test_page_from_wire_without_links_synthesizes_current() {
        let wire = WirePage {
            data: None,
            current_page: Some(2),
            last_page: Some(2),
            links: vec![],
        };

        let page: PageResult<OrganisationRepo> = page_from_wire(wire).unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.links, vec![PageLink::for_page(2, true)]);
    }

    #[test]
    fn test_page_from_wire_rejects_bad_items() {
        let wire = WirePage {
            data: Some(vec![serde_json::json!({"name": "missing id"})]),
            ..WirePage::default()
        };

        let result: ApiResult<PageResult<OrganisationRepo>> = page_from_wire(wire);
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
