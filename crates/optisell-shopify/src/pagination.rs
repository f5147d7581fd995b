//! Cursor pagination through the Admin API `Link` response header.
//!
//! Each response lists adjacent pages as URLs carrying a `page_info` cursor:
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2024-10/products.json?limit=50&page_info=PREV>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2024-10/products.json?limit=50&page_info=NEXT>; rel="next"
//! ```

/// `page_info` cursor of the `rel="next"` link, if any.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    extract_cursor(link_header, "next")
}

/// `page_info` cursor of the `rel="previous"` link, if any.
#[must_use]
pub fn extract_previous_cursor(link_header: Option<&str>) -> Option<String> {
    extract_cursor(link_header, "previous")
}

fn extract_cursor(link_header: Option<&str>, rel: &str) -> Option<String> {
    let header = link_header?;
    let marker = format!("rel=\"{rel}\"");

    header
        .split(',')
        .map(str::trim)
        .find(|segment| segment.contains(&marker))
        .and_then(extract_angle_bracket_url)
        .and_then(|url| extract_query_param(url, "page_info"))
}

fn extract_angle_bracket_url(segment: &str) -> Option<&str> {
    let start = segment.find('<')? + 1;
    let end = segment.find('>')?;
    if start >= end {
        return None;
    }
    Some(&segment[start..end])
}

// Cursors are base64url, so no percent-decoding is needed.
fn extract_query_param(url: &str, param: &str) -> Option<String> {
    let query_start = url.find('?')? + 1;
    let query = &url[query_start..];

    let needle = format!("{param}=");
    query
        .split('&')
        .filter_map(|pair| pair.strip_prefix(needle.as_str()))
        .map(|value| value.split('#').next().unwrap_or(value))
        .find(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}
