// src/media_refs.rs
// Media references inside label events: URL extraction from structured
// imeta tags and free-text content, and resolution of platform URLs to
// asset ids.

use crate::labels::LabelEvent;
use crate::rules::strip_extension;

/// Candidate media URLs in a label event: structured `imeta` attachments
/// first, then bare URLs scanned out of the free-text body. Duplicates are
/// kept; resolution de-duplicates downstream.
pub fn extract_media_urls(event: &LabelEvent) -> Vec<String> {
    let mut urls = Vec::new();
    for tag in &event.tags {
        if tag.first().map(String::as_str) != Some("imeta") {
            continue;
        }
        for part in &tag[1..] {
            if let Some(url) = part.strip_prefix("url ") {
                urls.push(url.to_string());
            }
        }
    }
    urls.extend(find_urls(&event.content));
    urls
}

/// Scans free text for `http://` / `https://` runs of at least one
/// character, stopping at whitespace or any of `< > " { } | \ ^ ` [ ]`.
fn find_urls(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut start = 0;
    while let Some(found) = text[start..].find("http") {
        let begin = start + found;
        let rest = &text[begin..];
        let scheme_len = if rest.starts_with("https://") {
            8
        } else if rest.starts_with("http://") {
            7
        } else {
            start = begin + 4;
            continue;
        };
        let tail = &rest[scheme_len..];
        let end = tail.find(is_url_stop).unwrap_or(tail.len());
        if end > 0 {
            urls.push(rest[..scheme_len + end].to_string());
        }
        start = begin + scheme_len + end;
    }
    urls
}

fn is_url_stop(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`' | '[' | ']'
        )
}

/// Resolves a platform media URL to its asset id. `None` whenever the URL
/// is not http(s) on the media host (or one of its subdomains), or the
/// path is not a single-segment `/v/` or `/t/` reference. Extension
/// stripping matches the path resolver. With no media host configured
/// nothing resolves.
pub fn resolve_asset_url(url: &str, media_host: &str) -> Option<String> {
    if media_host.is_empty() {
        return None;
    }
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    // Host is what remains after userinfo (up to the last @) and port.
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host).to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let media_host = media_host.to_ascii_lowercase();
    if host != media_host && !host.ends_with(&format!(".{}", media_host)) {
        return None;
    }

    let path = tail.strip_prefix('/')?;
    let path = path.split('#').next().unwrap_or(path);
    let path = path.split('?').next().unwrap_or(path);

    let mut segments = path.splitn(3, '/');
    let bucket = segments.next()?;
    if bucket != "v" && bucket != "t" {
        return None;
    }
    let id_segment = segments.next()?;
    if id_segment.is_empty() {
        return None;
    }
    let id = strip_extension(id_segment);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Resolved asset ids for an event, first occurrence first, de-duplicated.
pub fn resolve_assets(event: &LabelEvent, media_host: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for url in extract_media_urls(event) {
        if let Some(id) = resolve_asset_url(&url, media_host) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDIA_HOST: &str = "divine.video";

    fn event(tags: &[&[&str]], content: &str) -> LabelEvent {
        LabelEvent {
            tags: tags
                .iter()
                .map(|tag| tag.iter().map(|s| s.to_string()).collect())
                .collect(),
            content: content.to_string(),
        }
    }

    #[test]
    fn imeta_urls_come_before_content_urls() {
        let e = event(
            &[&["imeta", "url https://divine.video/v/first", "m video/mp4"]],
            "see https://divine.video/v/second",
        );
        assert_eq!(
            extract_media_urls(&e),
            vec![
                "https://divine.video/v/first".to_string(),
                "https://divine.video/v/second".to_string(),
            ]
        );
    }

    #[test]
    fn imeta_parts_without_a_url_prefix_are_skipped() {
        let e = event(
            &[&["imeta", "m video/mp4", "dim 1920x1080", "url https://divine.video/v/a"]],
            "",
        );
        assert_eq!(extract_media_urls(&e), vec!["https://divine.video/v/a"]);
    }

    #[test]
    fn content_scan_stops_at_whitespace_and_delimiters() {
        let found = find_urls("before https://divine.video/v/a?x=1 after <https://divine.video/t/b> tail");
        assert_eq!(
            found,
            vec![
                "https://divine.video/v/a?x=1".to_string(),
                "https://divine.video/t/b".to_string(),
            ]
        );
    }

    #[test]
    fn bare_scheme_with_no_body_is_not_a_url() {
        assert!(find_urls("https:// and nothing").is_empty());
        assert!(find_urls("http is not enough").is_empty());
    }

    #[test]
    fn plain_http_urls_are_found_too() {
        assert_eq!(find_urls("http://divine.video/v/x"), vec!["http://divine.video/v/x"]);
    }

    #[test]
    fn resolves_host_and_subdomains_case_insensitively() {
        assert_eq!(
            resolve_asset_url("https://divine.video/v/abc", MEDIA_HOST).as_deref(),
            Some("abc")
        );
        assert_eq!(
            resolve_asset_url("https://CDN.Divine.Video/t/xyz.jpg", MEDIA_HOST).as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn rejects_foreign_and_lookalike_hosts() {
        assert_eq!(resolve_asset_url("https://example.com/v/abc", MEDIA_HOST), None);
        assert_eq!(
            resolve_asset_url("https://evil-divine.video/v/abc", MEDIA_HOST),
            None
        );
        assert_eq!(
            resolve_asset_url("https://divine.video.example.com/v/abc", MEDIA_HOST),
            None
        );
    }

    #[test]
    fn ignores_port_and_userinfo() {
        assert_eq!(
            resolve_asset_url("https://divine.video:8443/v/abc", MEDIA_HOST).as_deref(),
            Some("abc")
        );
        assert_eq!(
            resolve_asset_url("https://user:pw@divine.video/v/abc", MEDIA_HOST).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn takes_a_single_path_segment_only() {
        assert_eq!(
            resolve_asset_url("https://divine.video/v/abc/extra", MEDIA_HOST).as_deref(),
            Some("abc")
        );
        assert_eq!(resolve_asset_url("https://divine.video/v//abc", MEDIA_HOST), None);
        assert_eq!(resolve_asset_url("https://divine.video/x/abc", MEDIA_HOST), None);
        assert_eq!(resolve_asset_url("https://divine.video/", MEDIA_HOST), None);
        assert_eq!(resolve_asset_url("https://divine.video", MEDIA_HOST), None);
    }

    #[test]
    fn strips_extension_query_and_fragment() {
        assert_eq!(
            resolve_asset_url("https://divine.video/t/xyz789.jpg?w=300#frag", MEDIA_HOST).as_deref(),
            Some("xyz789")
        );
        assert_eq!(
            resolve_asset_url("https://divine.video/v/abc?quality=hd", MEDIA_HOST).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn extension_only_names_do_not_resolve() {
        assert_eq!(resolve_asset_url("https://divine.video/t/.jpg", MEDIA_HOST), None);
    }

    #[test]
    fn non_http_schemes_do_not_resolve() {
        assert_eq!(resolve_asset_url("ftp://divine.video/v/abc", MEDIA_HOST), None);
        assert_eq!(resolve_asset_url("divine.video/v/abc", MEDIA_HOST), None);
    }

    #[test]
    fn nothing_resolves_without_a_configured_media_host() {
        assert_eq!(resolve_asset_url("https://divine.video/v/abc", ""), None);
    }

    #[test]
    fn resolve_assets_deduplicates_in_first_seen_order() {
        let e = event(
            &[&["imeta", "url https://divine.video/v/a"]],
            "https://divine.video/t/b.jpg then https://divine.video/v/a again \
             and https://elsewhere.example/v/c",
        );
        assert_eq!(
            resolve_assets(&e, MEDIA_HOST),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn video_and_thumbnail_ids_collapse_to_the_same_asset() {
        let e = event(
            &[],
            "https://divine.video/v/clip123 https://divine.video/t/clip123.jpg",
        );
        assert_eq!(resolve_assets(&e, MEDIA_HOST), vec!["clip123".to_string()]);
    }
}
