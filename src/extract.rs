use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Lazy-load attributes come first; `src` is often a placeholder when they are present.
const IMAGE_ATTRIBUTES: [&str; 4] = ["data-src", "data-original", "data-image", "src"];

const TRUSTED_IMAGE_HOSTS: [&str; 3] = ["pstatic.net", "comic.naver.net", "naver.net"];

/// Sort key for URLs with no recognizable page number.
pub const UNNUMBERED_SORT_KEY: u64 = 1_000_000;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector"));

static CONTENT_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/webtoon/|/episode/|/content/|/image/").expect("path regex"));

static BARE_IMAGE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^'"\s>]+\.(?:jpg|jpeg|png|webp)(?:\?[^'"\s>]*)?"#)
        .expect("bare image url regex")
});

static PAGE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d{2,})/|_p(\d+)|page=(\d+)").expect("page number regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub sort_key: u64,
    pub original_index: usize,
}

/// Ordered, de-duplicated page image URLs found in a chapter page.
pub fn extract_image_urls(html: &str, base_url: &str) -> Vec<String> {
    extract_candidates(html, base_url)
        .into_iter()
        .map(|c| c.url)
        .collect()
}

pub fn extract_candidates(html: &str, base_url: &str) -> Vec<ImageCandidate> {
    let base = Url::parse(base_url).ok();

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut push = |url: String| {
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    };

    let document = Html::parse_document(html);
    for img in document.select(&IMG_SELECTOR) {
        let element = img.value();
        let Some(raw) = IMAGE_ATTRIBUTES
            .iter()
            .filter_map(|name| element.attr(name))
            .map(str::trim)
            .find(|value| !value.is_empty() && !is_data_uri(value))
        else {
            continue;
        };

        let resolved = match &base {
            Some(base) => base.join(raw),
            None => Url::parse(raw),
        };
        let Ok(resolved) = resolved else {
            continue;
        };
        let Some(host) = resolved.host_str() else {
            continue;
        };
        if !is_trusted_host(host) && !CONTENT_PATH_RE.is_match(resolved.path()) {
            continue;
        }

        push(resolved.to_string());
    }

    for found in BARE_IMAGE_URL_RE.find_iter(html) {
        // Raw markup still carries entity-encoded query separators.
        let raw = found.as_str().replace("&amp;", "&").replace("&#38;", "&");
        let Ok(parsed) = Url::parse(&raw) else {
            continue;
        };
        if parsed.host_str().is_some_and(is_trusted_host) {
            push(parsed.to_string());
        }
    }

    let mut candidates = urls
        .into_iter()
        .enumerate()
        .map(|(original_index, url)| ImageCandidate {
            sort_key: page_sort_key(&url),
            url,
            original_index,
        })
        .collect::<Vec<_>>();
    candidates.sort_by_key(|c| (c.sort_key, c.original_index));
    candidates
}

fn is_data_uri(value: &str) -> bool {
    value.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:"))
}

pub fn is_trusted_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    TRUSTED_IMAGE_HOSTS
        .iter()
        .any(|trusted| host == *trusted || host.ends_with(&format!(".{trusted}")))
}

/// Page number embedded in the URL: a `/NN/` path segment, a `_pN` suffix, or a
/// `page=N` parameter, whichever matches first.
pub fn page_sort_key(url: &str) -> u64 {
    PAGE_NUMBER_RE
        .captures(url)
        .and_then(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .find_map(|m| m.as_str().parse::<u64>().ok())
        })
        .unwrap_or(UNNUMBERED_SORT_KEY)
}
