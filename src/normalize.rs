use url::Url;

const DESKTOP_HOST_SUFFIX: &str = "comic.naver.com";
const MOBILE_HOST: &str = "m.comic.naver.com";
const DETAIL_PATH_MARKER: &str = "/webtoon/detail";

/// Chapter URL as given by the caller and as it will actually be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSource {
    pub original_url: String,
    pub normalized_url: String,
    pub was_rewritten: bool,
}

impl ChapterSource {
    pub fn new(url: &str) -> Self {
        let (normalized_url, was_rewritten) = normalize(url);
        Self {
            original_url: url.to_owned(),
            normalized_url,
            was_rewritten,
        }
    }
}

/// Rewrites a desktop chapter-detail URL to the mobile site, whose markup exposes
/// the page images directly. Anything else comes back untouched.
pub fn normalize(url: &str) -> (String, bool) {
    let Ok(mut parsed) = Url::parse(url) else {
        return (url.to_owned(), false);
    };
    let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) else {
        return (url.to_owned(), false);
    };

    if !host.ends_with(DESKTOP_HOST_SUFFIX) || host.starts_with("m.") {
        return (url.to_owned(), false);
    }
    if !parsed.path().contains(DETAIL_PATH_MARKER) {
        return (url.to_owned(), false);
    }
    if parsed.set_host(Some(MOBILE_HOST)).is_err() {
        return (url.to_owned(), false);
    }

    (parsed.to_string(), true)
}
