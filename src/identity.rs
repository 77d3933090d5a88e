use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub const SITE: &str = "naver";
const FALLBACK_LABEL: &str = "episode";
const MAX_SLUG_LEN: usize = 80;

static MAIN_TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#titleName_toolbar").expect("main title selector"));
static SUBTITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#subTitle_toolbar").expect("subtitle selector"));
static OG_TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector"));

static CHAPTER_NO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,5})").expect("chapter number regex"));
static TRAILING_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d+$").expect("trailing number regex"));

/// Everything known about which chapter a page belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterIdentity {
    pub site: String,
    pub title_id: Option<String>,
    /// `no` query parameter of the chapter URL.
    pub no: Option<String>,
    /// Chapter number as displayed in the page's subtitle.
    pub episode_no_extracted: Option<String>,
    pub slug: Option<String>,
    pub label: String,
    pub episode_title: Option<String>,
    pub episode_title_main: Option<String>,
    pub episode_subtitle: Option<String>,
}

impl ChapterIdentity {
    /// Chapter number from the page itself, else from the URL.
    pub fn chapter_no(&self) -> Option<&str> {
        self.episode_no_extracted.as_deref().or(self.no.as_deref())
    }
}

#[derive(Debug, Default)]
struct PageTitles {
    main: Option<String>,
    subtitle: Option<String>,
    title: Option<String>,
}

pub fn resolve(url: &str, html: Option<&str>) -> ChapterIdentity {
    let (title_id, no) = query_ids(url);
    let titles = html.map(page_titles).unwrap_or_default();

    let episode_no_extracted = titles
        .subtitle
        .as_deref()
        .and_then(|s| CHAPTER_NO_RE.captures(s))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned());

    let slug = titles
        .main
        .as_deref()
        .or(titles.title.as_deref())
        .map(slugify)
        .map(|s| TRAILING_NUMBER_RE.replace(&s, "").into_owned())
        .filter(|s| !s.is_empty());

    let mut identity = ChapterIdentity {
        site: SITE.to_owned(),
        title_id,
        no,
        episode_no_extracted,
        slug,
        label: String::new(),
        episode_title: titles.title,
        episode_title_main: titles.main,
        episode_subtitle: titles.subtitle,
    };
    identity.label = compose_label(&identity);
    identity
}

fn compose_label(identity: &ChapterIdentity) -> String {
    let title_id = identity.title_id.as_deref().unwrap_or_default();
    let chapter_no = identity.chapter_no().unwrap_or_default();

    let mut label = if !title_id.is_empty() || !chapter_no.is_empty() {
        format!("{}_{title_id}_{chapter_no}", identity.site)
    } else {
        identity
            .slug
            .clone()
            .unwrap_or_else(|| FALLBACK_LABEL.to_owned())
    };
    if let Some(slug) = identity.slug.as_deref() {
        label.push('_');
        label.push_str(slug);
    }
    label
}

fn query_ids(url: &str) -> (Option<String>, Option<String>) {
    let Ok(parsed) = Url::parse(url) else {
        return (None, None);
    };
    let first = |name: &str| {
        parsed
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| path_safe(&v))
            .filter(|v| !v.is_empty())
    };
    (first("titleId"), first("no"))
}

/// Query values end up in directory names; keep only ASCII alphanumerics and `-`.
fn path_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect()
}

fn page_titles(html: &str) -> PageTitles {
    let document = Html::parse_document(html);

    let og_title = document
        .select(&OG_TITLE_SELECTOR)
        .find_map(|meta| meta.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty());
    let title = og_title.or_else(|| {
        document
            .select(&TITLE_SELECTOR)
            .next()
            .map(element_text)
            .filter(|s| !s.is_empty())
    });

    PageTitles {
        main: first_text(&document, &MAIN_TITLE_SELECTOR),
        subtitle: first_text(&document, &SUBTITLE_SELECTOR),
        title,
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ASCII-only, lowercase, hyphen-separated; non-Latin titles come out empty.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_hyphen = false;
    for ch in s.trim().chars() {
        if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_hyphen = true;
        } else if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://m.comic.naver.com/webtoon/detail?titleId=765804&no=127";

    fn toolbar_page(main: &str, subtitle: &str) -> String {
        format!(
            r#"<html><head><title>Naver Webtoon</title></head><body>
<div class="toolbar"><span id="titleName_toolbar">{main}</span>
<span id="subTitle_toolbar"><em>{subtitle}</em></span></div></body></html>"#
        )
    }

    #[test]
    fn label_uses_query_ids_and_latin_slug() {
        let html = toolbar_page("News Table", "127화 AI");
        let identity = resolve(URL, Some(html.as_str()));

        assert_eq!(identity.title_id.as_deref(), Some("765804"));
        assert_eq!(identity.no.as_deref(), Some("127"));
        assert_eq!(identity.episode_no_extracted.as_deref(), Some("127"));
        assert_eq!(identity.episode_title_main.as_deref(), Some("News Table"));
        assert_eq!(identity.episode_subtitle.as_deref(), Some("127화 AI"));
        assert_eq!(identity.label, "naver_765804_127_news-table");
    }

    #[test]
    fn non_latin_title_drops_slug_suffix() {
        let html = toolbar_page("뉴스테이블", "127화");
        let identity = resolve(URL, Some(html.as_str()));

        assert_eq!(identity.slug, None);
        assert_eq!(identity.label, "naver_765804_127");
    }

    #[test]
    fn subtitle_number_wins_over_query_parameter() {
        let html = toolbar_page("Hero", "Episode 128 - The Return");
        let identity = resolve(URL, Some(html.as_str()));

        assert_eq!(identity.chapter_no(), Some("128"));
        assert_eq!(identity.no.as_deref(), Some("127"));
        assert_eq!(identity.label, "naver_765804_128_hero");
    }

    #[test]
    fn falls_back_to_og_title_then_title_tag() {
        let og = r#"<html><head><meta property="og:title" content="Tower  of God"><title>ignored</title></head></html>"#;
        let identity = resolve("https://example.com/read", Some(og));
        assert_eq!(identity.episode_title.as_deref(), Some("Tower of God"));
        assert_eq!(identity.label, "tower-of-god_tower-of-god");

        let plain = "<html><head><title>Lore Olympus</title></head></html>";
        let identity = resolve("https://example.com/read", Some(plain));
        assert_eq!(identity.episode_title.as_deref(), Some("Lore Olympus"));
        assert_eq!(identity.slug.as_deref(), Some("lore-olympus"));
    }

    #[test]
    fn missing_everything_degrades_to_generic_label() {
        assert_eq!(resolve("https://example.com/read", None).label, "episode");
        assert_eq!(resolve("::not a url::", Some("<html></html>")).label, "episode");
    }

    #[test]
    fn url_ids_without_html_still_label() {
        let identity = resolve(URL, None);
        assert_eq!(identity.label, "naver_765804_127");
        assert_eq!(identity.site, SITE);
    }

    #[test]
    fn only_chapter_number_keeps_empty_title_slot() {
        let identity = resolve("https://m.comic.naver.com/webtoon/detail?no=9", None);
        assert_eq!(identity.label, "naver__9");
    }

    #[test]
    fn query_ids_cannot_escape_the_output_root() {
        let identity = resolve(
            "https://m.comic.naver.com/webtoon/detail?titleId=..%2F..%2Fescape&no=1%5C2:3",
            None,
        );
        assert_eq!(identity.title_id.as_deref(), Some("escape"));
        assert_eq!(identity.no.as_deref(), Some("123"));
        assert_eq!(identity.label, "naver_escape_123");

        let joined = std::path::Path::new("aggregated").join(&identity.label);
        assert!(
            joined
                .components()
                .all(|c| matches!(c, std::path::Component::Normal(_)))
        );
        assert_eq!(joined.components().count(), 2);

        let dots = resolve("https://m.comic.naver.com/webtoon/detail?titleId=..&no=..", None);
        assert_eq!(dots.title_id, None);
        assert_eq!(dots.label, "episode");
    }

    #[test]
    fn resolution_is_stable_across_runs() {
        let html = toolbar_page("News Table", "127화");
        assert_eq!(resolve(URL, Some(html.as_str())), resolve(URL, Some(html.as_str())));
    }

    #[test]
    fn slugify_collapses_and_strips() {
        assert_eq!(slugify("  Hello,   World! "), "hello-world");
        assert_eq!(slugify("a__b--c"), "a-b-c");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify(&"x".repeat(120)).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn trailing_number_is_stripped_from_slug() {
        let html = toolbar_page("Season 2", "3화");
        let identity = resolve(URL, Some(html.as_str()));
        assert_eq!(identity.slug.as_deref(), Some("season"));
        assert_eq!(identity.label, "naver_765804_3_season");
    }
}
