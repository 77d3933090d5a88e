use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::fetch::ImageFetcher;
use crate::formats::ImageRecord;

pub const URL_LIST_FILE: &str = ".urls.txt";
pub const DEFAULT_POLITE_DELAY_MS: u64 = 50;

const KNOWN_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const FALLBACK_EXTENSION: &str = "jpg";
const MIN_INDEX_WIDTH: usize = 3;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Re-download pages whose file already exists instead of keeping them.
    pub overwrite: bool,
    pub polite_delay: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            polite_delay: Duration::from_millis(DEFAULT_POLITE_DELAY_MS),
        }
    }
}

#[derive(Debug, Default)]
pub struct DownloadOutcome {
    pub saved: Vec<PathBuf>,
    pub images: Vec<ImageRecord>,
}

/// Downloads every candidate in order into `dest_dir`, named by its position in
/// `urls`. Per-image failures are logged and leave a gap in the numbering.
pub fn download_all(
    fetcher: &dyn ImageFetcher,
    urls: &[String],
    dest_dir: &Path,
    meta_dir: &Path,
    referer: &str,
    options: &DownloadOptions,
) -> anyhow::Result<DownloadOutcome> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("create image dir: {}", dest_dir.display()))?;
    std::fs::create_dir_all(meta_dir)
        .with_context(|| format!("create metadata dir: {}", meta_dir.display()))?;

    let url_list_path = meta_dir.join(URL_LIST_FILE);
    let mut url_list = urls.join("\n");
    url_list.push('\n');
    std::fs::write(&url_list_path, url_list)
        .with_context(|| format!("write url list: {}", url_list_path.display()))?;

    let total = urls.len();
    let width = index_width(total);
    let mut outcome = DownloadOutcome::default();

    for (index, url) in (1..).zip(urls) {
        let filename = image_filename(index, width, url);
        let path = dest_dir.join(&filename);

        if !options.overwrite && path.exists() {
            let size = std::fs::metadata(&path)
                .with_context(|| format!("stat existing image: {}", path.display()))?
                .len();
            tracing::info!(index, total, file = %filename, size, "image exists; skipping");
            outcome.push(path, index, filename, url, size);
            continue;
        }

        let fetched = match fetcher.fetch(url, Some(referer)) {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::warn!(index, total, url = %url, error = %format!("{err:#}"), "image fetch failed; skipping");
                continue;
            }
        };

        if !is_image_payload(&fetched.bytes, fetched.content_type.as_deref()) {
            tracing::warn!(
                index,
                total,
                url = %url,
                content_type = ?fetched.content_type,
                "payload is not an image; skipping"
            );
            continue;
        }

        std::fs::write(&path, &fetched.bytes)
            .with_context(|| format!("write image: {}", path.display()))?;
        let size = fetched.bytes.len() as u64;
        tracing::info!(index, total, file = %filename, size, "saved image");
        outcome.push(path, index, filename, url, size);

        if !options.polite_delay.is_zero() {
            sleep(options.polite_delay);
        }
    }

    Ok(outcome)
}

impl DownloadOutcome {
    fn push(&mut self, path: PathBuf, index: usize, filename: String, url: &str, size: u64) {
        self.saved.push(path);
        self.images.push(ImageRecord {
            index,
            filename,
            url: url.to_owned(),
            size,
        });
    }
}

pub fn index_width(total: usize) -> usize {
    total.to_string().len().max(MIN_INDEX_WIDTH)
}

pub fn image_filename(index: usize, width: usize, url: &str) -> String {
    format!("{index:0width$}.{}", infer_extension(url))
}

/// Extension taken from the URL path, or `jpg` when it is not a known image type.
pub fn infer_extension(url: &str) -> &'static str {
    let path = Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_default();
    KNOWN_EXTENSIONS
        .into_iter()
        .find(|ext| path.ends_with(&format!(".{ext}")))
        .unwrap_or(FALLBACK_EXTENSION)
}

/// Whether fetched bytes plausibly are page art rather than an error page.
pub fn is_image_payload(bytes: &[u8], content_type: Option<&str>) -> bool {
    if looks_like_text_document(bytes) {
        return false;
    }
    if content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/")) {
        return true;
    }
    has_image_signature(bytes)
}

fn looks_like_text_document(bytes: &[u8]) -> bool {
    let start = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = start.trim_ascii_start();
    start.starts_with(b"<") || start.starts_with(b"{") || start.starts_with(b"[")
}

fn has_image_signature(bytes: &[u8]) -> bool {
    if bytes.starts_with(b"\xFF\xD8\xFF") || bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return true;
    }
    bytes.starts_with(b"RIFF") && bytes.len() >= 12 && &bytes[8..12] == b"WEBP"
}
