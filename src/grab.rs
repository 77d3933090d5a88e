use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use url::Url;

use crate::cli::GrabArgs;
use crate::download::DownloadOptions;
use crate::error::GrabError;
use crate::fetch::{FetchOptions, HttpFetcher, ImageFetcher};
use crate::formats::ChapterManifest;
use crate::handoff::HandoffConfig;
use crate::identity::ChapterIdentity;
use crate::normalize::ChapterSource;

pub const DEFAULT_OUT_DIR: &str = "samples_in";
pub const DEFAULT_META_ROOT: &str = "aggregated";

#[derive(Debug, Clone)]
pub struct GrabOptions {
    pub url: String,
    pub out: PathBuf,
    pub meta_root: PathBuf,
    pub download: DownloadOptions,
}

#[derive(Debug)]
pub struct GrabReport {
    pub source: ChapterSource,
    pub identity: ChapterIdentity,
    pub dest_dir: PathBuf,
    pub meta_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: ChapterManifest,
}

pub fn run(args: GrabArgs) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(FetchOptions {
        timeout: Duration::from_secs(args.timeout_secs),
        max_attempts: args.attempts,
        ..FetchOptions::default()
    })?;
    let options = GrabOptions {
        url: args.url.clone(),
        out: PathBuf::from(&args.out),
        meta_root: PathBuf::from(&args.meta_root),
        download: DownloadOptions {
            overwrite: args.overwrite,
            polite_delay: Duration::from_millis(args.delay_ms),
        },
    };

    let report = grab(&fetcher, &options)?;
    println!(
        "Done. Saved {} images to {}/",
        report.manifest.count,
        report.dest_dir.display()
    );

    let handoff = HandoffConfig::from_env();
    if !args.no_hint {
        for line in crate::handoff::hint_lines(&report.identity.label, &report.dest_dir, &handoff) {
            println!("{line}");
        }
    }
    if let Some(mode) = args.handoff {
        crate::handoff::run(mode, &report.identity.label, &report.dest_dir, &handoff)
            .context("handoff")?;
    }

    Ok(())
}

/// Fetches one chapter page, downloads its page images and writes the manifest.
pub fn grab(fetcher: &dyn ImageFetcher, options: &GrabOptions) -> anyhow::Result<GrabReport> {
    let source = ChapterSource::new(options.url.trim());
    if source.was_rewritten {
        tracing::info!(url = %source.normalized_url, "rewriting to mobile page for better image access");
    }
    let page_url = source.normalized_url.as_str();
    let parsed = Url::parse(page_url).context("parse --url")?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("--url must be http/https: {parsed}");
    }

    tracing::info!(url = page_url, "grab: fetch chapter page");
    let page = fetcher
        .fetch(page_url, Some(page_url))
        .context("fetch chapter page")?;
    let html = String::from_utf8_lossy(&page.bytes);

    let identity = crate::identity::resolve(page_url, Some(&*html));
    let dest_dir = destination_dir(&options.out, &identity.label);
    let meta_dir = options.meta_root.join(&identity.label);

    tracing::info!("grab: parse image urls");
    let urls = crate::extract::extract_image_urls(&html, page_url);
    tracing::info!(found = urls.len(), label = %identity.label, "candidate images");
    if urls.is_empty() {
        return Err(GrabError::NoImagesFound {
            url: page_url.to_owned(),
        }
        .into());
    }

    tracing::info!(dest = %dest_dir.display(), "grab: download");
    let outcome = crate::download::download_all(
        fetcher,
        &urls,
        &dest_dir,
        &meta_dir,
        page_url,
        &options.download,
    )
    .context("download images")?;

    let manifest = crate::manifest::build(&identity, page_url, outcome.images);
    let manifest_path = crate::manifest::write(&meta_dir, &manifest).context("write manifest")?;

    Ok(GrabReport {
        source,
        identity,
        dest_dir,
        meta_dir,
        manifest_path,
        manifest,
    })
}

/// A `samples_in` root gets one subfolder per chapter; any other folder is used as is.
pub fn destination_dir(out: &Path, label: &str) -> PathBuf {
    if out.file_name().and_then(|n| n.to_str()) == Some(DEFAULT_OUT_DIR) {
        out.join(label)
    } else {
        out.to_path_buf()
    }
}
