use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::formats::{ChapterManifest, ImageRecord};
use crate::identity::ChapterIdentity;

pub const MANIFEST_FILE: &str = ".chapter.json";
pub const LISTING_FILE: &str = "images.txt";

pub fn build(identity: &ChapterIdentity, url: &str, images: Vec<ImageRecord>) -> ChapterManifest {
    ChapterManifest {
        label: identity.label.clone(),
        site: identity.site.clone(),
        title_id: identity.title_id.clone(),
        no: identity.no.clone(),
        episode_title: identity.episode_title.clone(),
        episode_title_main: identity.episode_title_main.clone(),
        episode_subtitle: identity.episode_subtitle.clone(),
        episode_no_extracted: identity.episode_no_extracted.clone(),
        url: url.to_owned(),
        count: images.len(),
        images,
    }
}

/// Writes `.chapter.json` and `images.txt` into `meta_dir`, replacing any earlier run's.
pub fn write(meta_dir: &Path, manifest: &ChapterManifest) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(meta_dir)
        .with_context(|| format!("create metadata dir: {}", meta_dir.display()))?;

    let manifest_path = meta_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest).context("serialize chapter manifest")?;
    std::fs::write(&manifest_path, json)
        .with_context(|| format!("write chapter manifest: {}", manifest_path.display()))?;

    let listing_path = meta_dir.join(LISTING_FILE);
    let file = File::create(&listing_path)
        .with_context(|| format!("create image listing: {}", listing_path.display()))?;
    let mut listing = BufWriter::new(file);
    for image in &manifest.images {
        writeln!(
            listing,
            "{}\t{}\t{}\t{}",
            image.index, image.filename, image.url, image.size
        )
        .context("write image listing line")?;
    }
    listing.flush().context("flush image listing")?;

    Ok(manifest_path)
}

pub fn read(meta_dir: &Path) -> anyhow::Result<ChapterManifest> {
    let path = meta_dir.join(MANIFEST_FILE);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read chapter manifest: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse chapter manifest: {}", path.display()))
}
