use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::aggregate::{RAW_RECORDS_FILE, UNIQUE_LINES_FILE, normalize_text};
use crate::cli::MapTranslationsArgs;
use crate::formats::OcrRecord;

const TRANSLATED_LINES_FILE: &str = "unique_lines_EN.txt";
const OUTPUT_SUBDIR: &str = "llm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPaths {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub records: PathBuf,
    pub out_dir: PathBuf,
}

impl MappingPaths {
    pub fn from_args(args: &MapTranslationsArgs) -> anyhow::Result<Self> {
        if let Some(chapter) = args.chapter.as_deref() {
            let base = Path::new(&args.root).join(chapter);
            let pick = |explicit: &Option<String>, default: PathBuf| {
                explicit.as_ref().map(PathBuf::from).unwrap_or(default)
            };
            return Ok(Self {
                src: pick(&args.src, base.join(UNIQUE_LINES_FILE)),
                dst: pick(&args.dst, base.join(TRANSLATED_LINES_FILE)),
                records: pick(&args.records, base.join(RAW_RECORDS_FILE)),
                out_dir: pick(&args.out_dir, base.join(OUTPUT_SUBDIR)),
            });
        }

        match (&args.src, &args.dst, &args.records, &args.out_dir) {
            (Some(src), Some(dst), Some(records), Some(out_dir)) => Ok(Self {
                src: src.into(),
                dst: dst.into(),
                records: records.into(),
                out_dir: out_dir.into(),
            }),
            _ => anyhow::bail!(
                "either --chapter or all of --src, --dst, --records, --out-dir must be provided"
            ),
        }
    }
}

pub fn run(args: MapTranslationsArgs) -> anyhow::Result<()> {
    let paths = MappingPaths::from_args(&args)?;

    let mapping = load_unique_pairs(&paths.src, &paths.dst).context("load translation pairs")?;
    let per_image = build_per_image(&paths.records, &mapping).context("build per-image lists")?;
    write_outputs(&per_image, &paths.out_dir).context("write per-image translations")?;

    tracing::info!(out = %paths.out_dir.display(), images = per_image.len(), "wrote per-image translations");
    Ok(())
}

/// Pairs each source line (`freq\ttext` or bare text) with the translation on the same line.
pub fn load_unique_pairs(src: &Path, dst: &Path) -> anyhow::Result<HashMap<String, String>> {
    let src_raw =
        std::fs::read_to_string(src).with_context(|| format!("read {}", src.display()))?;
    let dst_raw =
        std::fs::read_to_string(dst).with_context(|| format!("read {}", dst.display()))?;

    let src_lines = src_raw
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_once('\t')
                .map_or(line, |(_, text)| text)
                .trim()
                .to_owned()
        })
        .collect::<Vec<_>>();
    let mut dst_lines = dst_raw.lines().map(str::to_owned).collect::<Vec<_>>();

    if src_lines.len() != dst_lines.len() {
        tracing::warn!(
            src = %src.display(),
            src_lines = src_lines.len(),
            dst = %dst.display(),
            dst_lines = dst_lines.len(),
            "line count mismatch; aligning translations to source"
        );
        dst_lines.resize(src_lines.len(), String::new());
    }

    Ok(src_lines.into_iter().zip(dst_lines).collect())
}

/// Translation list per image basename, one entry per OCR item in item order.
pub fn build_per_image(
    records_path: &Path,
    mapping: &HashMap<String, String>,
) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
    let raw = std::fs::read_to_string(records_path)
        .with_context(|| format!("read {}", records_path.display()))?;
    let records: Vec<OcrRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parse {}", records_path.display()))?;

    let mut per_image = BTreeMap::new();
    for record in &records {
        let base = Path::new(record.image_key())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let translations = record
            .items
            .iter()
            .map(|item| {
                let source = normalize_text(item.text.as_deref().unwrap_or_default());
                if source.is_empty() {
                    return String::new();
                }
                mapping.get(&source).cloned().unwrap_or_default()
            })
            .collect::<Vec<_>>();
        per_image.insert(base, translations);
    }
    Ok(per_image)
}

pub fn write_outputs(per_image: &BTreeMap<String, Vec<String>>, out_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;
    for (base, translations) in per_image {
        let stem = Path::new(base)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let path = out_dir.join(format!("{stem}_translations.json"));
        let json = serde_json::to_string_pretty(translations).context("serialize translations")?;
        std::fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(chapter: Option<&str>) -> MapTranslationsArgs {
        MapTranslationsArgs {
            chapter: chapter.map(str::to_owned),
            root: "aggregated".to_owned(),
            src: None,
            dst: None,
            records: None,
            out_dir: None,
        }
    }

    #[test]
    fn chapter_resolves_default_paths() -> anyhow::Result<()> {
        let paths = MappingPaths::from_args(&args(Some("naver_1_2")))?;
        let base = Path::new("aggregated").join("naver_1_2");
        assert_eq!(paths.src, base.join("unique_lines.txt"));
        assert_eq!(paths.dst, base.join("unique_lines_EN.txt"));
        assert_eq!(paths.records, base.join("raw_records.json"));
        assert_eq!(paths.out_dir, base.join("llm"));
        Ok(())
    }

    #[test]
    fn explicit_paths_are_all_required_without_chapter() {
        let mut partial = args(None);
        partial.src = Some("a".to_owned());
        assert!(MappingPaths::from_args(&partial).is_err());
    }

    #[test]
    fn short_translation_file_is_padded() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let src = temp.path().join("src.txt");
        let dst = temp.path().join("dst.txt");
        std::fs::write(&src, "3\t안녕\n\n1\t뉴스테이블 입니다\nbare\n")?;
        std::fs::write(&dst, "Hello\nThis is News Table\n")?;

        let mapping = load_unique_pairs(&src, &dst)?;
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping["안녕"], "Hello");
        assert_eq!(mapping["뉴스테이블 입니다"], "This is News Table");
        assert_eq!(mapping["bare"], "");
        Ok(())
    }

    #[test]
    fn per_image_lists_follow_item_order() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let records = temp.path().join("raw_records.json");
        std::fs::write(
            &records,
            r#"[
  {"image_path": "samples_in/x/001.jpg", "items": [
    {"text": "안녕"}, {"color": "red"}, {"text": " 뉴스테이블   입니다 "}, {"text": "unknown"}
  ]},
  {"image": "002.png", "items": []}
]"#,
        )?;
        let mapping = HashMap::from([
            ("안녕".to_owned(), "Hello".to_owned()),
            ("뉴스테이블 입니다".to_owned(), "This is News Table".to_owned()),
        ]);

        let per_image = build_per_image(&records, &mapping)?;
        assert_eq!(
            per_image["001.jpg"],
            vec!["Hello", "", "This is News Table", ""]
        );
        assert!(per_image["002.png"].is_empty());

        let out_dir = temp.path().join("llm");
        write_outputs(&per_image, &out_dir)?;
        let written: Vec<String> = serde_json::from_str(&std::fs::read_to_string(
            out_dir.join("001_translations.json"),
        )?)?;
        assert_eq!(written, per_image["001.jpg"]);
        assert!(out_dir.join("002_translations.json").exists());
        Ok(())
    }
}
