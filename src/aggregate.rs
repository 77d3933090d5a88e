use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::AggregateArgs;
use crate::formats::{OcrItem, OcrRecord};

pub const RAW_RECORDS_FILE: &str = "raw_records.json";
pub const UNIQUE_LINES_FILE: &str = "unique_lines.txt";
const PRE_DICT_FILE: &str = "template_pre_dict.txt";
const POST_DICT_FILE: &str = "template_post_dict.txt";

const PRE_DICT_TEMPLATE: &str = "# Pre-translation dictionary
# Format: <regex> <replacement>
# Applied BEFORE translation. Good for normalizing OCR quirks and names.
# Examples:
#   뉴스테이블\\s* News Table
#   A\\.I\\. AI
#   수혁이 Su-hyeok

";

const POST_DICT_TEMPLATE: &str = "# Post-translation dictionary
# Format: <regex> <replacement>
# Applied AFTER translation. Good for enforcing preferred English phrasing.
# Examples:
#   National broadcaster KBS
#   medical institution hospital

";

pub fn run(args: AggregateArgs) -> anyhow::Result<()> {
    let inputs = args.inputs.iter().map(PathBuf::from).collect::<Vec<_>>();
    let out_dir = PathBuf::from(&args.out_dir);

    let records = parse_records(&inputs);
    tracing::info!(records = records.len(), "parsed text dumps");
    write_outputs(&records, &out_dir).context("write aggregation outputs")?;

    for name in [RAW_RECORDS_FILE, UNIQUE_LINES_FILE, PRE_DICT_FILE, POST_DICT_FILE] {
        tracing::info!(path = %out_dir.join(name).display(), "wrote");
    }
    Ok(())
}

/// Parses `--save-text-file` style dumps. Files that cannot be read are skipped.
pub fn parse_records(paths: &[PathBuf]) -> Vec<OcrRecord> {
    let mut records = Vec::new();
    for path in paths {
        let text = match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to read text dump; skipping");
                continue;
            }
        };
        records.extend(parse_dump(&text));
    }
    records
}

fn parse_dump(text: &str) -> Vec<OcrRecord> {
    let mut records = Vec::new();
    let mut current: Option<OcrRecord> = None;

    for line in text.lines() {
        if line.is_empty() {
            continue;
        }
        if let Some(image_path) = header_path(line) {
            records.extend(current.take());
            current = Some(OcrRecord {
                image_path: Some(image_path.to_owned()),
                ..OcrRecord::default()
            });
            continue;
        }
        let Some(record) = current.as_mut() else {
            continue;
        };
        if line.starts_with("-- ") {
            record.items.push(OcrItem::default());
            continue;
        }
        if record.items.is_empty() {
            record.items.push(OcrItem::default());
        }
        let Some(item) = record.items.last_mut() else {
            continue;
        };

        let value = |prefix: &str| line.strip_prefix(prefix).map(|v| v.trim().to_owned());
        if let Some(v) = value("color: ") {
            item.color = Some(v);
        } else if let Some(v) = value("text: ") {
            item.text = Some(v);
        } else if let Some(v) = value("trans: ") {
            item.trans = Some(v);
        } else if let Some(v) = value("coords: ") {
            item.coords = Some(v);
        }
    }
    records.extend(current);
    records
}

fn header_path(line: &str) -> Option<&str> {
    line.trim_end()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
}

pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unique source lines with their frequency, most frequent first, ties by text.
pub fn unique_lines(records: &[OcrRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in records
        .iter()
        .flat_map(|r| &r.items)
        .filter_map(|item| item.text.as_deref())
        .map(normalize_text)
        .filter(|t| !t.is_empty())
    {
        *counts.entry(text).or_default() += 1;
    }

    let mut lines = counts.into_iter().collect::<Vec<_>>();
    lines.sort_by(|(a_text, a_count), (b_text, b_count)| {
        b_count.cmp(a_count).then_with(|| a_text.cmp(b_text))
    });
    lines
}

pub fn write_outputs(records: &[OcrRecord], out_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir: {}", out_dir.display()))?;

    let raw_path = out_dir.join(RAW_RECORDS_FILE);
    let json = serde_json::to_string_pretty(records).context("serialize raw records")?;
    std::fs::write(&raw_path, json).with_context(|| format!("write {}", raw_path.display()))?;

    let unique_path = out_dir.join(UNIQUE_LINES_FILE);
    let file = File::create(&unique_path)
        .with_context(|| format!("create {}", unique_path.display()))?;
    let mut out = BufWriter::new(file);
    for (text, count) in unique_lines(records) {
        writeln!(out, "{count}\t{text}").context("write unique line")?;
    }
    out.flush().context("flush unique lines")?;

    for (name, template) in [
        (PRE_DICT_FILE, PRE_DICT_TEMPLATE),
        (POST_DICT_FILE, POST_DICT_TEMPLATE),
    ] {
        let path = out_dir.join(name);
        std::fs::write(&path, template).with_context(|| format!("write {}", path.display()))?;
    }

    Ok(())
}
