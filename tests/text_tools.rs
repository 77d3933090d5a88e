use std::fs;

use predicates::prelude::*;

const DUMP_001: &str = "[samples_in/naver_765804_127/001.jpg]
-- 1 --
color: fg(0,0,0)
text: 뉴스테이블   입니다
coords: [10, 20, 30, 40]
-- 2 --
text: 안녕
";

const DUMP_002: &str = "[samples_in/naver_765804_127/002.jpg]
-- 1 --
text: 안녕
";

#[test]
fn aggregate_then_map_translations_for_a_chapter() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    fs::write(temp.path().join("001_translations.txt"), DUMP_001)?;
    fs::write(temp.path().join("002_translations.txt"), DUMP_002)?;
    let chapter_dir = temp.path().join("aggregated").join("naver_765804_127");

    assert_cmd::cargo::cargo_bin_cmd!("toongrab")
        .current_dir(temp.path())
        .args([
            "aggregate",
            "--in",
            "001_translations.txt",
            "002_translations.txt",
            "--out-dir",
            "aggregated/naver_765804_127",
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(chapter_dir.join("unique_lines.txt"))?,
        "2\t안녕\n1\t뉴스테이블 입니다\n"
    );
    assert!(chapter_dir.join("raw_records.json").exists());
    assert!(chapter_dir.join("template_pre_dict.txt").exists());
    assert!(chapter_dir.join("template_post_dict.txt").exists());

    fs::write(
        chapter_dir.join("unique_lines_EN.txt"),
        "Hello\nThis is News Table\n",
    )?;

    assert_cmd::cargo::cargo_bin_cmd!("toongrab")
        .current_dir(temp.path())
        .args(["map-translations", "--chapter", "naver_765804_127"])
        .assert()
        .success();

    let first: Vec<String> = serde_json::from_str(&fs::read_to_string(
        chapter_dir.join("llm").join("001_translations.json"),
    )?)?;
    assert_eq!(first, vec!["This is News Table", "Hello"]);
    let second: Vec<String> = serde_json::from_str(&fs::read_to_string(
        chapter_dir.join("llm").join("002_translations.json"),
    )?)?;
    assert_eq!(second, vec!["Hello"]);

    Ok(())
}

#[test]
fn map_translations_requires_chapter_or_all_paths() {
    assert_cmd::cargo::cargo_bin_cmd!("toongrab")
        .args(["map-translations", "--src", "unique_lines.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("either --chapter or all of"));
}

#[test]
fn rust_log_debug_emits_parsed_cli_to_stderr() {
    assert_cmd::cargo::cargo_bin_cmd!("toongrab")
        .env("RUST_LOG", "debug")
        .args(["map-translations", "--src", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsed cli"));
}
