use clap::{Args, Parser, Subcommand};

use crate::handoff::HandoffMode;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Grab(GrabArgs),
    Aggregate(AggregateArgs),
    MapTranslations(MapTranslationsArgs),
}

#[derive(Debug, Args)]
pub struct GrabArgs {
    /// Chapter page URL (desktop detail URLs are rewritten to the mobile site).
    #[arg(long)]
    pub url: String,

    /// Image output folder. When it is named `samples_in`, a per-chapter subfolder is created.
    #[arg(long, default_value = crate::grab::DEFAULT_OUT_DIR)]
    pub out: String,

    /// Root for per-chapter metadata (`<meta-root>/<label>/`).
    #[arg(long, default_value = crate::grab::DEFAULT_META_ROOT)]
    pub meta_root: String,

    /// Re-download pages that already exist on disk.
    #[arg(
        long,
        env = "GRAB_OVERWRITE",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub overwrite: bool,

    /// Per-attempt HTTP timeout.
    #[arg(long, default_value_t = crate::fetch::DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Attempts per request before giving up.
    #[arg(long, default_value_t = crate::fetch::DEFAULT_MAX_ATTEMPTS)]
    pub attempts: usize,

    /// Delay after each saved image (politeness).
    #[arg(long, default_value_t = crate::download::DEFAULT_POLITE_DELAY_MS)]
    pub delay_ms: u64,

    /// Run a downstream processing script on the chapter once downloading finishes.
    #[arg(long, value_enum)]
    pub handoff: Option<HandoffMode>,

    /// Do not print the next-step commands.
    #[arg(long)]
    pub no_hint: bool,
}

#[derive(Debug, Args)]
pub struct AggregateArgs {
    /// Text dumps (e.g. `chapter_128_text.txt` or `*_translations.txt`).
    #[arg(long = "in", required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// Output directory.
    #[arg(long, default_value = crate::grab::DEFAULT_META_ROOT)]
    pub out_dir: String,
}

#[derive(Debug, Args)]
pub struct MapTranslationsArgs {
    /// Chapter label under `--root`; fills in any path not given explicitly.
    #[arg(long)]
    pub chapter: Option<String>,

    #[arg(long, default_value = crate::grab::DEFAULT_META_ROOT)]
    pub root: String,

    /// Path to `unique_lines.txt`.
    #[arg(long)]
    pub src: Option<String>,

    /// Path to `unique_lines_EN.txt`.
    #[arg(long)]
    pub dst: Option<String>,

    /// Path to `raw_records.json`.
    #[arg(long)]
    pub records: Option<String>,

    /// Output dir for per-image JSON arrays.
    #[arg(long)]
    pub out_dir: Option<String>,
}
