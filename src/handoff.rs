use std::path::Path;
use std::process::Command;

use anyhow::Context as _;
use clap::ValueEnum;

/// Which downstream OCR/translation script to run on a finished chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HandoffMode {
    TwoPass,
    SinglePass,
}

#[derive(Debug, Clone)]
pub struct HandoffConfig {
    pub bin: String,
    pub two_pass_script: String,
    pub single_pass_script: String,
}

impl HandoffConfig {
    pub fn from_env() -> Self {
        let bin = std::env::var("TOONGRAB_HANDOFF_BIN").unwrap_or_else(|_| "bash".to_owned());
        let two_pass_script = std::env::var("TOONGRAB_TWO_PASS_SCRIPT")
            .unwrap_or_else(|_| "scripts/mit_two_pass.sh".to_owned());
        let single_pass_script = std::env::var("TOONGRAB_SINGLE_PASS_SCRIPT")
            .unwrap_or_else(|_| "scripts/mit_run.sh".to_owned());
        Self {
            bin,
            two_pass_script,
            single_pass_script,
        }
    }
}

pub fn hint_lines(label: &str, dest: &Path, config: &HandoffConfig) -> Vec<String> {
    vec![
        "Next options:".to_owned(),
        format!(
            "  [1] Two-pass:    {} {} --chapter {label} --input {}",
            config.bin,
            config.two_pass_script,
            dest.display()
        ),
        format!(
            "  [2] Single-pass: CLI_INPUT_DIR={} {} {} --use-gpu-limited --overwrite -v",
            dest.display(),
            config.bin,
            config.single_pass_script
        ),
    ]
}

fn command(mode: HandoffMode, label: &str, dest: &Path, config: &HandoffConfig) -> Command {
    let mut cmd = Command::new(&config.bin);
    match mode {
        HandoffMode::TwoPass => {
            cmd.arg(&config.two_pass_script)
                .args(["--chapter", label, "--input"])
                .arg(dest);
        }
        HandoffMode::SinglePass => {
            let extra_flags = std::env::var("EXTRA_FLAGS").unwrap_or_default();
            let extra_flags = format!("{} --overwrite", extra_flags.trim());
            cmd.arg(&config.single_pass_script)
                .args(["--use-gpu-limited", "-v"])
                .env("CLI_INPUT_DIR", dest)
                .env("EXTRA_FLAGS", extra_flags.trim());
        }
    }
    cmd
}

pub fn run(mode: HandoffMode, label: &str, dest: &Path, config: &HandoffConfig) -> anyhow::Result<()> {
    tracing::info!(?mode, bin = %config.bin, label, dest = %dest.display(), "handoff");

    let status = command(mode, label, dest, config)
        .status()
        .with_context(|| format!("spawn handoff tool: {}", config.bin))?;
    if !status.success() {
        anyhow::bail!("handoff tool failed ({status})");
    }
    Ok(())
}
