use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

pub const USAGE: &str = "Usage: lighthouse-beach [--assets <dir>] [--seed <u64>] [--summary-only] [--frames <n>] [--time-step <seconds>]";

pub const DEFAULT_ASSET_DIR: &str = "static";
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Runtime options gathered from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding `textures/beach/`.
    pub assets: PathBuf,
    /// Prop layout seed; drawn from entropy when absent.
    pub seed: Option<u64>,
    pub summary_only: bool,
    /// Frames simulated in headless mode.
    pub frames: u32,
    /// Seconds between headless frames.
    pub time_step: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets: PathBuf::from(DEFAULT_ASSET_DIR),
            seed: None,
            summary_only: false,
            frames: 1,
            time_step: DEFAULT_TIME_STEP,
        }
    }
}

impl AppConfig {
    /// Parses arguments without the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => config.summary_only = true,
                "--assets" => config.assets = PathBuf::from(value_for(&arg, args.next())?),
                "--seed" => {
                    let value = value_for(&arg, args.next())?;
                    config.seed = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid --seed value {value:?}"))?,
                    );
                }
                "--frames" => {
                    let value = value_for(&arg, args.next())?;
                    config.frames = value
                        .parse()
                        .with_context(|| format!("invalid --frames value {value:?}"))?;
                }
                "--time-step" => {
                    let value = value_for(&arg, args.next())?;
                    let step: f32 = value
                        .parse()
                        .with_context(|| format!("invalid --time-step value {value:?}"))?;
                    if !step.is_finite() || step < 0.0 {
                        return Err(anyhow!("--time-step must be a non-negative number of seconds"));
                    }
                    config.time_step = step;
                }
                "-h" | "--help" => return Err(anyhow!(USAGE)),
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(config)
    }

    /// Parses the process arguments.
    pub fn parse() -> Result<Self> {
        Self::from_args(std::env::args().skip(1))
    }
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| anyhow!("{flag} expects a value. {USAGE}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let config = AppConfig::from_args(Vec::<String>::new()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.assets, PathBuf::from("static"));
        assert_eq!(config.frames, 1);
    }

    #[test]
    fn parses_every_option() {
        let config = AppConfig::from_args([
            "--assets",
            "/tmp/beach",
            "--seed",
            "42",
            "--summary-only",
            "--frames",
            "120",
            "--time-step",
            "0.5",
        ])
        .unwrap();
        assert_eq!(config.assets, PathBuf::from("/tmp/beach"));
        assert_eq!(config.seed, Some(42));
        assert!(config.summary_only);
        assert_eq!(config.frames, 120);
        assert_eq!(config.time_step, 0.5);
    }

    #[test]
    fn rejects_unknown_and_incomplete_arguments() {
        let unknown = AppConfig::from_args(["--fullscreen"]).unwrap_err();
        assert!(unknown.to_string().contains("Unknown argument: --fullscreen"));
        assert!(AppConfig::from_args(["--seed"]).is_err());
        assert!(AppConfig::from_args(["--seed", "beach"]).is_err());
        assert!(AppConfig::from_args(["--time-step", "-1"]).is_err());
    }
}
