use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use crtswitch_core::{BackendKind, CrtMode, CrtSwitcher, SwitchConfig, SwitchOutcome, VideoDriver};
use env_logger::Env;
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Generic,
    Videocore,
    Win32,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Generic => Self::Generic,
            BackendArg::Videocore => Self::VideoCore,
            BackendArg::Win32 => Self::Win32,
        }
    }
}

/// Switch a CRT display to the mode matching a content geometry
#[derive(Parser)]
struct Args {
    /// Content width (4 for the menu)
    width: u32,

    /// Content height (4 for the menu)
    height: u32,

    /// Content refresh rate in Hz
    hz: f32,

    /// TOML config file; command-line options override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// CRT mode (0 = off, 1 = 15 kHz, 2 = 31 kHz with refresh doubling)
    #[arg(long)]
    crt_mode: Option<u8>,

    /// Centering offset
    #[arg(long, allow_hyphen_values = true)]
    center_adjust: Option<i32>,

    /// Monitor index
    #[arg(long)]
    monitor: Option<u32>,

    /// Derive the width from the pixel clock budget
    #[arg(long, default_value_t)]
    dynamic_width: bool,

    /// Mode-setting backend
    #[arg(long)]
    backend: Option<BackendArg>,

    /// Log the mode instead of applying it
    #[arg(long, default_value_t)]
    dry_run: bool,
}

/// A video driver for a headless front end: it only remembers and logs what it is told.
#[derive(Debug, Default)]
struct ConsoleDriver {
    aspect: f32,
}

impl VideoDriver for ConsoleDriver {
    fn set_monitor_refresh_rate(&mut self, hz: f32) {
        info!("monitor refresh rate: {hz} Hz");
    }

    fn set_aspect_ratio_value(&mut self, aspect: f32) {
        debug!("aspect ratio: {aspect:.4}");
        self.aspect = aspect;
    }

    fn aspect_ratio(&self) -> f32 {
        self.aspect
    }

    fn apply_pending_state_changes(&mut self) {
        debug!("applying state changes");
    }
}

fn load_config(path: &Path) -> anyhow::Result<SwitchConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Unable to read config file '{}'", path.display()))?;
    let config = toml::from_str(&contents)
        .with_context(|| format!("Unable to parse config file '{}'", path.display()))?;
    Ok(config)
}

fn build_config(args: &Args) -> anyhow::Result<SwitchConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SwitchConfig::default(),
    };

    if let Some(crt_mode) = args.crt_mode {
        config.crt_mode = CrtMode::try_from(crt_mode)?;
    }
    if let Some(center_adjust) = args.center_adjust {
        config.center_adjust = center_adjust;
    }
    if let Some(monitor) = args.monitor {
        config.monitor_index = monitor;
    }
    if args.dynamic_width {
        config.dynamic_width = true;
    }
    if let Some(backend) = args.backend {
        config.backend = backend.into();
    }
    if args.dry_run {
        config.backend = BackendKind::Generic;
    }

    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = build_config(&args)?;
    debug!("{config:?}");

    let backend = config
        .backend
        .open()
        .with_context(|| format!("Unable to open {:?} backend", config.backend))?;
    let budget = config.budget_for(&*backend);
    let mut switcher = CrtSwitcher::with_budget(backend, ConsoleDriver::default(), budget);

    match switcher.switch_res_core(config.request(args.width, args.height, args.hz)) {
        SwitchOutcome::Switched(mode) => println!(
            "{}x{}@{} (aspect {:.4})",
            mode.width,
            mode.height,
            mode.refresh,
            switcher.state().aspect
        ),
        SwitchOutcome::Unchanged => println!("Mode unchanged"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("crtswitch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let args = parse(&[
            "256",
            "224",
            "59.94",
            "--crt-mode",
            "2",
            "--center-adjust",
            "-3",
            "--backend",
            "videocore",
            "--dynamic-width",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.crt_mode, CrtMode::Khz31);
        assert_eq!(config.center_adjust, -3);
        assert_eq!(config.backend, BackendKind::VideoCore);
        assert!(config.dynamic_width);
    }

    #[test]
    fn test_dry_run_forces_generic_backend() {
        let args = parse(&["320", "240", "60", "--backend", "win32", "--dry-run"]);
        assert_eq!(build_config(&args).unwrap().backend, BackendKind::Generic);
    }

    #[test]
    fn test_invalid_crt_mode_rejected() {
        let args = parse(&["320", "240", "60", "--crt-mode", "5"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_partial_toml_config() {
        let config: SwitchConfig = toml::from_str(
            r#"
            crt_mode = "Khz15"
            backend = "VideoCore"
            "#,
        )
        .unwrap();

        assert_eq!(config.crt_mode, CrtMode::Khz15);
        assert_eq!(config.backend, BackendKind::VideoCore);
        assert_eq!(config.center_adjust, 0);
        assert_eq!(config.pixel_clock_budget, None);
    }
}
