use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "sandbox",
    author,
    version,
    about = "RayEngine sandbox: drives the frame loop with demo layers"
)]
pub struct Cli {
    /// Engine configuration file (TOML).
    #[arg(long, value_name = "FILE", env = "RAYENGINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Stop the loop after this many frames.
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Pause between frames in milliseconds (0 only yields the thread).
    #[arg(long, value_name = "MILLISECONDS")]
    pub yield_ms: Option<u64>,

    /// Demo layers to load: `basic`, `async`, `direct`, or `all`.
    #[arg(long, value_name = "DEMO", value_parser = parse_demo, default_value = "all")]
    pub demo: Demo,

    /// Log filter directives; overrides the config file and `RUST_LOG`.
    #[arg(long, value_name = "DIRECTIVES")]
    pub log_filter: Option<String>,

    /// Disable coloured log output.
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Basic,
    Async,
    Direct,
    All,
}

impl Demo {
    pub fn includes(self, other: Demo) -> bool {
        self == Demo::All || self == other
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_demo(value: &str) -> Result<Demo, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("demo must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "basic" | "example" => Ok(Demo::Basic),
        "async" => Ok(Demo::Async),
        "direct" | "sync" => Ok(Demo::Direct),
        "all" => Ok(Demo::All),
        other => Err(format!(
            "unknown demo '{other}'; expected basic, async, direct, or all"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_demo_aliases() {
        assert_eq!(parse_demo("basic"), Ok(Demo::Basic));
        assert_eq!(parse_demo(" Async "), Ok(Demo::Async));
        assert_eq!(parse_demo("sync"), Ok(Demo::Direct));
        assert_eq!(parse_demo("ALL"), Ok(Demo::All));
        assert!(parse_demo("").is_err());
        assert!(parse_demo("render").is_err());
    }

    #[test]
    fn all_includes_every_demo() {
        assert!(Demo::All.includes(Demo::Direct));
        assert!(Demo::Async.includes(Demo::Async));
        assert!(!Demo::Async.includes(Demo::Basic));
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["sandbox"]).unwrap();
        assert_eq!(cli.demo, Demo::All);
        assert!(cli.frames.is_none());

        let cli = Cli::try_parse_from(["sandbox", "--frames", "3", "--demo", "async"]).unwrap();
        assert_eq!(cli.frames, Some(3));
        assert_eq!(cli.demo, Demo::Async);
    }
}
