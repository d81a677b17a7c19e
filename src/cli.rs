//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// Build a set of Go tools concurrently
#[derive(Debug, Parser)]
#[command(
    name = "forge",
    about = "Concurrent builder for Go command-line tools",
    version
)]
pub struct Cli {
    /// Path to the tool manifest (default: ./config.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory that receives the built binaries (default: current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Keep the build directory for inspection
    #[arg(short, long)]
    pub keep: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Build only these tools (default: everything in the manifest)
    #[arg(value_name = "TOOL")]
    pub tools: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["forge"]);
        assert!(cli.config.is_none());
        assert!(cli.output_dir.is_none());
        assert!(!cli.keep);
        assert!(!cli.verbose);
        assert!(cli.tools.is_empty());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["forge", "-c", "tools.yaml", "-o", "/opt/bin", "--keep", "-v"]);
        assert_eq!(cli.config, Some(PathBuf::from("tools.yaml")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/opt/bin")));
        assert!(cli.keep);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_tool_filters() {
        let cli = Cli::parse_from(["forge", "golang.org/x/tools/gopls", "github.com/go-delve/delve/cmd/dlv"]);
        assert_eq!(
            cli.tools,
            vec![
                "golang.org/x/tools/gopls".to_string(),
                "github.com/go-delve/delve/cmd/dlv".to_string()
            ]
        );
    }
}
