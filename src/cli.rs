//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// TechWatch - live technology-intelligence briefings from the terminal
///
/// Query an analysis backend for a free-text technology topic and render
/// the consolidated briefing: signal synthesis, technology convergence,
/// adoption S-curve, TRL progression, and per-document analyses.
///
/// Examples:
///   techwatch "quantum radar"
///   techwatch "solid-state batteries" --live-briefing
///   techwatch "neuromorphic chips" --submit --max-polls 20
///   techwatch "hypersonics" --format json --output briefing.json
///   techwatch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Technology topic to brief on
    ///
    /// Free text; the backend is responsible for matching. Not required
    /// when using --init-config.
    #[arg(value_name = "TOPIC", required_unless_present = "init_config")]
    pub topic: Option<String>,

    /// Analysis backend base URL
    #[arg(
        long,
        default_value = "http://127.0.0.1:5000",
        env = "TECHWATCH_BACKEND_URL",
        value_name = "URL"
    )]
    pub backend_url: String,

    /// Output file path for the briefing
    #[arg(
        short,
        long,
        default_value = "briefing_report.md",
        value_name = "FILE"
    )]
    pub output: PathBuf,

    /// Print the briefing to standard output instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Request timeout in seconds
    ///
    /// The live briefing path can take up to 30 seconds while the backend
    /// fetches and analyzes documents. Default: from config or 60s.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fetch the live briefing (GET fast path)
    ///
    /// Asks the backend for an on-the-fly strategic briefing in addition
    /// to the analytics dashboard data.
    #[arg(long)]
    pub live_briefing: bool,

    /// Submit a background analysis job and poll for document results
    #[arg(long)]
    pub submit: bool,

    /// Skip the four analytics sources (synthesis, convergence, s-curve, TRL)
    #[arg(long)]
    pub skip_analytics: bool,

    /// Leave per-document analyses out of the report
    #[arg(long)]
    pub skip_documents: bool,

    /// Seconds between document polls (with --submit)
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Maximum number of document polls (with --submit)
    #[arg(long, value_name = "COUNT")]
    pub max_polls: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .techwatch.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a default .techwatch.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Dry run: print the requests that would be issued and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the briefing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the topic, empty if not set (should be validated first).
    pub fn topic(&self) -> &str {
        self.topic.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.topic().trim().is_empty() {
            return Err("Topic must not be empty".to_string());
        }

        if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            return Err("Backend URL must start with 'http://' or 'https://'".to_string());
        }

        if self.skip_analytics && !self.live_briefing && !self.submit {
            return Err(
                "Nothing to do: --skip-analytics without --live-briefing or --submit".to_string(),
            );
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(interval) = self.poll_interval {
            if interval == 0 {
                return Err("Poll interval must be at least 1 second".to_string());
            }
        }

        if let Some(max_polls) = self.max_polls {
            if max_polls == 0 {
                return Err("Max polls must be at least 1".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            topic: Some("quantum radar".to_string()),
            backend_url: "http://127.0.0.1:5000".to_string(),
            output: PathBuf::from("briefing_report.md"),
            stdout: false,
            format: OutputFormat::Markdown,
            timeout: None,
            live_briefing: false,
            submit: false,
            skip_analytics: false,
            skip_documents: false,
            poll_interval: None,
            max_polls: None,
            config: None,
            init_config: false,
            dry_run: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_validation_empty_topic() {
        let mut args = make_args();
        args.topic = Some("   ".to_string());
        assert!(args.validate().is_err());

        args.topic = None;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_backend_url() {
        let mut args = make_args();
        args.backend_url = "127.0.0.1:5000".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_nothing_to_do() {
        let mut args = make_args();
        args.skip_analytics = true;
        assert!(args.validate().is_err());

        args.submit = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_stdout_and_skip_documents_flags_validate() {
        let mut args = make_args();
        args.stdout = true;
        args.skip_documents = true;
        args.submit = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
