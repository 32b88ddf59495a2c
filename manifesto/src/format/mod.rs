use crate::context::{AppContext, VerbosityLevel};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::IsTerminal;
use std::time::Duration;

/// Trait for output formatting that can be TTY-aware or plain text
pub trait OutputFormatter {
    /// Print a success message
    fn success(&self, message: &str);

    /// Print an error message
    fn error(&self, message: &str);

    /// Print a warning message
    fn warning(&self, message: &str);

    /// Create a spinner for indeterminate progress
    fn spinner(&self, message: &str) -> ProgressBar;
}

/// TTY-aware formatter with colors and progress indicators
pub struct TtyFormatter;

impl OutputFormatter for TtyFormatter {
    fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green().bold(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow().bold(), message);
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

/// Plain text formatter for non-TTY output (piped, scripted)
pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn success(&self, message: &str) {
        eprintln!("✓ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("⚠ {}", message);
    }

    fn spinner(&self, _message: &str) -> ProgressBar {
        ProgressBar::hidden()
    }
}

/// Create the appropriate formatter for the context's color setting
pub fn create_formatter(ctx: &AppContext) -> Box<dyn OutputFormatter> {
    if should_color(ctx) {
        Box::new(TtyFormatter)
    } else {
        Box::new(PlainFormatter)
    }
}

/// Check if we should use colors in output
///
/// Metadata goes to stdout and may be piped, so only stderr decides.
pub fn should_color(ctx: &AppContext) -> bool {
    match ctx.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Print a diagnostic to stderr when the context is at least as verbose as `level`
pub fn print(ctx: &AppContext, level: VerbosityLevel, message: &str) {
    if ctx.verbosity >= level {
        eprintln!("{}", message);
    }
}

/// Color output control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl From<&str> for ColorChoice {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" | "true" | "yes" => ColorChoice::Always,
            "never" | "false" | "no" => ColorChoice::Never,
            _ => ColorChoice::Auto,
        }
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColorChoice::Auto => "auto",
            ColorChoice::Always => "always",
            ColorChoice::Never => "never",
        };
        f.write_str(s)
    }
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable pretty format
    Pretty,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Pretty,
        }
    }
}

/// Trait for types that can be formatted for CLI output
pub trait Formattable: Serialize {
    /// Format the type for pretty (human-readable) output
    fn format_pretty(&self) -> String;
}

/// Format a single item for output
pub fn format_output<T: Formattable>(item: &T, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Pretty => Ok(item.format_pretty()),
        OutputFormat::Json => serde_json::to_string_pretty(item)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e)),
        OutputFormat::Yaml => {
            serde_yaml::to_string(item).map_err(|e| format!("Failed to serialize to YAML: {}", e))
        }
    }
}
