use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::IsTerminal;

/// Trait for output formatting that can be TTY-aware or plain text
pub trait OutputFormatter: Send + Sync {
    /// Print a success message
    fn success(&self, message: &str);

    /// Print an error message
    fn error(&self, message: &str);

    /// Print a warning message
    fn warning(&self, message: &str);

    /// Create a spinner for indeterminate progress
    fn spinner(&self, message: &str) -> ProgressBar;

    /// Finish a progress operation with a message
    fn finish_progress(&self, pb: ProgressBar, message: &str);

    /// Clear a progress indicator without leaving a message behind
    fn abandon_progress(&self, pb: ProgressBar);
}

/// TTY-aware formatter with colors and progress indicators
pub struct TtyFormatter;

impl OutputFormatter for TtyFormatter {
    fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message);
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
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner
    }

    fn finish_progress(&self, pb: ProgressBar, message: &str) {
        pb.finish_with_message(format!("{} {}", "✓".green(), message));
    }

    fn abandon_progress(&self, pb: ProgressBar) {
        pb.finish_and_clear();
    }
}

/// Plain text formatter for non-TTY output (piped, scripted)
///
/// Progress messages go to stderr so that JSON and YAML reports on stdout
/// stay machine-readable.
pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn success(&self, message: &str) {
        println!("✓ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("⚠ {}", message);
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        eprintln!("{}", message);
        ProgressBar::hidden()
    }

    fn finish_progress(&self, pb: ProgressBar, message: &str) {
        pb.finish();
        eprintln!("✓ {}", message);
    }

    fn abandon_progress(&self, pb: ProgressBar) {
        pb.finish();
    }
}

/// Create the appropriate formatter for a color choice
///
/// `Auto` picks the TTY formatter when stdout or stderr is a terminal and
/// `NO_COLOR` is unset.
pub fn create_formatter(color: ColorChoice) -> Box<dyn OutputFormatter> {
    if should_color(color) {
        Box::new(TtyFormatter)
    } else {
        Box::new(PlainFormatter)
    }
}

/// Resolve a color choice against the environment
pub fn should_color(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => {
            std::env::var_os("NO_COLOR").is_none()
                && (std::io::stdout().is_terminal() || std::io::stderr().is_terminal())
        }
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

impl From<libsweep::config::OutputFormat> for OutputFormat {
    fn from(format: libsweep::config::OutputFormat) -> Self {
        match format {
            libsweep::config::OutputFormat::Pretty => OutputFormat::Pretty,
            libsweep::config::OutputFormat::Json => OutputFormat::Json,
            libsweep::config::OutputFormat::Yaml => OutputFormat::Yaml,
        }
    }
}

/// Color output control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl From<&str> for ColorChoice {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => ColorChoice::Always,
            "never" => ColorChoice::Never,
            _ => ColorChoice::Auto,
        }
    }
}

impl From<libsweep::config::ColorChoice> for ColorChoice {
    fn from(color: libsweep::config::ColorChoice) -> Self {
        match color {
            libsweep::config::ColorChoice::Auto => ColorChoice::Auto,
            libsweep::config::ColorChoice::Always => ColorChoice::Always,
            libsweep::config::ColorChoice::Never => ColorChoice::Never,
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

/// Trait for types that can be formatted for CLI output
pub trait Formattable: Serialize {
    /// Format the type for pretty (human-readable) output
    fn format_pretty(&self) -> String;
}

/// Format a vector of items for output
pub fn format_output_vec<T: Formattable>(
    items: &[T],
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Pretty => {
            let output: Vec<String> = items.iter().map(|item| item.format_pretty()).collect();
            Ok(output.join("\n"))
        }
        OutputFormat::Json => serde_json::to_string_pretty(items)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e)),
        OutputFormat::Yaml => {
            serde_yaml::to_string(items).map_err(|e| format!("Failed to serialize to YAML: {}", e))
        }
    }
}
