use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

#[derive(Clone, Copy)]
enum Level {
    Success,
    Info,
    Warning,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

/// User-facing output. Diagnostics go through `tracing`; this is what the
/// command actually reports.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        self.status(Level::Success, msg.as_ref());
    }

    /// Printed even with `--quiet`.
    pub fn error(&self, msg: impl AsRef<str>) {
        self.status(Level::Error, msg.as_ref());
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.status(Level::Info, msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.status(Level::Warning, msg.as_ref());
    }

    /// Plain human-mode text (tables, listings). Skipped in JSON modes.
    pub fn println(&self, msg: impl AsRef<str>) {
        if self.is_human() && !self.quiet {
            println!("{}", msg.as_ref());
        }
    }

    /// A command's result payload. Human mode never calls this.
    pub fn json(&self, data: &Value) {
        if !self.quiet {
            self.write_json(data);
        }
    }

    fn status(&self, level: Level, msg: &str) {
        if self.quiet && !matches!(level, Level::Error) {
            return;
        }

        if !self.is_human() {
            self.write_json(&json!({ "type": level.tag(), "message": msg }));
            return;
        }

        match level {
            Level::Success => println!("{} {}", "✓".green(), msg),
            Level::Info => println!("{}", msg),
            Level::Warning => println!("{} {}", "⚠".yellow(), msg),
            Level::Error => eprintln!("{} {}", "✗".red(), msg),
        }
    }

    fn write_json(&self, data: &Value) {
        let rendered = match self.format {
            OutputFormat::JsonPretty => serde_json::to_string_pretty(data),
            OutputFormat::Json | OutputFormat::Human => serde_json::to_string(data),
        };
        println!("{}", rendered.unwrap_or_default());
    }
}
