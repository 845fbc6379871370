//! Output writer supporting JSON and human-readable modes.

use jujulib_connect::{CreatedModel, DestroyResult, ModelListing, ModelSummary};
use jujulib_wire::FacadeTable;
use serde::Serialize;

use crate::cli_style;
use crate::error::CliError;

/// Output mode for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Error report for JSON output
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub category: String,
    pub exit_code: i32,
}

impl From<&CliError> for ErrorReport {
    fn from(err: &CliError) -> Self {
        Self {
            error: sanitize_error(&err.to_string()),
            category: err.category().to_string(),
            exit_code: err.exit_code(),
        }
    }
}

/// Writes command results to stdout, as tables or as JSON
#[derive(Debug, Clone)]
pub struct OutputWriter {
    pub mode: OutputMode,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            mode: if json { OutputMode::Json } else { OutputMode::Human },
        }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: cannot encode output: {}", e),
        }
    }

    pub fn models(&self, models: &[ModelSummary]) {
        match self.mode {
            OutputMode::Json => self.json(models),
            OutputMode::Human if models.is_empty() => cli_style::print_info("No models"),
            OutputMode::Human => println!("{}", cli_style::models_table(models)),
        }
    }

    pub fn listings(&self, listings: &[ModelListing]) {
        match self.mode {
            OutputMode::Json => self.json(listings),
            OutputMode::Human if listings.is_empty() => cli_style::print_info("No models"),
            OutputMode::Human => println!("{}", cli_style::listings_table(listings)),
        }
    }

    pub fn facades(&self, facades: &FacadeTable) {
        match self.mode {
            OutputMode::Json => self.json(facades),
            OutputMode::Human => println!("{}", cli_style::facades_table(facades)),
        }
    }

    pub fn destroyed(&self, results: &[DestroyResult]) {
        match self.mode {
            OutputMode::Json => self.json(results),
            OutputMode::Human => println!("{}", cli_style::destroy_table(results)),
        }
    }

    pub fn created(&self, model: &CreatedModel) {
        match self.mode {
            OutputMode::Json => self.json(model),
            OutputMode::Human => {
                let region = model
                    .region
                    .as_deref()
                    .map(|r| format!(" in {}", r))
                    .unwrap_or_default();
                cli_style::print_success(&format!(
                    "Created model {} ({}) for {}{}",
                    model.name, model.uuid, model.owner, region
                ));
            }
        }
    }

    /// Print a one-line status (`{"status": ...}` in JSON mode)
    pub fn status(&self, msg: &str) {
        match self.mode {
            OutputMode::Json => self.json(&serde_json::json!({ "status": msg })),
            OutputMode::Human => cli_style::print_success(msg),
        }
    }

    /// Print an error to stderr
    pub fn error(&self, err: &CliError) {
        match self.mode {
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(&ErrorReport::from(err)) {
                    eprintln!("{}", json);
                }
            }
            OutputMode::Human => {
                cli_style::print_error(&sanitize_error(&err.to_string()), err.suggestion())
            }
        }
    }

    /// Print a warning (suppressed in JSON mode)
    pub fn warning(&self, msg: &str) {
        if !self.is_json() {
            cli_style::print_warning(msg);
        }
    }
}

/// Sanitize error messages by collapsing whitespace
pub fn sanitize_error(msg: &str) -> String {
    msg.split_whitespace().collect::<Vec<&str>>().join(" ")
}
