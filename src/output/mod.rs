mod json;
pub mod open;

use anyhow::Result;
use clap::ValueEnum;
use console::style;
use serde::Deserialize;
use std::path::PathBuf;

use crate::core::GenerationOutcome;

#[derive(Debug, Clone, Copy, ValueEnum, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// Outcome of one input, as presented to the user
#[derive(Debug, Clone)]
pub struct Report {
    pub input: PathBuf,
    pub outcome: GenerationOutcome,
}

/// Render all reports in the requested format
pub fn render(reports: &[Report], format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(text(reports)),
        Format::Json => json::render(reports),
    }
}

fn text(reports: &[Report]) -> String {
    let mut out = String::new();

    for report in reports {
        match &report.outcome {
            GenerationOutcome::Success { output_file_path } => {
                out.push_str(&format!(
                    "{} UML diagram generated successfully: {}\n",
                    style("✓").green().bold(),
                    output_file_path.display()
                ));
            }
            GenerationOutcome::Failure { kind, message } => {
                out.push_str(&format!(
                    "{} {} [{}]\n    {}\n",
                    style("✗").red().bold(),
                    report.input.display(),
                    kind,
                    message.trim_end().replace('\n', "\n    ")
                ));
            }
        }
    }

    if reports.len() > 1 {
        let succeeded = reports.iter().filter(|r| r.outcome.is_success()).count();
        out.push_str(&format!(
            "\n{} succeeded, {} failed\n",
            succeeded,
            reports.len() - succeeded
        ));
    }

    out
}
