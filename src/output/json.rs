use anyhow::Result;
use serde::Serialize;

use super::Report;
use crate::core::{ErrorKind, GenerationOutcome};

#[derive(Serialize)]
struct JsonOutput {
    version: &'static str,
    results: Vec<JsonResult>,
    statistics: JsonStats,
}

#[derive(Serialize)]
struct JsonResult {
    input: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct JsonStats {
    total: usize,
    succeeded: usize,
    failed: usize,
}

pub fn render(reports: &[Report]) -> Result<String> {
    let results: Vec<JsonResult> = reports
        .iter()
        .map(|r| {
            let (status, output, message) = match &r.outcome {
                GenerationOutcome::Success { output_file_path } => {
                    ("success", Some(output_file_path.display().to_string()), None)
                }
                GenerationOutcome::Failure { message, .. } => ("failure", None, Some(message.clone())),
            };
            JsonResult {
                input: r.input.display().to_string(),
                status,
                output,
                kind: r.outcome.error_kind(),
                message,
            }
        })
        .collect();

    let succeeded = results.iter().filter(|r| r.status == "success").count();
    let output = JsonOutput {
        version: "1.0",
        statistics: JsonStats {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        },
        results,
    };

    Ok(serde_json::to_string_pretty(&output)?)
}
