use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::policy::{Finding, Verdict};

/// One line per finding, then one aggregate line. This is the contract CI
/// comment steps parse, so the wording is stable.
pub fn render_text(verdict: &Verdict, approval_group: &str) -> String {
    let mut out = String::new();
    for finding in &verdict.findings {
        let _ = writeln!(
            out,
            "security-related change detected: {} action on {}",
            finding.action, finding.address
        );
    }
    if verdict.triggered() {
        let _ = writeln!(
            out,
            "security-related changes detected in the plan; requiring the '{}' approval group",
            approval_group
        );
    } else {
        let _ = writeln!(out, "no security-related changes detected");
    }
    out
}

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "ACTION")]
    action: String,
    #[tabled(rename = "TYPE")]
    resource_type: String,
    #[tabled(rename = "ADDRESS")]
    address: String,
}

impl From<&Finding> for FindingRow {
    fn from(finding: &Finding) -> Self {
        Self {
            action: finding.action.to_string(),
            resource_type: finding.resource_type.clone(),
            address: finding.address.clone(),
        }
    }
}

/// Findings as a table, with the same aggregate line as the text format.
pub fn render_table(verdict: &Verdict, approval_group: &str) -> String {
    if !verdict.triggered() {
        return "no security-related changes detected\n".to_string();
    }

    let rows: Vec<FindingRow> = verdict.findings.iter().map(FindingRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());

    format!(
        "{}\nsecurity-related changes detected in the plan; requiring the '{}' approval group\n",
        table, approval_group
    )
}

#[derive(Serialize)]
struct JsonVerdict<'a> {
    triggered: bool,
    approval_group: &'a str,
    findings: &'a [Finding],
}

pub fn render_json(
    verdict: &Verdict,
    approval_group: &str,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonVerdict {
        triggered: verdict.triggered(),
        approval_group,
        findings: &verdict.findings,
    })
}

/// Append a `key=value` line to a CI output file (e.g. `$GITHUB_OUTPUT`).
pub fn append_key_value(path: &Path, key: &str, value: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}={}", key, value)
}
