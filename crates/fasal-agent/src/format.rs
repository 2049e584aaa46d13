// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Renders an analysis report as a chat message.

use fasal_core::{Engine, Severity};
use fasal_pipeline::AnalysisReport;

use crate::i18n::catalog;

const MAX_TREATMENTS: usize = 2;
const MAX_ORGANIC: usize = 2;
const MAX_PREVENTION: usize = 3;

pub fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::None => "🟢",
        Severity::Mild => "🟡",
        Severity::Moderate => "🟠",
        Severity::Severe => "🔴",
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Formats `report` in the language it was localized to.
///
/// Results from the offline sample library carry the demo notice right
/// under the header.
pub fn format_diagnosis(report: &AnalysisReport) -> String {
    let language = report.language;
    let strings = catalog(language);
    let diagnosis = &report.result.diagnosis;
    let record = &report.result.record;

    let crop = record
        .localized(language)
        .and_then(|l| l.crop.as_deref())
        .filter(|_| !record.is_healthy())
        .map_or_else(|| capitalize(&diagnosis.crop), str::to_string);
    let name = record.local_name(language);

    let mut out = format!("{}\n\n", strings.result_header);
    if report.metadata.engine == Engine::StaticFallback {
        out.push_str(&format!("{}\n\n", strings.demo_notice));
    }
    out.push_str(&format!("{} {crop}\n", strings.crop));
    out.push_str(&format!("{} {name}\n", strings.disease));
    if name != record.disease_name {
        out.push_str(&format!("   _{}_\n", record.disease_name));
    }
    out.push_str(&format!(
        "{} {} {}\n",
        severity_emoji(diagnosis.severity),
        strings.severity,
        diagnosis.severity.to_string().to_uppercase()
    ));
    out.push_str(&format!("{} {}%\n", strings.confidence, diagnosis.confidence));
    out.push_str(&format!(
        "\n{}\n{}\n",
        strings.description, report.localized.description
    ));

    if !record.treatments.is_empty() {
        out.push_str(&format!("\n{}\n", strings.treatment));
        for (i, t) in record.treatments.iter().take(MAX_TREATMENTS).enumerate() {
            out.push_str(&format!("{}. *{}*\n", i + 1, t.name));
            out.push_str(&format!("   └ {}: {}\n", strings.dosage, t.dosage));
            out.push_str(&format!(
                "   └ {}: {}\n",
                strings.method,
                report.localized.method(&t.method)
            ));
            out.push_str(&format!(
                "   └ {}: ₹{}{}\n",
                strings.cost, t.cost_per_acre, strings.per_acre
            ));
        }
    }

    if !record.organic_treatments.is_empty() {
        out.push_str(&format!("\n{}\n", strings.organic));
        for option in record.organic_treatments.iter().take(MAX_ORGANIC) {
            out.push_str(&format!("• {option}\n"));
        }
    }

    if !record.prevention.is_empty() {
        out.push_str(&format!("\n{}\n", strings.prevention));
        for step in record.prevention.iter().take(MAX_PREVENTION) {
            out.push_str(&format!("• {step}\n"));
        }
    }

    out.push_str("\n---\n");
    out.push_str(strings.footer);
    out
}
