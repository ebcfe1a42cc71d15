// 📤 Report Export - CSV and JSON serializations of a prepared report
// The CSV mirrors the legacy dashboard download: UTF-8 BOM so spreadsheet
// apps detect the encoding, then a payments section and a treatments section
// with Persian headers.

use crate::report::ReportData;
use anyhow::{Context, Result};
use csv::Writer;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Serialize a report as the two-section admin CSV.
pub fn report_to_csv(report: &ReportData) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(UTF8_BOM);
    out.extend(payments_section(report)?);
    out.push(b'\n');
    out.extend(treatments_section(report)?);
    Ok(out)
}

fn payments_section(report: &ReportData) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_record(["نوع پرداخت", "بهترین امتیاز", "ستاره‌ها", "تأخیر", "یادداشت"])
        .context("Failed to write payments header")?;

    for payment in &report.charts.payments_by_score {
        writer
            .write_record([
                payment.name.as_str(),
                &format_score(payment.best_score),
                payment.stars.as_str(),
                payment.delay.as_deref().unwrap_or("-"),
                payment.notes.as_deref().unwrap_or(""),
            ])
            .context("Failed to write payment row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush payments section: {}", e))
}

fn treatments_section(report: &ReportData) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());
    writer
        .write_record(["نام درمان", "سطح سودآوری", "هزینه", "یادداشت"])
        .context("Failed to write treatments header")?;

    for treatment in &report.treatments {
        writer
            .write_record([
                treatment.name.as_str(),
                treatment.profitability_label.as_str(),
                treatment.cost.as_str(),
                treatment.notes.as_deref().unwrap_or(""),
            ])
            .context("Failed to write treatment row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush treatments section: {}", e))
}

/// Scores are whole numbers almost always; render "9" rather than "9.0".
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{}", score)
    }
}

/// Serialize a report as pretty-printed JSON.
pub fn report_to_json(report: &ReportData) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

// ============================================================================
// TESTS
// ============================================================================
