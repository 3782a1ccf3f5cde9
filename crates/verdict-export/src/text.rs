use std::fmt::Write;

use rust_decimal::Decimal;
use verdict_models::AnalysisRecord;

const RULE: &str = "============================================================";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Confidence as a percentage with one decimal, e.g. `72.5%`.
pub fn confidence_percent(confidence: Decimal) -> String {
    format!("{:.1}%", (confidence * Decimal::ONE_HUNDRED).round_dp(1))
}

/// Human-readable report for one record.
pub fn render_text(record: &AnalysisRecord) -> String {
    if record.success {
        render_success(record)
    } else {
        render_failure(record)
    }
}

fn render_success(record: &AnalysisRecord) -> String {
    let verdict = &record.verdict;
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "STOCK ANALYSIS REPORT: {}", record.subject);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Analysis date: {}", record.analyzed_at.format(DATE_FORMAT));
    let _ = writeln!(out, "Elapsed: {:.2}s", record.elapsed_seconds());
    let _ = writeln!(out);

    let _ = writeln!(out, "RECOMMENDATION");
    let _ = writeln!(out, "Rating: {}", verdict.rating);
    let _ = writeln!(out, "Confidence: {}", confidence_percent(verdict.confidence));
    let _ = writeln!(out, "Summary: {}", verdict.recommendation_summary);
    let _ = writeln!(out);

    let _ = writeln!(out, "REASONING");
    let _ = writeln!(out, "{}", verdict.reasoning);
    let _ = writeln!(out);

    write_bullets(&mut out, "KEY FACTORS", &verdict.key_factors);
    write_bullets(&mut out, "RISK FACTORS", &verdict.risk_factors);

    write_section(&mut out, "FUNDAMENTALS", &record.fundamentals);
    write_section(&mut out, "COMPANY SENTIMENT", &record.company_sentiment);
    write_section(&mut out, "SECTOR SENTIMENT", &record.sector_sentiment);

    out
}

fn render_failure(record: &AnalysisRecord) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "ANALYSIS FAILED: {}", record.subject);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Analysis date: {}", record.analyzed_at.format(DATE_FORMAT));
    let _ = writeln!(out, "Elapsed: {:.2}s", record.elapsed_seconds());
    let _ = writeln!(
        out,
        "Error: {}",
        record.error_message.as_deref().unwrap_or("unknown error")
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Fallback rating: {} ({})",
        record.verdict.rating,
        confidence_percent(record.verdict.confidence)
    );
    let _ = writeln!(out, "{}", record.verdict.reasoning);
    let _ = writeln!(out);

    write_bullets(&mut out, "KEY FACTORS", &record.verdict.key_factors);
    write_bullets(&mut out, "RISK FACTORS", &record.verdict.risk_factors);

    // Whatever the earlier stages gathered before the failure
    for (title, body) in [
        ("FUNDAMENTALS", &record.fundamentals),
        ("COMPANY SENTIMENT", &record.company_sentiment),
        ("SECTOR SENTIMENT", &record.sector_sentiment),
    ] {
        if !body.is_empty() {
            write_section(&mut out, title, body);
        }
    }

    out
}

fn write_bullets(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "{title}");
    if items.is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
    let _ = writeln!(out);
}

fn write_section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.len()));
    let _ = writeln!(out, "{}", body.trim_end());
    let _ = writeln!(out);
}
