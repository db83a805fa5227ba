//! CSV and plain-text renditions

use std::fmt::Write;

use super::BenchmarkReport;

/// Fixed CSV column order
const CSV_COLUMNS: [&str; 18] = [
    "subject",
    "runs",
    "latest_run",
    "start_kind",
    "average_fps",
    "min_fps",
    "max_fps",
    "percentile_95",
    "percentile_99",
    "dropped_frames",
    "jank_count",
    "frame_time_variance",
    "performance_score",
    "mount_time_ms",
    "time_to_interactive_ms",
    "memory_growth_bytes",
    "render_passes",
    "touch_response_ms",
];

pub(super) fn to_csv(report: &BenchmarkReport) -> String {
    let mut csv = CSV_COLUMNS.join(",");
    csv.push('\n');

    for (subject, summary) in &report.summaries {
        let Some(latest) = report.latest_result(subject) else {
            continue;
        };
        let m = &latest.metrics;
        let c = &latest.capture;
        let start_kind = match latest.start_kind {
            crate::session::StartKind::Cold => "cold",
            crate::session::StartKind::Warm => "warm",
        };

        let row = [
            csv_field(subject),
            summary.runs.to_string(),
            latest.run_index.to_string(),
            start_kind.to_string(),
            format!("{:.2}", m.average_fps),
            format!("{:.2}", m.min_fps),
            format!("{:.2}", m.max_fps),
            format!("{:.2}", m.percentile_95),
            format!("{:.2}", m.percentile_99),
            m.dropped_frame_count.to_string(),
            m.jank_count.to_string(),
            format!("{:.3}", m.frame_time_variance),
            format!("{:.1}", m.performance_score),
            optional(c.mount_time_ms),
            optional(c.time_to_interactive_ms),
            optional(c.memory_growth_bytes),
            c.render_passes.map(|p| p.to_string()).unwrap_or_default(),
            optional(c.touch_response_ms),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

/// Quotes fields containing separators, quotes or newlines
fn csv_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub(super) fn to_text(report: &BenchmarkReport) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "{}", report.title);
    let _ = writeln!(text, "{}", "=".repeat(report.title.chars().count()));
    let _ = writeln!(text, "Generated: {}", report.generated_at.to_rfc3339());
    let _ = writeln!(text);

    for (subject, summary) in &report.summaries {
        let m = &summary.latest;
        let _ = writeln!(text, "{} ({} runs, latest #{})", subject, summary.runs, summary.latest_run);
        let _ = writeln!(
            text,
            "  FPS: avg {:.1}  min {:.1}  max {:.1}  p95 {:.1}  p99 {:.1}",
            m.average_fps, m.min_fps, m.max_fps, m.percentile_95, m.percentile_99
        );
        let _ = writeln!(
            text,
            "  Frames: {} dropped, {} jank, variance {:.2}ms²",
            m.dropped_frame_count, m.jank_count, m.frame_time_variance
        );
        let _ = writeln!(text, "  Score: {:.1}/100", m.performance_score);
    }

    for analysis in &report.comparisons {
        let _ = writeln!(text);
        let _ = writeln!(
            text,
            "{}: run #{} vs #{} overall {:+.1}",
            analysis.subject, analysis.current_run, analysis.previous_run, analysis.overall_improvement
        );
        for (metric, c) in &analysis.metrics {
            let _ = writeln!(
                text,
                "  {:<26} {:>10.2} -> {:>10.2} ({:+.1}%){}",
                metric.label(),
                c.previous,
                c.current,
                c.change_percent,
                if c.significant { " !" } else { "" }
            );
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::AggregatedMetrics;
    use crate::capture::RunCapture;
    use crate::export::tests::sample_report;
    use crate::regression::RegressionAnalyzer;
    use crate::session::BenchmarkSession;

    #[test]
    fn test_csv_has_fixed_header_and_one_row_per_subject() {
        let csv = sample_report().to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], CSV_COLUMNS.join(","));
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("bottom-sheet,2,3,warm,57.50,"));
        assert!(lines[2].starts_with("\"modal, legacy\",1,2,cold,"));
        assert!(lines[2].ends_with(",120.00,,,,"));

        assert_eq!(lines[0].split(',').count(), CSV_COLUMNS.len());
        assert_eq!(lines[1].split(',').count(), CSV_COLUMNS.len());
        // The quoted subject carries one extra separator
        assert_eq!(lines[2].split(',').count(), CSV_COLUMNS.len() + 1);
    }

    #[test]
    fn test_csv_includes_touch_response() {
        let mut session = BenchmarkSession::new();
        session.record(
            "tap-target",
            AggregatedMetrics::default(),
            RunCapture {
                render_passes: Some(3),
                touch_response_ms: Some(42.5),
                ..RunCapture::default()
            },
        );
        let report = BenchmarkReport::from_session("Touch", &session, &RegressionAnalyzer::default());

        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(CSV_COLUMNS.last(), Some(&"touch_response_ms"));
        assert_eq!(lines[1].split(',').count(), CSV_COLUMNS.len());
        assert!(lines[1].ends_with(",3,42.50"));
    }

    #[test]
    fn test_csv_field_escaping() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_text_mentions_every_subject() {
        let text = sample_report().to_text();
        assert!(text.contains("bottom-sheet (2 runs, latest #3)"));
        assert!(text.contains("modal, legacy (1 runs, latest #2)"));
    }
}
