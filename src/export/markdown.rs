//! Markdown rendition of a benchmark report

use std::fmt::Write;

use super::recommendations::{recommend, RecommendationTier};
use super::BenchmarkReport;
use crate::regression::ChangeStatus;

pub(super) fn to_markdown(report: &BenchmarkReport) -> String {
    let mut md = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(md, "# {}", report.title);
    let _ = writeln!(md);
    let _ = writeln!(md, "Generated: {}", report.generated_at.to_rfc3339());
    if !report.tags.is_empty() {
        let tags: Vec<&str> = report.tags.iter().map(String::as_str).collect();
        let _ = writeln!(md, "Tags: {}", tags.join(", "));
    }
    let _ = writeln!(md);

    write_summary(&mut md, report);
    write_subjects(&mut md, report);
    write_comparisons(&mut md, report);
    write_recommendations(&mut md, report);

    md
}

fn write_summary(md: &mut String, report: &BenchmarkReport) {
    let _ = writeln!(md, "## Summary");
    let _ = writeln!(md);
    let _ = writeln!(md, "| Subject | Runs | Avg FPS | Best FPS | Avg score | Jank |");
    let _ = writeln!(md, "|---|---:|---:|---:|---:|---:|");
    for (subject, summary) in &report.summaries {
        let _ = writeln!(
            md,
            "| {} | {} | {:.1} | {:.1} | {:.1} | {} |",
            escape(subject),
            summary.runs,
            summary.mean_average_fps,
            summary.best_average_fps,
            summary.mean_score,
            summary.total_jank
        );
    }
    let _ = writeln!(md);

    if let Some((best, _)) = report
        .summaries
        .iter()
        .max_by(|a, b| a.1.latest.performance_score.total_cmp(&b.1.latest.performance_score))
    {
        let _ = writeln!(md, "Best latest score: **{}**", escape(best));
        let _ = writeln!(md);
    }
}

fn write_subjects(md: &mut String, report: &BenchmarkReport) {
    for subject in report.summaries.keys() {
        let Some(latest) = report.latest_result(subject) else {
            continue;
        };
        let m = &latest.metrics;
        let c = &latest.capture;

        let _ = writeln!(md, "## {} (run #{}, {:?} start)", escape(subject), latest.run_index, latest.start_kind);
        let _ = writeln!(md);
        let _ = writeln!(md, "| Metric | Value |");
        let _ = writeln!(md, "|---|---:|");
        let _ = writeln!(md, "| Average FPS | {:.1} |", m.average_fps);
        let _ = writeln!(md, "| Min / Max FPS | {:.1} / {:.1} |", m.min_fps, m.max_fps);
        let _ = writeln!(md, "| P95 / P99 FPS (low tail) | {:.1} / {:.1} |", m.percentile_95, m.percentile_99);
        let _ = writeln!(md, "| Dropped frames | {} |", m.dropped_frame_count);
        let _ = writeln!(md, "| Jank events | {} |", m.jank_count);
        let _ = writeln!(md, "| Frame time variance | {:.2} ms² |", m.frame_time_variance);
        let _ = writeln!(md, "| Performance score | {:.1} |", m.performance_score);
        if let Some(ms) = c.mount_time_ms {
            let _ = writeln!(md, "| Mount time | {:.1} ms |", ms);
        }
        if let Some(ms) = c.time_to_interactive_ms {
            let _ = writeln!(md, "| Time to interactive | {:.1} ms |", ms);
        }
        if let Some(bytes) = c.memory_growth_bytes {
            let _ = writeln!(md, "| Memory growth | {:.0} bytes |", bytes);
        }
        if let Some(passes) = c.render_passes {
            let _ = writeln!(md, "| Render passes | {} |", passes);
        }
        if let Some(ms) = c.touch_response_ms {
            let _ = writeln!(md, "| Touch response | {:.1} ms |", ms);
        }
        let _ = writeln!(md);
    }
}

fn write_comparisons(md: &mut String, report: &BenchmarkReport) {
    if report.comparisons.is_empty() {
        return;
    }

    let _ = writeln!(md, "## Regression analysis");
    let _ = writeln!(md);
    for analysis in &report.comparisons {
        let _ = writeln!(
            md,
            "### {} (run #{} vs #{}): overall {:+.1}",
            escape(&analysis.subject),
            analysis.current_run,
            analysis.previous_run,
            analysis.overall_improvement
        );
        let _ = writeln!(md);
        let _ = writeln!(md, "| Metric | Previous | Current | Change | Status |");
        let _ = writeln!(md, "|---|---:|---:|---:|---|");
        for (metric, c) in &analysis.metrics {
            let status = match c.status {
                ChangeStatus::Improved => "improved",
                ChangeStatus::Regressed => "regressed",
                ChangeStatus::Unchanged => "unchanged",
            };
            let flag = if c.significant { " ⚠" } else { "" };
            let _ = writeln!(
                md,
                "| {} | {:.2} | {:.2} | {:+.1}% | {}{} |",
                metric.label(),
                c.previous,
                c.current,
                c.change_percent,
                status,
                flag
            );
        }
        let _ = writeln!(md);
    }
}

fn write_recommendations(md: &mut String, report: &BenchmarkReport) {
    let recs = recommend(report);
    let _ = writeln!(md, "## Recommendations");
    let _ = writeln!(md);

    if recs.is_empty() {
        let _ = writeln!(md, "No issues found.");
        return;
    }

    for tier in [
        RecommendationTier::Critical,
        RecommendationTier::Improvement,
        RecommendationTier::BestPractice,
    ] {
        let in_tier: Vec<_> = recs.iter().filter(|r| r.tier == tier).collect();
        if in_tier.is_empty() {
            continue;
        }
        let _ = writeln!(md, "### {}", tier.heading());
        let _ = writeln!(md);
        for rec in in_tier {
            let _ = writeln!(md, "- **{}**: {}", escape(&rec.subject), rec.message);
        }
        let _ = writeln!(md);
    }
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use crate::export::tests::sample_report;

    #[test]
    fn test_markdown_sections() {
        let md = sample_report().to_markdown();

        assert!(md.starts_with("# Modal comparison"));
        assert!(md.contains("## Summary"));
        assert!(md.contains("## bottom-sheet (run #3, Warm start)"));
        assert!(md.contains("## Regression analysis"));
        assert!(md.contains("## Recommendations"));
        assert!(md.contains("Tags: ci"));
    }
}
