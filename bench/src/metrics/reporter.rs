use vecprobe_engine::RunSummary;

/// Final console output.
pub struct ResultsReporter;

impl ResultsReporter {
    pub fn print_summary(summary: &RunSummary) {
        print!("{}", Self::render(summary));
    }

    /// Pretty JSON for `--json`.
    pub fn print_json(summary: &RunSummary) -> serde_json::Result<()> {
        println!("{}", serde_json::to_string_pretty(summary)?);
        Ok(())
    }

    pub fn render(summary: &RunSummary) -> String {
        let lat = &summary.latency;
        let rule = "=".repeat(60);
        let mut out = String::new();
        out.push('\n');
        out.push_str(&format!("{rule}\n"));
        out.push_str(&format!("  Results: {}\n", summary.scenario));
        out.push_str(&format!("{rule}\n\n"));
        out.push_str(&format!("Queries:      {}\n", summary.queries));
        out.push_str(&format!("Mean recall:  {:.4}\n", summary.mean_recall));
        out.push_str(&format!("QPS:          {:.2} (latency-derived)\n", summary.qps));
        out.push_str(&format!(
            "Wall QPS:     {:.2} over {:.2}s\n\n",
            summary.wall_qps, summary.wall_secs
        ));
        out.push_str("Latency:\n");
        out.push_str(&format!("   Min:    {:>10} us\n", lat.min_us));
        out.push_str(&format!("   Mean:   {:>10.0} us\n", lat.mean_us));
        out.push_str(&format!("   P50:    {:>10} us\n", lat.p50_us));
        out.push_str(&format!("   P95:    {:>10} us\n", lat.p95_us));
        out.push_str(&format!("   P99:    {:>10} us\n", lat.p99_us));
        out.push_str(&format!("   Max:    {:>10} us\n", lat.max_us));
        out.push_str(&format!("{rule}\n"));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vecprobe_engine::RunningStats;

    #[test]
    fn render_includes_recall_and_qps() {
        let mut stats = RunningStats::new().unwrap();
        stats.record(0.5, Duration::from_millis(10));
        stats.record(1.0, Duration::from_millis(30));
        let summary = stats.finalize_with_wall("mo/a.t1", Duration::from_millis(40));

        let text = ResultsReporter::render(&summary);
        assert!(text.contains("mo/a.t1"));
        assert!(text.contains("Mean recall:  0.7500"));
        assert!(text.contains("QPS:          50.00"));
    }
}
