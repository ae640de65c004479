//! Results reporting and formatting.

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

use crate::runner::{ScenarioResults, TuneResult};

/// Formats benchmark results for output.
pub struct ResultsReport;

impl ResultsReport {
    /// Format scenario results as console tables.
    pub fn format_table(results: &ScenarioResults) -> String {
        let mut indexes = Table::new();
        indexes
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                "Index",
                "Build (ms)",
                "Memory (KiB)",
                "Hit rate",
                "Agreement",
                "Query p50 / p99 / max (ns)",
                "Pixel map (ms)",
            ]);
        for r in &results.indexes {
            indexes.add_row(vec![
                r.kind.to_string(),
                format!("{:.1}", r.build_ms),
                format!("{:.1}", r.memory_bytes as f64 / 1024.0),
                format!("{:.1}%", r.hit_rate * 100.0),
                format!("{:.2}%", r.agreement * 100.0),
                format!("{} / {} / {}", r.query_p50_ns, r.query_p99_ns, r.query_max_ns),
                format!("{:.1}", r.pixel_map_ms),
            ]);
        }

        let mut strategies = Table::new();
        strategies
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec!["Strategy", "Read calls", "Values read"]);
        for s in &results.strategies {
            strategies.add_row(vec![
                s.strategy.to_string(),
                s.read_calls.to_string(),
                s.values_read.to_string(),
            ]);
        }

        format!(
            "Scenario: {} ({}x{} cells, {} queries)\n{}\n\nTarget: {} points, {} unique source cells\n{}",
            results.scenario,
            results.ni,
            results.nj,
            results.queries,
            indexes,
            results.target_points,
            results.unique_ij_pairs,
            strategies
        )
    }

    /// Format a KD-tree sweep as a console table.
    pub fn format_tune_table(results: &[TuneResult]) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec!["k", "Expansion", "Mean query (ns)", "Hit rate", "Agreement"]);
        for r in results {
            table.add_row(vec![
                r.k.to_string(),
                format!("{:.2}", r.expansion_factor),
                format!("{:.0}", r.mean_query_ns),
                format!("{:.1}%", r.hit_rate * 100.0),
                format!("{:.2}%", r.agreement * 100.0),
            ]);
        }
        table.to_string()
    }

    /// Format any serializable results as JSON.
    pub fn format_json<T: serde::Serialize + ?Sized>(results: &T) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(results)?)
    }
}
