use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::ir::Record;

/// Import count and time of one asset category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub count: usize,
    pub total_ms: f64,
}

/// Headline numbers of a parsed session.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParseSummary {
    pub imports: usize,
    pub import_total_ms: f64,
    pub import_avg_ms: f64,
    pub import_max_ms: f64,
    /// Sorted by total time, slowest first.
    pub by_category: Vec<CategoryTotal>,
    pub refreshes: usize,
    pub refresh_total_seconds: f64,
    pub reload_steps: usize,
    pub reload_total_ms: f64,
    pub assemblies: usize,
    pub telemetry: usize,
}

impl ParseSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut summary = Self::default();
        let mut categories: HashMap<&str, (usize, f64)> = HashMap::new();

        for record in records {
            match record {
                Record::AssetImport(import) => {
                    summary.imports += 1;
                    summary.import_total_ms += import.ms;
                    summary.import_max_ms = summary.import_max_ms.max(import.ms);
                    let entry = categories.entry(import.category.as_str()).or_default();
                    entry.0 += 1;
                    entry.1 += import.ms;
                }
                Record::PipelineRefresh(refresh) => {
                    summary.refreshes += 1;
                    summary.refresh_total_seconds += refresh.total_seconds;
                }
                Record::DomainReloadStep(step) => {
                    summary.reload_steps += 1;
                    summary.reload_total_ms += step.ms;
                }
                Record::ScriptCompilation(_) => summary.assemblies += 1,
                Record::Telemetry(_) => summary.telemetry += 1,
                Record::Operation(_) => {}
            }
        }

        if summary.imports > 0 {
            summary.import_avg_ms = summary.import_total_ms / summary.imports as f64;
        }
        summary.by_category = categories
            .into_iter()
            .map(|(category, (count, total_ms))| CategoryTotal {
                category: category.to_string(),
                count,
                total_ms,
            })
            .collect();
        summary.sort_categories();
        summary
    }

    pub fn sort_categories(&mut self) {
        self.by_category.sort_by(|a, b| {
            b.total_ms
                .total_cmp(&a.total_ms)
                .then_with(|| a.category.cmp(&b.category))
        });
    }
}

impl fmt::Display for ParseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Parsing Summary ===")?;
        writeln!(f, "Asset Imports: {}", self.imports)?;
        if self.imports > 0 {
            writeln!(
                f,
                "  Total time: {:.2}ms ({:.2}s)",
                self.import_total_ms,
                self.import_total_ms / 1000.0
            )?;
            writeln!(f, "  Average: {:.2}ms", self.import_avg_ms)?;
            writeln!(f, "  Longest: {:.2}ms", self.import_max_ms)?;
            writeln!(f, "  By Category:")?;
            for c in &self.by_category {
                writeln!(f, "    {}: {} assets, {:.2}ms", c.category, c.count, c.total_ms)?;
            }
        }
        writeln!(f, "Pipeline Refreshes: {}", self.refreshes)?;
        if self.refreshes > 0 {
            writeln!(f, "  Total time: {:.2}s", self.refresh_total_seconds)?;
        }
        writeln!(f, "Domain Reload Steps: {}", self.reload_steps)?;
        if self.reload_steps > 0 {
            writeln!(f, "  Total time: {:.2}ms", self.reload_total_ms)?;
        }
        writeln!(f, "Script Assemblies Processed: {}", self.assemblies)?;
        write!(f, "Telemetry Entries: {}", self.telemetry)
    }
}
