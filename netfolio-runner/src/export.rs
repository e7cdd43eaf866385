//! Export run results to JSON and CSV.
//!
//! A run directory holds:
//! - `report.json`: the two-key portfolios/performance report
//! - `diagnostics.json`: per-period networks, references and warnings
//! - `metadata.json`: run id, dataset hashes, synthetic flag
//! - `classification.csv`: per-stock central/peripheral counts (multi-period
//!   runs only)

use anyhow::{Context, Result};
use netfolio_core::pipeline::{AnalysisDiagnostics, AnalysisReport};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::RunOutput;
use crate::sweep::SweepRow;

// ─── JSON export ─────────────────────────────────────────────────────

/// Serialize any value as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize to JSON")
}

pub fn report_json(report: &AnalysisReport) -> Result<String> {
    to_json(report)
}

pub fn diagnostics_json(diagnostics: &AnalysisDiagnostics) -> Result<String> {
    to_json(diagnostics)
}

// ─── CSV export ──────────────────────────────────────────────────────

/// Per-stock period counts with near/far distance tallies.
///
/// Returns `None` for runs without a multi-period classification.
pub fn classification_csv(diagnostics: &AnalysisDiagnostics) -> Result<Option<String>> {
    let Some(classification) = &diagnostics.classification else {
        return Ok(None);
    };
    let periods = classification.periods().max(1) as f64;

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "central_periods",
        "peripheral_periods",
        "central_fraction",
        "peripheral_fraction",
        "near_reference",
        "far_from_reference",
    ])?;
    for (symbol, counts) in classification.iter() {
        let (near, far) = diagnostics
            .distance_ranking
            .get(symbol)
            .map_or((0, 0), |nf| (nf.near, nf.far));
        wtr.write_record([
            symbol.clone(),
            counts.central_periods.to_string(),
            counts.peripheral_periods.to_string(),
            format!("{:.4}", counts.central_periods as f64 / periods),
            format!("{:.4}", counts.peripheral_periods as f64 / periods),
            near.to_string(),
            far.to_string(),
        ])?;
    }
    let bytes = wtr.into_inner().context("Failed to flush CSV writer")?;
    Ok(Some(
        String::from_utf8(bytes).context("CSV output is not UTF-8")?,
    ))
}

/// Sweep comparison, one row per strategy.
pub fn sweep_csv(rows: &[SweepRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "strategy",
        "run_id",
        "central_return",
        "central_volatility",
        "central_sharpe",
        "peripheral_return",
        "peripheral_volatility",
        "peripheral_sharpe",
        "sharpe_spread",
    ])?;
    for row in rows {
        wtr.write_record([
            row.strategy.clone(),
            row.run_id.clone(),
            format!("{:.6}", row.central.average_return),
            format!("{:.6}", row.central.volatility),
            format!("{:.4}", row.central.sharpe_ratio),
            format!("{:.6}", row.peripheral.average_return),
            format!("{:.6}", row.peripheral.volatility),
            format!("{:.4}", row.peripheral.sharpe_ratio),
            format!("{:.4}", row.sharpe_spread),
        ])?;
    }
    let bytes = wtr.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

// ─── Run directory ───────────────────────────────────────────────────

/// Write every artifact of a run into `dir`, creating it if needed.
///
/// Returns the paths written.
pub fn write_run(output: &RunOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    let mut write = |name: &str, contents: String| -> Result<()> {
        let path = dir.join(name);
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
        Ok(())
    };

    write("report.json", report_json(&output.analysis.report)?)?;
    write(
        "diagnostics.json",
        diagnostics_json(&output.analysis.diagnostics)?,
    )?;
    write("metadata.json", to_json(&output.metadata)?)?;
    if let Some(csv) = classification_csv(&output.analysis.diagnostics)? {
        write("classification.csv", csv)?;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DateSpan, RunConfig};
    use crate::data_loader::LoadOptions;
    use crate::runner::run_analysis;
    use netfolio_core::pipeline::PeriodRange;
    use netfolio_core::SelectionStrategy;

    fn output(selection: SelectionStrategy) -> RunOutput {
        let mut config = RunConfig::new("/nonexistent/h.csv", "/nonexistent/v.csv");
        config.data.historical_span = DateSpan::years(2017, 2018);
        config.data.validation_span = DateSpan::years(2019, 2019);
        config.periods = PeriodRange::years(2017, 2018);
        config.selection = selection;
        let opts = LoadOptions {
            synthetic: true,
            synthetic_symbols: 10,
        };
        run_analysis(&config, &opts).unwrap()
    }

    #[test]
    fn classification_csv_has_row_per_stock() {
        let out = output(SelectionStrategy::default());
        let csv = classification_csv(&out.analysis.diagnostics).unwrap().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[0].starts_with("symbol,central_periods"));
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn combined_runs_have_no_classification() {
        let out = output(SelectionStrategy::combined_score(3));
        assert!(classification_csv(&out.analysis.diagnostics)
            .unwrap()
            .is_none());
    }

    #[test]
    fn write_run_creates_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = output(SelectionStrategy::default());
        let written = write_run(&out, &dir.path().join("run")).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "report.json",
                "diagnostics.json",
                "metadata.json",
                "classification.csv"
            ]
        );

        let report: AnalysisReport =
            serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(report.portfolios, out.analysis.report.portfolios);
        assert_eq!(
            report.performance.central.yearly.keys().collect::<Vec<_>>(),
            vec!["2017", "2018"]
        );
    }
}
