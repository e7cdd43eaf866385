//! End-to-end tests of `analyze` over a seeded factor market.

use chrono::{Datelike, NaiveDate, Weekday};
use netfolio_core::performance::evaluate;
use netfolio_core::pipeline::{
    analyze, AnalysisConfig, AnalysisContext, AnalysisError, PeriodRange,
};
use netfolio_core::selection::{PortfolioKind, SelectionStrategy, StockClassification};
use netfolio_core::PriceMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

// ── Helpers ──────────────────────────────────────────────────────────

fn weekdays(first_year: i32, last_year: i32) -> Vec<NaiveDate> {
    let mut d = NaiveDate::from_ymd_opt(first_year, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(last_year, 12, 31).unwrap();
    let mut out = Vec::new();
    while d <= end {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(d);
        }
        d = d.succ_opt().unwrap();
    }
    out
}

/// `symbols` stocks driven by one market factor with per-stock betas, plus
/// optional extra columns.
fn market(
    seed: u64,
    symbols: usize,
    first_year: i32,
    last_year: i32,
    extra: Vec<(String, Vec<f64>)>,
) -> PriceMatrix {
    let dates = weekdays(first_year, last_year);
    let mut rng = StdRng::seed_from_u64(seed);
    let betas: Vec<f64> = (0..symbols).map(|j| 0.1 + 1.4 * j as f64 / symbols as f64).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(dates.len()); symbols];
    let mut level = vec![50.0; symbols];
    for _ in &dates {
        let factor: f64 = rng.gen_range(-0.02..0.02);
        for j in 0..symbols {
            let noise: f64 = rng.gen_range(-0.01..0.01);
            level[j] *= 1.0 + betas[j] * factor + noise;
            columns[j].push(level[j]);
        }
    }
    let mut named: Vec<(String, Vec<f64>)> = columns
        .into_iter()
        .enumerate()
        .map(|(j, c)| (format!("T{j:02}"), c))
        .collect();
    named.extend(extra);
    PriceMatrix::new(dates, named).unwrap()
}

fn context(seed: u64, symbols: usize) -> AnalysisContext {
    let all = market(seed, symbols, 2011, 2014, Vec::new());
    AnalysisContext::new(
        all.between(
            NaiveDate::from_ymd_opt(2011, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2013, 12, 31).unwrap(),
        ),
        all.year(2014),
    )
}

fn multi_period(target_size: usize) -> AnalysisConfig {
    AnalysisConfig {
        selection: SelectionStrategy::MultiPeriod {
            percentile: 90.0,
            min_periods: 2,
            target_size,
        },
        periods: PeriodRange::years(2011, 2013),
        ..AnalysisConfig::default()
    }
}

/// Portfolio lengths under multi-period sizing: every qualifier when both
/// sides reach the target, otherwise the target on both sides.
fn expected_sizes(
    classification: &StockClassification,
    min_periods: usize,
    target_size: usize,
) -> (usize, usize) {
    let central = classification.qualified(PortfolioKind::Central, min_periods).len();
    let peripheral = classification.qualified(PortfolioKind::Peripheral, min_periods).len();
    if central >= target_size && peripheral >= target_size {
        (central, peripheral)
    } else {
        (target_size, target_size)
    }
}

// ── Multi-period ─────────────────────────────────────────────────────

#[test]
fn multi_period_produces_sized_portfolios_and_yearly_report() {
    let ctx = context(7, 30);
    let analysis = analyze(&ctx, &multi_period(5)).unwrap();
    let report = &analysis.report;

    let (central, peripheral) =
        expected_sizes(analysis.diagnostics.classification.as_ref().unwrap(), 2, 5);
    assert!(central >= 5 && peripheral >= 5);
    assert_eq!(report.portfolios.central_portfolio.len(), central);
    assert_eq!(report.portfolios.peripheral_portfolio.len(), peripheral);

    let years: Vec<&str> = report
        .performance
        .central
        .yearly
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(years, vec!["2011", "2012", "2013"]);

    let classification = analysis.diagnostics.classification.as_ref().unwrap();
    assert_eq!(classification.periods(), 3);
    assert_eq!(classification.len(), 30);
    assert_eq!(analysis.diagnostics.periods.len(), 3);
    assert!(analysis.diagnostics.periods.iter().all(|p| p.skipped.is_none()));
    assert_eq!(analysis.diagnostics.distance_ranking.observations(), 9);
}

#[test]
fn report_serializes_with_two_top_level_keys() {
    let ctx = context(3, 12);
    let analysis = analyze(&ctx, &multi_period(3)).unwrap();
    let json = serde_json::to_value(&analysis.report).unwrap();
    let keys: BTreeSet<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, BTreeSet::from(["performance", "portfolios"]));
    assert!(json["portfolios"]["central_portfolio"].is_array());
    assert!(json["performance"]["peripheral"]["validation"]["sharpe_ratio"].is_number());
    assert!(json["performance"]["central"]["yearly"]["2012"]["volatility"].is_number());
}

#[test]
fn period_without_data_is_skipped_not_fatal() {
    let ctx = context(11, 10);
    let config = AnalysisConfig {
        periods: PeriodRange::years(2010, 2013),
        ..multi_period(3)
    };
    let analysis = analyze(&ctx, &config).unwrap();

    let skipped: Vec<_> = analysis
        .diagnostics
        .periods
        .iter()
        .filter(|p| p.skipped.is_some())
        .map(|p| p.label.as_str())
        .collect();
    assert_eq!(skipped, vec!["2010"]);
    assert_eq!(analysis.diagnostics.classification.unwrap().periods(), 3);
    assert!(analysis.diagnostics.warnings.iter().any(|w| w.contains("2010")));

    // yearly performance still lists the empty year, as a zero report
    let y2010 = analysis.report.performance.central.yearly["2010"];
    assert_eq!(y2010.average_return, 0.0);
    assert_eq!(y2010.sharpe_ratio, 0.0);
}

// ── Combined score ───────────────────────────────────────────────────

#[test]
fn combined_score_lists_are_disjoint_when_universe_is_large() {
    let ctx = context(5, 20);
    let config = AnalysisConfig {
        selection: SelectionStrategy::combined_score(6),
        ..AnalysisConfig::default()
    };
    let analysis = analyze(&ctx, &config).unwrap();
    let central: BTreeSet<_> = analysis.report.portfolios.central_portfolio.iter().collect();
    let peripheral: BTreeSet<_> = analysis.report.portfolios.peripheral_portfolio.iter().collect();

    assert_eq!(central.len(), 6);
    assert_eq!(peripheral.len(), 6);
    assert!(central.is_disjoint(&peripheral));
    assert!(analysis.diagnostics.overlap.is_empty());
    assert!(analysis.diagnostics.classification.is_none());
    assert_eq!(analysis.diagnostics.periods.len(), 1);
    assert_eq!(analysis.diagnostics.periods[0].label, "2011-2013");
}

#[test]
fn combined_score_reports_overlap_on_small_universe() {
    let ctx = context(5, 8);
    let config = AnalysisConfig {
        selection: SelectionStrategy::combined_score(6),
        ..AnalysisConfig::default()
    };
    let analysis = analyze(&ctx, &config).unwrap();
    assert_eq!(analysis.report.portfolios.central_portfolio.len(), 6);
    assert_eq!(analysis.diagnostics.overlap.len(), 4);
    assert!(analysis.diagnostics.warnings.iter().any(|w| w.contains("share")));
}

#[test]
fn combined_score_single_symbol_is_degenerate() {
    let all = market(1, 1, 2011, 2012, Vec::new());
    let ctx = AnalysisContext::new(all.year(2011), all.year(2012));
    let config = AnalysisConfig {
        selection: SelectionStrategy::combined_score(3),
        ..AnalysisConfig::default()
    };
    assert!(matches!(analyze(&ctx, &config), Err(AnalysisError::Degenerate(_))));
}

// ── Validation & degenerate input ────────────────────────────────────

#[test]
fn validation_uses_only_validation_prices() {
    let ctx = context(9, 15);
    let analysis = analyze(&ctx, &multi_period(4)).unwrap();
    let expected = evaluate(&analysis.report.portfolios.central_portfolio, &ctx.validation);
    assert_eq!(analysis.report.performance.central.validation, expected);

    // different history, same validation table
    let other = context(10, 15);
    let altered = AnalysisContext::new(other.historical, ctx.validation.clone());
    let analysis = analyze(&altered, &multi_period(4)).unwrap();
    let expected = evaluate(&analysis.report.portfolios.peripheral_portfolio, &ctx.validation);
    assert_eq!(analysis.report.performance.peripheral.validation, expected);
}

#[test]
fn constant_price_column_does_not_crash() {
    let rows = weekdays(2011, 2012).len();
    let all = market(4, 10, 2011, 2012, vec![("FLAT".into(), vec![42.0; rows])]);
    let ctx = AnalysisContext::new(all.year(2011), all.year(2012));
    let analysis = analyze(&ctx, &AnalysisConfig::default()).unwrap();

    let period = &analysis.diagnostics.periods[0];
    assert_eq!(period.network.as_ref().unwrap().clamped, vec!["FLAT".to_string()]);
    assert!(analysis.diagnostics.warnings.iter().any(|w| w.contains("FLAT")));
}

#[test]
fn empty_validation_table_is_unavailable() {
    let ctx = context(2, 5);
    let ctx = AnalysisContext::new(ctx.historical, PriceMatrix::empty());
    assert!(matches!(
        analyze(&ctx, &AnalysisConfig::default()),
        Err(AnalysisError::DataUnavailable(_))
    ));
}

#[test]
fn analysis_is_deterministic() {
    let ctx = context(13, 18);
    let config = multi_period(4);
    let first = analyze(&ctx, &config).unwrap();
    let second = analyze(&ctx, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.report).unwrap(),
        serde_json::to_string(&second.report).unwrap()
    );
}

#[test]
fn default_years_come_from_the_table() {
    let ctx = context(6, 8);
    let config = AnalysisConfig::default();
    let analysis = analyze(&ctx, &config).unwrap();
    let years: Vec<_> = analysis.report.performance.central.yearly.keys().cloned().collect();
    assert_eq!(years, vec!["2011", "2012", "2013"]);
}
