//! Benchmarks for sheet layout and XLSX writing.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(
    clippy::expect_used,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

use cbqa::{
    CategoryMapping, CostFactorTable, DriverMapping, LayoutConfig, QaWorkbookBuilder,
    StrategyInputs, Table,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const TIME_INIT: i64 = 7;
const TIME_END: i64 = 35;

/// `variables` cost variables, each driven by two series, grouped into four categories.
struct Scenario {
    drivers: DriverMapping,
    factors: CostFactorTable,
    categories: CategoryMapping,
    baseline: Table,
    pathway: Table,
    reference: Table,
}

fn scenario(variables: usize) -> Scenario {
    let periods = TIME_INIT..=TIME_END;
    let len = periods.clone().count();
    let mut baseline = Table::for_periods("baseline", periods.clone());
    let mut pathway = Table::for_periods("pathway", periods);
    let mut drivers = DriverMapping::new();
    let mut factors = CostFactorTable::new();
    let mut categories = CategoryMapping::new();
    let mut members: Vec<Vec<String>> = vec![Vec::new(); 4];

    for v in 0..variables {
        let series = [format!("s{v}a"), format!("s{v}b")];
        for (i, name) in series.iter().enumerate() {
            let base = (v + i) as f64;
            baseline
                .push_column(name.as_str(), (0..len).map(|_| base))
                .expect("baseline column");
            pathway
                .push_column(name.as_str(), (0..len).map(|p| base + p as f64 * 0.1))
                .expect("pathway column");
        }
        let variable = format!("cb:v{v}");
        drivers.insert(variable.as_str(), series.iter().map(String::as_str));
        factors.insert(cbqa::CostFactor {
            variable: variable.clone(),
            multiplier: 1.0 + v as f64,
            multiplier_unit: "usd".to_string(),
            annual_change: 1.02,
        });
        if let Some(group) = members.get_mut(v % 4) {
            group.push(variable);
        }
    }

    let mut reference = Table::new("reference", ["bench"]);
    for (i, group) in members.into_iter().enumerate() {
        let name = format!("category_{i}");
        reference.push_column(name.as_str(), [0.0]).expect("reference column");
        categories.insert(name, group);
    }

    Scenario {
        drivers,
        factors,
        categories,
        baseline,
        pathway,
        reference,
    }
}

fn build(s: &Scenario, strategies: usize) -> QaWorkbookBuilder {
    let config = LayoutConfig::new(TIME_INIT, TIME_END).expect("config");
    let mut builder =
        QaWorkbookBuilder::new(config, s.drivers.clone(), s.factors.clone()).expect("builder");
    for n in 0..strategies {
        builder
            .compute_strategy_sheet(&StrategyInputs {
                strategy: &format!("S{n}"),
                baseline: &s.baseline,
                pathway: &s.pathway,
                categories: &s.categories,
                cumulative_reference: &s.reference,
                emission_diff: -1.0,
            })
            .expect("strategy sheet");
    }
    builder
}

/// Layout cost as the number of cost variables grows
fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    for variables in [10, 100, 400] {
        let s = scenario(variables);
        group.throughput(Throughput::Elements(variables as u64));
        group.bench_with_input(BenchmarkId::new("strategy_sheet", variables), &s, |b, s| {
            b.iter(|| build(black_box(s), 1));
        });
    }
    group.finish();
}

/// Full workbook: 20 strategy sheets laid out and written as XLSX
fn bench_write_xlsx(c: &mut Criterion) {
    let s = scenario(100);
    let builder = build(&s, 20);

    c.bench_function("write_xlsx_20x100", |b| {
        b.iter(|| black_box(&builder).to_xlsx_bytes().expect("write"))
    });
}

/// Read back and cross-check the written workbook
fn bench_verify(c: &mut Criterion) {
    let s = scenario(100);
    let bytes = build(&s, 5).to_xlsx_bytes().expect("write");

    c.bench_function("read_and_verify_5x100", |b| {
        b.iter(|| {
            let wb = cbqa::parser::read_xlsx(black_box(&bytes)).expect("read");
            cbqa::verify::verify_workbook(&wb, 1e-6).expect("verify")
        })
    });
}

criterion_group!(benches, bench_layout, bench_write_xlsx, bench_verify);

criterion_main!(benches);
