//! Benchmarks for point reconciliation and full layout passes.
//!
//! Run with: cargo bench -p splitviz-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use splitviz_core::{
    GroupingQuestion, Question, Respondent, ResponseGroup, ResponseQuestion, SessionConfig,
    VizConfig,
};
use splitviz_layout::{LayoutEngine, PointMode, PointSetManager};
use splitviz_stats::Statistics;
use std::hint::black_box;

fn q(name: &str) -> Question {
    Question::new(name, "bench", "")
}

fn session() -> SessionConfig {
    let grouping = ["region", "age", "gender"]
        .iter()
        .zip([4i64, 3, 2])
        .map(|(name, n)| {
            GroupingQuestion::new(
                q(name),
                (0..n).map(|v| ResponseGroup::new(format!("{name}{v}"), [v])).collect(),
            )
        })
        .collect();
    let response = ResponseQuestion::new(
        q("answer"),
        (0..5).map(|v| ResponseGroup::new(format!("a{v}"), [v])).collect(),
        vec![
            ResponseGroup::new("low", [0, 1]),
            ResponseGroup::new("mid", [2]),
            ResponseGroup::new("high", [3, 4]),
        ],
    )
    .expect("valid");
    SessionConfig::new(grouping, vec![response], None).expect("valid")
}

fn viz(sample_size: Option<u32>) -> VizConfig {
    VizConfig {
        grouping_questions_horizontal: vec![q("region"), q("age")],
        grouping_questions_vertical: vec![q("gender")],
        synthetic_sample_size: sample_size,
        ..VizConfig::default()
    }
}

fn batch(n: usize) -> Vec<Respondent> {
    (0..n)
        .map(|i| {
            Respondent::with_id(format!("r{i}"))
                .with_answer(q("region"), (i % 4) as i64)
                .with_answer(q("age"), (i / 4 % 3) as i64)
                .with_answer(q("gender"), (i / 12 % 2) as i64)
                .with_answer(q("answer"), (i * 7 % 5) as i64)
        })
        .collect()
}

fn bench_layout_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/update");
    for (label, sample) in [("real", None), ("synthetic_100", Some(100))] {
        for n in [100, 1000] {
            let session = session();
            let viz = viz(sample);
            let mut stats = Statistics::new(session.clone()).expect("valid");
            let result = stats.apply(&batch(n)).expect("ok");
            let mut points = PointSetManager::new(PointMode::from_config(&viz), 0);
            points.update(stats.splits(), &result.diffs);
            let mut engine = LayoutEngine::new(&session, &viz, &q("answer")).expect("valid");
            engine.update(stats.lattice(), &points);

            group.bench_with_input(BenchmarkId::new(label, n), &n, |b, _| {
                b.iter(|| black_box(engine.update(stats.lattice(), &points)))
            });
        }
    }
    group.finish();
}

fn bench_synthetic_reconcile(c: &mut Criterion) {
    let session = session();
    let mut stats = Statistics::new(session).expect("valid");
    let result = stats.apply(&batch(2000)).expect("ok");
    c.bench_function("layout/synthetic_reconcile", |b| {
        b.iter(|| {
            let mut points = PointSetManager::new(PointMode::Synthetic { sample_size: 200 }, 0);
            black_box(points.update(stats.splits(), &result.diffs))
        })
    });
}

criterion_group!(benches, bench_layout_pass, bench_synthetic_reconcile);
criterion_main!(benches);
