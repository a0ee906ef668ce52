#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use splitviz_core::{
    GroupingQuestion, Question, RawValue, Respondent, ResponseGroup, ResponseQuestion, SessionConfig,
    VizConfig,
};
use splitviz_layout::{LayoutEngine, PointMode, PointSetManager};
use splitviz_stats::Statistics;

#[derive(Debug, Arbitrary)]
struct Answer {
    age: Option<u8>,
    region: Option<u8>,
    choice: Option<u8>,
}

#[derive(Debug, Arbitrary)]
struct Input {
    sample_size: Option<u8>,
    batches: Vec<Vec<Answer>>,
}

fn q(name: &str) -> Question {
    Question::new(name, "fuzz", "")
}

fn session() -> Option<SessionConfig> {
    let grouping = vec![
        GroupingQuestion::new(
            q("age"),
            vec![ResponseGroup::new("a0", [0]), ResponseGroup::new("a1", [1, 2])],
        ),
        GroupingQuestion::new(
            q("region"),
            (0..3).map(|v| ResponseGroup::new(format!("r{v}"), [v])).collect(),
        ),
    ];
    let response = ResponseQuestion::new(
        q("choice"),
        (0..4).map(|v| ResponseGroup::new(format!("c{v}"), [v])).collect(),
        vec![
            ResponseGroup::new("low", [0, 1]),
            ResponseGroup::new("high", [2, 3]),
        ],
    )
    .ok()?;
    SessionConfig::new(grouping, vec![response], None).ok()
}

fuzz_target!(|input: Input| {
    if input.batches.len() > 8 || input.batches.iter().any(|b| b.len() > 64) {
        return;
    }
    let Some(config) = session() else {
        return;
    };
    let viz = VizConfig {
        grouping_questions_horizontal: vec![q("age")],
        grouping_questions_vertical: vec![q("region")],
        synthetic_sample_size: input.sample_size.map(u32::from),
        ..VizConfig::default()
    };
    let Ok(mut engine) = LayoutEngine::new(&config, &viz, &q("choice")) else {
        return;
    };
    let Ok(mut stats) = Statistics::new(config) else {
        return;
    };
    let mut points = PointSetManager::new(PointMode::from_config(&viz), 0);

    let mut valid = 0u64;
    for (b, batch) in input.batches.iter().enumerate() {
        let respondents: Vec<Respondent> = batch
            .iter()
            .enumerate()
            .map(|(i, a)| {
                Respondent::new(
                    format!("{b}-{i}"),
                    [
                        (q("age"), a.age.map(|v| RawValue::Code(i64::from(v % 4)))),
                        (q("region"), a.region.map(|v| RawValue::Code(i64::from(v % 4)))),
                        (q("choice"), a.choice.map(|v| RawValue::Code(i64::from(v % 5)))),
                    ],
                )
            })
            .collect();
        let Ok(result) = stats.apply(&respondents) else {
            panic!("unit weights never violate integrity");
        };
        valid += result.valid_count as u64;
        points.update(stats.splits(), &result.diffs);
        engine.update(stats.lattice(), &points);
    }

    let basis_total: u64 = stats.basis_splits().map(|s| s.total_count).sum();
    assert_eq!(basis_total, valid, "basis splits partition valid respondents");

    for key in engine.view_keys() {
        if let Some(layout) = engine.view(key) {
            assert_eq!(layout.point_count(), points.len());
            for cell in &layout.groups {
                for point in cell.segments.iter().flat_map(|s| &s.points) {
                    assert!(cell.bounds.contains(point.position), "point left its cell");
                }
            }
        }
    }
});
