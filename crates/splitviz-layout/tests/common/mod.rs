#![allow(dead_code)]

use splitviz_core::{
    GroupingQuestion, Question, Respondent, ResponseGroup, ResponseQuestion, SessionConfig,
    VizConfig,
};
use splitviz_layout::{LayoutEngine, PointMode, PointSetManager, VizDiff};
use splitviz_stats::Statistics;

pub fn q(name: &str) -> Question {
    Question::new(name, "poll", "")
}

pub fn session() -> SessionConfig {
    SessionConfig::new(
        vec![
            GroupingQuestion::new(
                q("age"),
                vec![
                    ResponseGroup::new("18-34", [1]),
                    ResponseGroup::new("35-64", [2]),
                    ResponseGroup::new("65+", [3]),
                ],
            ),
            GroupingQuestion::new(
                q("gender"),
                vec![ResponseGroup::new("male", [1]), ResponseGroup::new("female", [2])],
            ),
        ],
        vec![
            ResponseQuestion::new(
                q("party"),
                vec![
                    ResponseGroup::new("strong left", [1]),
                    ResponseGroup::new("lean left", [2]),
                    ResponseGroup::new("lean right", [3]),
                    ResponseGroup::new("strong right", [4]),
                ],
                vec![
                    ResponseGroup::new("left", [1, 2]),
                    ResponseGroup::new("right", [3, 4]),
                ],
            )
            .expect("valid"),
        ],
        None,
    )
    .expect("valid")
}

pub fn viz(sample_size: Option<u32>) -> VizConfig {
    VizConfig {
        grouping_questions_horizontal: vec![q("age")],
        grouping_questions_vertical: vec![q("gender")],
        synthetic_sample_size: sample_size,
        ..VizConfig::default()
    }
}

pub fn respondent(id: usize, age: i64, gender: i64, party: i64) -> Respondent {
    Respondent::with_id(format!("r{id}"))
        .with_answer(q("age"), age)
        .with_answer(q("gender"), gender)
        .with_answer(q("party"), party)
}

/// Statistics, points and layout for the `party` question, driven together.
pub struct Pipeline {
    pub stats: Statistics,
    pub points: PointSetManager,
    pub engine: LayoutEngine,
}

impl Pipeline {
    pub fn new(sample_size: Option<u32>) -> Self {
        let session = session();
        let viz = viz(sample_size);
        Self {
            engine: LayoutEngine::new(&session, &viz, &q("party")).expect("valid"),
            points: PointSetManager::new(PointMode::from_config(&viz), 0),
            stats: Statistics::new(session).expect("valid"),
        }
    }

    pub fn ingest(&mut self, batch: &[Respondent]) -> VizDiff {
        let result = self.stats.apply(batch).expect("ok");
        self.points.update(self.stats.splits(), &result.diffs);
        self.engine.update(self.stats.lattice(), &self.points)
    }
}
