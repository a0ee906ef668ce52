//! A session owns the statistics plus one point set and layout engine per
//! response question.

use splitviz_core::{Question, Respondent, SessionConfig, VizConfig};
use splitviz_layout::{
    LayoutEngine, PointMode, PointSetManager, PointsUpdate, ViewKey, ViewLayout, VizDiff,
};
use splitviz_stats::{Split, Statistics, UpdateResult};

use crate::Result;

/// Everything that changed in one [`Session::ingest`].
#[derive(Debug, Clone)]
pub struct SessionUpdate {
    pub stats: UpdateResult,
    /// Point identities added and removed, one entry per response
    /// question in session order.
    pub points: Vec<(Question, PointsUpdate)>,
    /// One entry per response question, in session order.
    pub viz: Vec<(Question, VizDiff)>,
}

impl SessionUpdate {
    #[must_use]
    pub fn points_for(&self, question: &Question) -> Option<&PointsUpdate> {
        self.points
            .iter()
            .find_map(|(q, update)| (q == question).then_some(update))
    }

    #[must_use]
    pub fn viz_for(&self, question: &Question) -> Option<&VizDiff> {
        self.viz
            .iter()
            .find_map(|(q, diff)| (q == question).then_some(diff))
    }
}

#[derive(Debug, Clone)]
struct ResponseView {
    question: Question,
    points: PointSetManager,
    layout: LayoutEngine,
}

/// Statistics, point identities and layout for one survey.
///
/// Batches are applied in order; `ingest` takes `&mut self`, so callers
/// that receive batches concurrently must serialize them.
#[derive(Debug, Clone)]
pub struct Session {
    statistics: Statistics,
    responses: Vec<ResponseView>,
}

impl Session {
    /// Validate both configs and lay out the empty views.
    pub fn new(session: SessionConfig, viz: VizConfig) -> Result<Self> {
        session.validate()?;
        let mode = PointMode::from_config(&viz);
        let responses = session
            .response_questions
            .iter()
            .enumerate()
            .map(|(position, rq)| -> Result<ResponseView> {
                Ok(ResponseView {
                    question: rq.question.clone(),
                    points: PointSetManager::new(mode, position),
                    layout: LayoutEngine::new(&session, &viz, &rq.question)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let statistics = Statistics::new(session)?;

        let mut this = Self {
            statistics,
            responses,
        };
        for view in &mut this.responses {
            view.layout.update(this.statistics.lattice(), &view.points);
        }
        tracing::debug!(
            target: "splitviz.stats",
            splits = this.statistics.splits().len(),
            response_questions = this.responses.len(),
            ?mode,
            "session ready"
        );
        Ok(this)
    }

    /// Parse both configs from JSON, applying environment overrides to the
    /// viz config.
    pub fn from_json(session_json: &str, viz_json: &str) -> Result<Self> {
        let session = SessionConfig::from_json(session_json)?;
        let viz = VizConfig::from_json(viz_json)?.with_env_overrides();
        Self::new(session, viz)
    }

    /// Apply a batch and re-lay out every view.
    ///
    /// # Errors
    ///
    /// A data-integrity error leaves statistics, points and layout exactly
    /// as they were before the call.
    pub fn ingest(&mut self, respondents: &[Respondent]) -> Result<SessionUpdate> {
        let stats = self.statistics.apply(respondents)?;
        let splits = self.statistics.splits();
        let lattice = self.statistics.lattice();
        let mut points = Vec::with_capacity(self.responses.len());
        let mut viz = Vec::with_capacity(self.responses.len());
        for view in &mut self.responses {
            let update = view.points.update(splits, &stats.diffs);
            let diff = view.layout.update(lattice, &view.points);
            points.push((view.question.clone(), update));
            viz.push((view.question.clone(), diff));
        }
        Ok(SessionUpdate { stats, points, viz })
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    #[must_use]
    pub fn splits(&self) -> &[Split] {
        self.statistics.splits()
    }

    #[must_use]
    pub fn points(&self, question: &Question) -> Option<&PointSetManager> {
        self.response(question).map(|v| &v.points)
    }

    #[must_use]
    pub fn layout(&self, question: &Question) -> Option<&LayoutEngine> {
        self.response(question).map(|v| &v.layout)
    }

    #[must_use]
    pub fn view(&self, question: &Question, key: &ViewKey) -> Option<&ViewLayout> {
        self.layout(question).and_then(|l| l.view(key))
    }

    fn response(&self, question: &Question) -> Option<&ResponseView> {
        self.responses.iter().find(|v| &v.question == question)
    }
}
