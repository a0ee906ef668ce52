#![allow(dead_code)]

use splitviz_core::{
    GroupingQuestion, Question, Respondent, ResponseGroup, ResponseQuestion, SessionConfig,
};

pub fn q(name: &str) -> Question {
    Question::new(name, "poll", "")
}

/// age (young/old) × gender (male/female), one response question with four
/// expanded groups collapsing to two.
pub fn age_gender_config(weighted: bool) -> SessionConfig {
    SessionConfig::new(
        vec![
            GroupingQuestion::new(
                q("age"),
                vec![ResponseGroup::new("young", [1]), ResponseGroup::new("old", [2])],
            ),
            GroupingQuestion::new(
                q("gender"),
                vec![ResponseGroup::new("male", [1]), ResponseGroup::new("female", [2])],
            ),
        ],
        vec![party()],
        weighted.then(|| q("weight")),
    )
    .expect("valid session")
}

pub fn party() -> ResponseQuestion {
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
    .expect("valid")
}

pub fn respondent(id: usize, age: i64, gender: i64, party: i64) -> Respondent {
    Respondent::with_id(format!("r{id}"))
        .with_answer(q("age"), age)
        .with_answer(q("gender"), gender)
        .with_answer(q("party"), party)
}

pub fn weighted(id: usize, age: i64, gender: i64, party: i64, weight: f64) -> Respondent {
    respondent(id, age, gender, party).with_answer(q("weight"), weight)
}
