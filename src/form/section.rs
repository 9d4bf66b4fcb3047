use serde::{Deserialize, Serialize};

use crate::{
    form::render::{render, RenderedQuestion},
    model::{answer::AnswerStore, question::Question, survey::HeaderForm},
};

/// Shown above the questions of every survey.
pub const INSTRUCTIONS: &str =
    "Please read each statement carefully and select the most appropriate option from the rating scale.";

/// An inclusive range of question `order` values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRange {
    pub lo: i64,
    pub hi: i64,
}

impl OrderRange {
    pub fn contains(&self, order: i64) -> bool {
        self.lo <= order && order <= self.hi
    }
}

/// A titled range of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    #[serde(flatten)]
    pub range: OrderRange,
    pub title: String,
}

impl SectionSpec {
    pub fn new(lo: i64, hi: i64, title: &str) -> Self {
        Self {
            range: OrderRange { lo, hi },
            title: title.to_string(),
        }
    }

    /// The vendor evaluation layout.
    pub fn default_layout() -> Vec<Self> {
        vec![
            Self::new(1, 2, "Supplier Information"),
            Self::new(3, 5, "Quality of Product/Service"),
            Self::new(6, 8, "Timeliness and On-Time Delivery"),
            Self::new(9, 12, "Communication and Responsiveness"),
        ]
    }
}

/// Questions grouped under one title, in their original relative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'q> {
    pub title: &'q str,
    pub questions: Vec<&'q Question>,
}

/// Group questions by the given ranges, in the caller's section order.
///
/// Empty sections are dropped, and questions outside every range are
/// simply not shown.
pub fn assemble<'q>(questions: &'q [Question], specs: &'q [SectionSpec]) -> Vec<Section<'q>> {
    specs
        .iter()
        .filter_map(|spec| {
            let matching: Vec<_> = questions
                .iter()
                .filter(|q| spec.range.contains(q.order))
                .collect();
            (!matching.is_empty()).then(|| Section {
                title: &spec.title,
                questions: matching,
            })
        })
        .collect()
}

/// A section with its questions rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSection {
    pub title: String,
    pub questions: Vec<RenderedQuestion>,
}

/// The whole self-serve survey: instructions, personal-info header and question sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyForm {
    pub instructions: String,
    pub header: HeaderForm,
    pub sections: Vec<RenderedSection>,
}

/// Render the assembled sections against the store.
///
/// A section whose questions are all of unknown type renders no header either.
pub fn render_sections(
    questions: &[Question],
    specs: &[SectionSpec],
    answers: &AnswerStore,
) -> Vec<RenderedSection> {
    assemble(questions, specs)
        .into_iter()
        .filter_map(|section| {
            let rendered: Vec<_> = section
                .questions
                .iter()
                .filter_map(|q| render(q, answers.get(q.id)))
                .collect();
            (!rendered.is_empty()).then(|| RenderedSection {
                title: section.title.to_string(),
                questions: rendered,
            })
        })
        .collect()
}

impl SurveyForm {
    pub fn build(
        questions: &[Question],
        specs: &[SectionSpec],
        header: HeaderForm,
        answers: &AnswerStore,
    ) -> Self {
        Self {
            instructions: INSTRUCTIONS.to_string(),
            header,
            sections: render_sections(questions, specs, answers),
        }
    }
}
