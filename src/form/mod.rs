//! The survey form model: per-type widgets, section grouping and completeness checks.

pub mod render;
pub mod section;
pub mod validate;

pub use render::{render, render_all, RenderContext, RenderedQuestion, Theme, Widget};
pub use section::{
    assemble, render_sections, OrderRange, RenderedSection, Section, SectionSpec, SurveyForm,
    INSTRUCTIONS,
};
pub use validate::{validate, Incomplete, Validation};
