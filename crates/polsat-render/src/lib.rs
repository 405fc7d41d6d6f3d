//! Rendering utilities for human-facing surfaces (Markdown, log text).

#![forbid(unsafe_code)]

mod markdown;
mod model;

pub use markdown::render_markdown;
pub use model::{
    RenderableClause, RenderableError, RenderableFact, RenderableReport, RenderableRequest,
    RenderableVerdict,
};
