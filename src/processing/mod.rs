//! Text processing and scoring module

pub mod ats_screener;
pub mod embeddings;
pub mod experience;
pub mod pipeline;
pub mod similarity;
pub mod skills;
pub mod text_processor;
pub mod tfidf;

/// Round to two decimal places
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
