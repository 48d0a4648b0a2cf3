//! Request handlers.

pub mod analysis;
pub mod health;

pub use analysis::{
    analysis_result, analysis_status, delete_analysis, list_analyses, start_analysis,
};
pub use health::health;
