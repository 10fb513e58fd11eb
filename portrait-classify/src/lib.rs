//! portrait-classify: domain classification strategies
//!
//! Two interchangeable implementations of `DomainClassifier`: a local
//! keyword scorer and an oracle-backed classifier with a content-hash
//! cache and a shared request budget.

pub mod budget;
pub mod factory;
pub mod heuristic;
pub mod oracle;
pub mod response;
pub mod text;

pub use budget::RequestBudget;
pub use factory::{ClassifierStrategy, build_classifier};
pub use heuristic::HeuristicClassifier;
pub use oracle::{
    ClassificationCache, ClassificationStats, DomainOracle, OracleClassifier, OracleError,
    OracleOptions, classification_prompt, content_key,
};
pub use response::parse_oracle_response;
pub use text::DEFAULT_README_CHAR_LIMIT;
