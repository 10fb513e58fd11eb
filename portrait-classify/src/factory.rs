use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use portrait_core::domain::DomainClassifier;

use crate::budget::RequestBudget;
use crate::heuristic::HeuristicClassifier;
use crate::oracle::{ClassificationCache, DomainOracle, OracleClassifier, OracleOptions};

/// Which classifier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierStrategy {
    #[default]
    Heuristic,
    Oracle,
}

impl FromStr for ClassifierStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" | "keywords" | "local" => Ok(ClassifierStrategy::Heuristic),
            "oracle" | "llm" => Ok(ClassifierStrategy::Oracle),
            other => Err(format!("unknown classifier strategy: {other}")),
        }
    }
}

/// Build the configured classifier. Asking for the oracle strategy
/// without an oracle (no credentials) falls back to the heuristic.
pub fn build_classifier(
    strategy: ClassifierStrategy,
    oracle: Option<Box<dyn DomainOracle>>,
    budget: Arc<RequestBudget>,
    cache: Arc<ClassificationCache>,
    options: OracleOptions,
) -> Box<dyn DomainClassifier> {
    match (strategy, oracle) {
        (ClassifierStrategy::Oracle, Some(oracle)) => {
            Box::new(OracleClassifier::with_options(oracle, budget, cache, options))
        }
        (ClassifierStrategy::Oracle, None) => {
            warn!("oracle strategy selected but no oracle is configured; using keyword heuristic");
            Box::new(HeuristicClassifier::new(options.readme_char_limit))
        }
        (ClassifierStrategy::Heuristic, _) => Box::new(HeuristicClassifier::new(options.readme_char_limit)),
    }
}
