//! Pre-flight cost guard.
//!
//! Evaluated once per run over the size of the *new* partition, before any
//! summarization or rendering work. The estimate assumes a fixed token count
//! per article and the per-thousand-token price of the selected model's tier.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CostBudget, PriceTier, TokenCost, TokenCount};

/// Tokens assumed per summarized article.
pub const ASSUMED_TOKENS_PER_ARTICLE: TokenCount = TokenCount::new(800);

/// Outcome of the cost guard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostDecision {
    pub estimate: TokenCost,
    pub proceed: bool,
}

/// Decides whether a batch of `candidate_count` articles may be summarized.
///
/// `estimate = candidate_count × tokens_per_article × price_per_thousand / 1000`;
/// the run may proceed unless the estimate strictly exceeds `ceiling`.
pub fn should_proceed(
    candidate_count: usize,
    tokens_per_article: TokenCount,
    price_per_thousand: f64,
    ceiling: CostBudget,
) -> CostDecision {
    let raw = candidate_count as f64 * tokens_per_article.as_u64() as f64 * price_per_thousand
        / 1000.0;
    let (estimate, proceed) = match TokenCost::new(raw) {
        Some(estimate) => (estimate, !ceiling.is_exceeded_by(estimate)),
        // Only a negative or non-finite configured price gets here.
        None => (TokenCost::zero(), false),
    };

    debug!(
        candidate_count,
        tokens_per_article = tokens_per_article.as_u64(),
        price_per_thousand,
        estimate = estimate.as_f64(),
        ceiling = ceiling.as_f64(),
        proceed,
        "Cost guard evaluated"
    );

    CostDecision { estimate, proceed }
}

/// Cost guard bound to a run's ceiling and per-article token assumption.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostGuard {
    pub ceiling: CostBudget,
    pub tokens_per_article: TokenCount,
}

impl CostGuard {
    pub fn new(ceiling: CostBudget, tokens_per_article: TokenCount) -> Self {
        Self {
            ceiling,
            tokens_per_article,
        }
    }

    pub fn evaluate(&self, candidate_count: usize, tier: PriceTier) -> CostDecision {
        should_proceed(
            candidate_count,
            self.tokens_per_article,
            tier.per_thousand_tokens(),
            self.ceiling,
        )
    }
}
