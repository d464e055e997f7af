//! Context budgeting.
//!
//! Keeps the longest leading run of passages whose token counts fit the
//! prompt budget, trimming from the back so the most relevant passages
//! (the front of the list) survive. Passages are never reordered or cut.
//!
//! Input must already be in relevance order; this module does not sort.

use sift_core::completion::TokenCounter;
use sift_core::error::BackendError;
use sift_core::passage::Passage;
use tracing::debug;

/// Tokens held back on top of the completion reservation.
pub const SAFETY_MARGIN: i64 = 10;

/// How much of the model's context window the passages may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBudget {
    pub max_total_tokens: i64,
    pub reserved_for_completion: i64,
    pub safety_margin: i64,
}

impl PromptBudget {
    pub fn new(max_total_tokens: i64, reserved_for_completion: i64) -> Self {
        Self {
            max_total_tokens,
            reserved_for_completion,
            safety_margin: SAFETY_MARGIN,
        }
    }

    /// Tokens left for context. Never negative.
    pub fn available(&self) -> i64 {
        (self.max_total_tokens - self.reserved_for_completion - self.safety_margin).max(0)
    }
}

/// Length of the longest prefix of `counts` whose sum is `<= budget`.
///
/// Starts from the full list and drops trailing entries while over budget.
pub fn longest_fitting_prefix(budget: i64, counts: &[usize]) -> usize {
    if budget <= 0 {
        return 0;
    }

    let mut kept = counts.len();
    let mut total: i64 = counts.iter().map(|&c| c as i64).sum();
    while total > budget && kept > 0 {
        kept -= 1;
        total -= counts[kept] as i64;
    }
    kept
}

/// Select the passages that fit in `budget` tokens, preserving order.
///
/// Each passage body is counted through `counter`, which may be a network
/// call per passage. With a non-positive budget nothing is counted.
pub async fn select_within_budget<C>(
    budget: i64,
    passages: &[Passage],
    counter: &C,
) -> Result<Vec<Passage>, BackendError>
where
    C: TokenCounter + ?Sized,
{
    if budget <= 0 || passages.is_empty() {
        return Ok(Vec::new());
    }

    let mut counts = Vec::with_capacity(passages.len());
    for passage in passages {
        counts.push(counter.count_tokens(&passage.body).await?);
    }

    let kept = longest_fitting_prefix(budget, &counts);
    debug!(
        budget,
        candidates = passages.len(),
        kept,
        tokens = counts[..kept].iter().sum::<usize>(),
        "Context budget applied"
    );

    Ok(passages[..kept].to_vec())
}
