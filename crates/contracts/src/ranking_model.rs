//! RankingModel trait - model runner input interface
//!
//! Abstracts the hosted ranking model so the runner loop works the same with
//! the HTTP client and with offline models.

use crate::ContractError;

/// One ranking request
#[derive(Debug, Clone, Copy)]
pub struct RankingRequest<'a> {
    pub scenario_id: &'a str,
    pub prompt: &'a str,
    /// 1-based position in the role's prompt set (drives key rotation)
    pub sequence: usize,
    pub candidate_count: usize,
    pub shortlist_size: usize,
}

/// Hosted or simulated ranking model
#[trait_variant::make(RankingModel: Send)]
pub trait LocalRankingModel {
    /// Model name recorded in run records
    fn name(&self) -> &str;

    /// Submit one prompt and return the raw response text
    ///
    /// # Errors
    /// Transport, timeout, status and body errors. The caller decides whether
    /// to retry via [`ContractError::is_retryable`].
    async fn rank(&self, request: RankingRequest<'_>) -> Result<String, ContractError>;
}
