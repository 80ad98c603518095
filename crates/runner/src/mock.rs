//! Mock 排序模型
//!
//! 用于无网络环境的测试和演练。

use contracts::{ContractError, RankingModel, RankingRequest};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Mock 排序模型
///
/// 对每个 prompt 随机选出 `shortlist_size` 名候选人。随机数种子由
/// 模型种子与 prompt 序号共同决定，因此同一 prompt 集合的结果可复现，
/// 与是否从 checkpoint 恢复无关。
#[derive(Debug, Clone)]
pub struct MockRankingModel {
    name: String,
    seed: u64,
}

impl MockRankingModel {
    /// 创建新的 Mock 模型
    pub fn new(seed: u64) -> Self {
        Self {
            name: "mock-ranker".to_string(),
            seed,
        }
    }

    /// 自定义记录在 run record 中的模型名
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn shortlist(&self, request: &RankingRequest<'_>) -> Vec<usize> {
        let n = request.candidate_count;
        let k = request.shortlist_size.min(n);
        let seed = self.seed ^ (request.sequence as u64).rotate_left(32);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut picked: Vec<usize> = sample(&mut rng, n, k)
            .into_iter()
            .map(|i| i + 1)
            .collect();
        picked.sort_unstable();
        picked
    }
}

impl RankingModel for MockRankingModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rank(&self, request: RankingRequest<'_>) -> Result<String, ContractError> {
        let picked = self.shortlist(&request);
        trace!(scenario_id = %request.scenario_id, ?picked, "mock shortlist");

        let list = picked
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let k = request.shortlist_size;
        Ok(format!(
            "<explanation>Simulated ranking of {} candidates.</explanation>\n<top-{k}>{list}</top-{k}>",
            request.candidate_count
        ))
    }
}
