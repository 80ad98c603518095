//! 模型调用指标收集模块
//!
//! 记录每次模型调用的结果、重试与延迟，并在内存中聚合运行摘要。

use contracts::Role;
use metrics::{counter, gauge, histogram};

/// 单次模型调用（一次 attempt）的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// 返回可解析的 shortlist
    Success,
    /// 返回了文本，但不符合 shortlist 语法
    Unparseable,
    /// HTTP 429
    RateLimited,
    /// 请求超时
    Timeout,
    /// 其他 API / 传输错误
    Error,
}

impl CallOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CallOutcome::Success => "success",
            CallOutcome::Unparseable => "unparseable",
            CallOutcome::RateLimited => "rate_limited",
            CallOutcome::Timeout => "timeout",
            CallOutcome::Error => "error",
        }
    }
}

/// 记录一次模型调用
pub fn record_model_call(role: Role, outcome: CallOutcome, latency_ms: f64) {
    counter!(
        "resume_audit_model_calls_total",
        "role" => role.key(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!("resume_audit_model_latency_ms", "role" => role.key()).record(latency_ms);
}

/// 记录一次重试
pub fn record_retry(role: Role, attempt: u32) {
    counter!("resume_audit_model_retries_total", "role" => role.key()).increment(1);
    gauge!("resume_audit_model_last_retry_attempt", "role" => role.key()).set(f64::from(attempt));
}

/// 记录重试耗尽后的最终失败
pub fn record_terminal_failure(role: Role) {
    counter!("resume_audit_prompts_failed_total", "role" => role.key()).increment(1);
}

/// 记录最终写入 run log 的响应是否可解析
pub fn record_parse_outcome(role: Role, parsed: bool) {
    let status = if parsed { "parsed" } else { "unparseable" };
    counter!(
        "resume_audit_responses_total",
        "role" => role.key(),
        "status" => status
    )
    .increment(1);
}

/// 记录运行进度
pub fn record_run_progress(role: Role, done: usize, total: usize) {
    gauge!("resume_audit_prompts_done", "role" => role.key()).set(done as f64);
    gauge!("resume_audit_prompts_planned", "role" => role.key()).set(total as f64);
}

/// 模型运行聚合器
///
/// 在内存中聚合一次 `run` 的指标，结束时输出摘要。
#[derive(Debug, Clone)]
pub struct RunStatsAggregator {
    pub role: Role,

    /// 计划处理的 prompt 数
    pub planned: u64,

    /// 因 checkpoint 跳过的 prompt 数
    pub resumed_from: u64,

    /// 写入 run log 的 prompt 数
    pub completed: u64,

    /// 已写入但仍不可解析的响应数
    pub unparseable: u64,

    /// 重试耗尽、写入 failure log 的 prompt 数
    pub failed: u64,

    /// 全部 attempt 数
    pub calls: u64,

    /// 429 次数
    pub rate_limited: u64,

    /// 每次调用延迟 (ms)
    pub latency_ms: RunningStats,

    /// 每个 prompt 消耗的 attempt 数
    pub attempts: RunningStats,
}

impl RunStatsAggregator {
    /// 创建新的聚合器
    pub fn new(role: Role, planned: usize) -> Self {
        Self {
            role,
            planned: planned as u64,
            resumed_from: 0,
            completed: 0,
            unparseable: 0,
            failed: 0,
            calls: 0,
            rate_limited: 0,
            latency_ms: RunningStats::default(),
            attempts: RunningStats::default(),
        }
    }

    /// 从 checkpoint 恢复
    pub fn record_resumed(&mut self, done: usize) {
        self.resumed_from = done as u64;
    }

    /// 每次 attempt 调用
    pub fn record_call(&mut self, outcome: CallOutcome, latency_ms: f64) {
        self.calls += 1;
        if outcome == CallOutcome::RateLimited {
            self.rate_limited += 1;
        }
        self.latency_ms.push(latency_ms);
        record_model_call(self.role, outcome, latency_ms);
    }

    /// prompt 完成并写入 run log
    pub fn record_completed(&mut self, attempts: u32, parsed: bool) {
        self.completed += 1;
        if !parsed {
            self.unparseable += 1;
        }
        self.attempts.push(f64::from(attempts));
        record_parse_outcome(self.role, parsed);
    }

    /// prompt 最终失败
    pub fn record_failed(&mut self, attempts: u32) {
        self.failed += 1;
        self.attempts.push(f64::from(attempts));
        record_terminal_failure(self.role);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> RunSummary {
        let processed = self.completed + self.failed;
        RunSummary {
            role: self.role,
            planned: self.planned,
            resumed_from: self.resumed_from,
            completed: self.completed,
            unparseable: self.unparseable,
            failed: self.failed,
            calls: self.calls,
            rate_limited: self.rate_limited,
            failure_rate: if processed > 0 {
                self.failed as f64 / processed as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_ms),
            attempts: StatsSummary::from(&self.attempts),
        }
    }
}

/// 运行摘要
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub role: Role,
    pub planned: u64,
    pub resumed_from: u64,
    pub completed: u64,
    pub unparseable: u64,
    pub failed: u64,
    pub calls: u64,
    pub rate_limited: u64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub attempts: StatsSummary,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Model Run Summary ({}) ===", self.role)?;
        writeln!(f, "Planned prompts: {}", self.planned)?;
        if self.resumed_from > 0 {
            writeln!(f, "Resumed after: {}", self.resumed_from)?;
        }
        writeln!(
            f,
            "Completed: {} ({} unparseable)",
            self.completed, self.unparseable
        )?;
        writeln!(f, "Failed: {} ({:.2}%)", self.failed, self.failure_rate)?;
        writeln!(
            f,
            "Model calls: {} ({} rate limited)",
            self.calls, self.rate_limited
        )?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;
        writeln!(f, "Attempts per prompt: {}", self.attempts)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
