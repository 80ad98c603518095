//! Runner 错误类型

use artifacts::ArtifactError;
use contracts::ContractError;
use thiserror::Error;

/// Runner 错误
#[derive(Debug, Error)]
pub enum RunnerError {
    /// 环境变量中没有可用的 API key
    #[error("no API keys found in environment variable {env}")]
    MissingApiKeys {
        /// 环境变量名
        env: String,
    },

    /// HTTP 客户端构建失败
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// 错误消息
        message: String,
    },

    /// prompt 引用了 persona 集合中不存在的 persona
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// run log / checkpoint 读写失败
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Runner Result 类型别名
pub type Result<T> = std::result::Result<T, RunnerError>;
