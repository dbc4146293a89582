// ==========================================
// 暂存服务 - 配置错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 启动阶段的配置错误均为致命错误
// ==========================================

use crate::autodetect::type_mapping_table::TableBuildError;
use std::path::PathBuf;
use thiserror::Error;

/// 配置模块错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("缺少配置项: {0}")]
    MissingValue(&'static str),

    #[error("配置文件读取失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件格式错误 ({path}): {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("映射表构建失败: {0}")]
    MappingTable(#[from] TableBuildError),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
