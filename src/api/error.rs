// ==========================================
// 暂存服务 - API 层错误类型
// ==========================================
// 职责: 定义 API 层错误类型，统一映射为 HTTP 状态码与响应体
// 说明: 响应消息面向客户端，保持英文
// ==========================================

use crate::import_specifications::{ClassifiedErrors, WriteError};
use serde_json::json;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 客户端输入错误
    // ==========================================
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    /// 路径越出用户暂存区
    #[error("{0}")]
    Forbidden(String),

    // ==========================================
    // 导入规范错误
    // ==========================================
    /// 解析错误列表，状态码由错误分级决定
    #[error("import specification errors ({} error(s))", .0.errors.len())]
    ImportSpecification(ClassifiedErrors),

    #[error(transparent)]
    Write(#[from] WriteError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP 状态码
    pub fn http_status(&self) -> u16 {
        match self {
            ApiError::InvalidInput(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Forbidden(_) => 403,
            ApiError::ImportSpecification(classified) => classified.severity.http_status(),
            ApiError::Write(WriteError::InvalidSpecification(_))
            | ApiError::Write(WriteError::MissingDirectory(_)) => 400,
            ApiError::Write(_) => 500,
            ApiError::InternalError(_) | ApiError::Other(_) => 500,
        }
    }

    /// 响应体
    ///
    /// - 导入规范错误: {"errors": [...]}
    /// - 其他: {"error": "<message>"}
    pub fn body(&self) -> serde_json::Value {
        match self {
            ApiError::ImportSpecification(classified) => json!({ "errors": classified.errors }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
