// ==========================================
// 暂存服务 - 导入规范错误类型
// ==========================================
// 职责: 解析错误分类（值类型，随结果返回）与写出错误
// 工具: thiserror 派生宏
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 解析错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// 输入路径不存在
    FileNotFound,
    /// 结构非法（表头错误、空文件等）
    ParseFail,
    /// 扩展名不在导入规范格式之列
    UnsupportedType,
    /// 行的列数与表头声明不一致
    IncorrectColumnCount,
    /// 同一数据类型出现在多个来源中
    MultipleSpecificationsForDataType,
    /// 未提供任何文件
    NoFilesProvided,
    /// 未预期的错误（已记录日志）
    Other,
}

/// 数据块来源: 文件 + 可选工作表名（仅 Excel）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpecificationSource {
    pub file: PathBuf,
    pub tab: Option<String>,
}

impl SpecificationSource {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            tab: None,
        }
    }

    pub fn with_tab(file: impl Into<PathBuf>, tab: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            tab: Some(tab.into()),
        }
    }
}

impl fmt::Display for SpecificationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tab {
            Some(tab) => write!(f, "{} [{}]", self.file.display(), tab),
            None => write!(f, "{}", self.file.display()),
        }
    }
}

/// 解析错误
///
/// 各类别所需字段由构造函数保证:
/// - FileNotFound: 仅 source_1
/// - ParseFail / UnsupportedType / IncorrectColumnCount: message + source_1
/// - MultipleSpecificationsForDataType: message + source_1 + source_2
/// - NoFilesProvided: 无附加字段
/// - Other: message，source_1 可选
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecError {
    kind: ErrorKind,
    message: Option<String>,
    source_1: Option<SpecificationSource>,
    source_2: Option<SpecificationSource>,
}

impl SpecError {
    pub fn file_not_found(source: SpecificationSource) -> Self {
        Self {
            kind: ErrorKind::FileNotFound,
            message: None,
            source_1: Some(source),
            source_2: None,
        }
    }

    pub fn parse_fail(message: impl Into<String>, source: SpecificationSource) -> Self {
        Self::with_message(ErrorKind::ParseFail, message, source)
    }

    pub fn unsupported_type(extension: &str, source: SpecificationSource) -> Self {
        Self::with_message(
            ErrorKind::UnsupportedType,
            format!(
                "{} is not a supported file type for import specifications",
                extension
            ),
            source,
        )
    }

    pub fn incorrect_column_count(message: impl Into<String>, source: SpecificationSource) -> Self {
        Self::with_message(ErrorKind::IncorrectColumnCount, message, source)
    }

    pub fn multiple_specifications(
        message: impl Into<String>,
        first: SpecificationSource,
        second: SpecificationSource,
    ) -> Self {
        Self {
            kind: ErrorKind::MultipleSpecificationsForDataType,
            message: Some(message.into()),
            source_1: Some(first),
            source_2: Some(second),
        }
    }

    pub fn no_files_provided() -> Self {
        Self {
            kind: ErrorKind::NoFilesProvided,
            message: None,
            source_1: None,
            source_2: None,
        }
    }

    pub fn other(message: impl Into<String>, source: Option<SpecificationSource>) -> Self {
        Self {
            kind: ErrorKind::Other,
            message: Some(message.into()),
            source_1: source,
            source_2: None,
        }
    }

    fn with_message(
        kind: ErrorKind,
        message: impl Into<String>,
        source: SpecificationSource,
    ) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            source_1: Some(source),
            source_2: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn source_1(&self) -> Option<&SpecificationSource> {
        self.source_1.as_ref()
    }

    pub fn source_2(&self) -> Option<&SpecificationSource> {
        self.source_2.as_ref()
    }

    /// 错误涉及的首个文件
    pub fn file(&self) -> Option<&Path> {
        self.source_1.as_ref().map(|s| s.file.as_path())
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(source) = &self.source_1 {
            write!(f, " ({})", source)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

// ==========================================
// 解析器内部失败
// ==========================================

/// 解析器内部失败: 可预期的结构错误或未预期的故障
///
/// 可预期错误作为解析结果返回，故障交由分派层记录并归类为 OTHER
#[derive(Debug)]
pub(crate) enum ParseFailure {
    Spec(SpecError),
    Fault(anyhow::Error),
}

impl From<SpecError> for ParseFailure {
    fn from(err: SpecError) -> Self {
        ParseFailure::Spec(err)
    }
}

impl From<anyhow::Error> for ParseFailure {
    fn from(err: anyhow::Error) -> Self {
        ParseFailure::Fault(err)
    }
}

// ==========================================
// 模板写出错误
// ==========================================

/// 模板写出错误，消息直接返回给调用方
#[derive(Error, Debug)]
pub enum WriteError {
    /// 输入规范不合法（写出任何文件之前检出）
    #[error("{0}")]
    InvalidSpecification(String),

    #[error("The output directory {0} does not exist or is not a directory")]
    MissingDirectory(PathBuf),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render delimited template: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write Excel template: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
}

impl WriteError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        WriteError::InvalidSpecification(message.into())
    }
}

/// Result 类型别名
pub type WriteResult<T> = Result<T, WriteError>;
