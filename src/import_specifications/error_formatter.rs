// ==========================================
// 暂存服务 - 解析错误格式化与分级
// ==========================================
// 职责: 将解析错误转换为客户端载荷，并按类别集合确定 HTTP 级别
// 规则:
//   - 存在 OTHER / FILE_NOT_FOUND 之外的类别 → 400
//   - 否则存在 FILE_NOT_FOUND → 404
//   - 否则 → 500
// 说明: 载荷中的路径经 path_translations 转换为用户可见路径
// ==========================================

use crate::import_specifications::error::{ErrorKind, SpecError, SpecificationSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// 错误分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// 客户端输入问题（400）
    BadRequest,
    /// 仅有文件不存在（404）
    NotFound,
    /// 仅有未预期错误（500）
    InternalServerError,
}

impl ErrorSeverity {
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorSeverity::BadRequest => 400,
            ErrorSeverity::NotFound => 404,
            ErrorSeverity::InternalServerError => 500,
        }
    }
}

/// 客户端错误载荷（按 type 字段区分）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormattedError {
    CannotFindFile {
        message: String,
        file: Option<String>,
    },
    CannotParseFile {
        message: String,
        file: Option<String>,
        tab: Option<String>,
    },
    IncorrectColumnCount {
        message: String,
        file: Option<String>,
        tab: Option<String>,
    },
    MultipleSpecificationsForDataType {
        message: String,
        file_1: Option<String>,
        tab_1: Option<String>,
        file_2: Option<String>,
        tab_2: Option<String>,
    },
    NoFilesProvided,
    UnexpectedError {
        message: String,
        file: Option<String>,
    },
}

/// 分级结果: 级别 + 载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedErrors {
    pub severity: ErrorSeverity,
    pub errors: Vec<FormattedError>,
}

/// 按错误类别集合确定级别
pub fn classify(errors: &[SpecError]) -> ErrorSeverity {
    let kinds: BTreeSet<ErrorKind> = errors.iter().map(|e| e.kind()).collect();

    let client_side = kinds
        .iter()
        .any(|k| !matches!(k, ErrorKind::Other | ErrorKind::FileNotFound));
    if client_side {
        return ErrorSeverity::BadRequest;
    }
    if kinds.contains(&ErrorKind::FileNotFound) {
        return ErrorSeverity::NotFound;
    }
    ErrorSeverity::InternalServerError
}

/// 格式化并分级
pub fn classify_errors(
    errors: &[SpecError],
    path_translations: &HashMap<PathBuf, PathBuf>,
) -> ClassifiedErrors {
    ClassifiedErrors {
        severity: classify(errors),
        errors: format_import_spec_errors(errors, path_translations),
    }
}

/// 将解析错误转换为客户端载荷（顺序与输入一致）
///
/// # 参数
/// - path_translations: 服务端路径 -> 用户可见路径；未登记的路径原样输出
pub fn format_import_spec_errors(
    errors: &[SpecError],
    path_translations: &HashMap<PathBuf, PathBuf>,
) -> Vec<FormattedError> {
    errors
        .iter()
        .map(|e| format_error(e, path_translations))
        .collect()
}

fn format_error(err: &SpecError, translations: &HashMap<PathBuf, PathBuf>) -> FormattedError {
    let file_of = |src: Option<&SpecificationSource>| src.map(|s| translate(&s.file, translations));
    let tab_of = |src: Option<&SpecificationSource>| src.and_then(|s| s.tab.clone());
    let message = err.message().unwrap_or_default().to_string();

    match err.kind() {
        ErrorKind::FileNotFound => {
            let file = file_of(err.source_1());
            FormattedError::CannotFindFile {
                message: format!("Cannot find file {}", file.as_deref().unwrap_or_default()),
                file,
            }
        }
        // 不支持的类型对客户端而言同属无法解析
        ErrorKind::ParseFail | ErrorKind::UnsupportedType => FormattedError::CannotParseFile {
            message,
            file: file_of(err.source_1()),
            tab: tab_of(err.source_1()),
        },
        ErrorKind::IncorrectColumnCount => FormattedError::IncorrectColumnCount {
            message,
            file: file_of(err.source_1()),
            tab: tab_of(err.source_1()),
        },
        ErrorKind::MultipleSpecificationsForDataType => {
            FormattedError::MultipleSpecificationsForDataType {
                message,
                file_1: file_of(err.source_1()),
                tab_1: tab_of(err.source_1()),
                file_2: file_of(err.source_2()),
                tab_2: tab_of(err.source_2()),
            }
        }
        ErrorKind::NoFilesProvided => FormattedError::NoFilesProvided,
        ErrorKind::Other => FormattedError::UnexpectedError {
            message,
            file: file_of(err.source_1()),
        },
    }
}

fn translate(path: &Path, translations: &HashMap<PathBuf, PathBuf>) -> String {
    translations
        .get(path)
        .map(PathBuf::as_path)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
