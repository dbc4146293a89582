// ==========================================
// 暂存服务 - 批量导入规范
// ==========================================
// 职责: 导入规范文件（CSV / TSV / Excel）的解析、错误分级与模板写出
// 流程: 类型解析 → 逐文件解析 → 合并 → 错误格式化
// ==========================================

// 模块声明
pub mod dispatch;
pub mod error;
pub mod error_formatter;
pub mod excel_parser;
pub mod excel_writer;
pub mod format;
pub mod header;
pub mod resolver;
pub mod types;
pub mod validation;
pub mod xsv_parser;
pub mod xsv_writer;

// 重导出核心类型
pub use dispatch::{
    log_unexpected_error, parse_import_specifications, parse_import_specifications_concurrently,
    ErrorLogger,
};
pub use error::{ErrorKind, SpecError, SpecificationSource, WriteError, WriteResult};
pub use error_formatter::{
    classify, classify_errors, format_import_spec_errors, ClassifiedErrors, ErrorSeverity,
    FormattedError,
};
pub use excel_writer::EXCEL_FILE_NAME;
pub use format::{ImportSpecParser, ImportSpecWriter, SpecFormat, UnknownFormat};
pub use resolver::{FileTypeResolution, FileTypeResolver, MappingFileTypeResolver};
pub use types::{CellValue, ParseResult, ParseResults, Row, TemplateSpec, TemplateSpecs};
pub use validation::{check_import_specification, check_write_specification};

use std::collections::BTreeMap;
use std::path::Path;

/// 写出导入规范模板
///
/// # 参数
/// - folder: 已存在的输出目录
/// - format: 输出格式
/// - types: 数据类型 -> 模板规范
///
/// # 返回
/// - Ok(map): 数据类型 -> 输出文件名（相对 folder）
/// - Err(WriteError): 校验失败时不写出任何文件
pub fn write_import_specification(
    folder: &Path,
    format: SpecFormat,
    types: &TemplateSpecs,
) -> WriteResult<BTreeMap<String, String>> {
    format.write(folder, types)
}
