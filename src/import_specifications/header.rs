// ==========================================
// 暂存服务 - 导入规范表头
// ==========================================
// 格式: "Data type: <data_type>; Columns: <column count>; Version: <version>"
// 第 2 行为参数 ID，第 3 行为显示名称
// ==========================================

use crate::import_specifications::error::{SpecError, SpecificationSource};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// 当前写出与可处理的最高版本
pub const SPEC_VERSION: u32 = 1;

const EXPECTED_HEADER: &str = "Data type: <data_type>; Columns: <column count>; Version: <version>";

fn header_regex() -> &'static Regex {
    static HEADER_REGEX: OnceLock<Regex> = OnceLock::new();
    HEADER_REGEX.get_or_init(|| {
        Regex::new(r"^Data type: (\w+); Columns: (\d+); Version: (\d+)$")
            .unwrap_or_else(|e| panic!("invalid header regex: {}", e))
    })
}

fn datatype_regex() -> &'static Regex {
    static DATATYPE_REGEX: OnceLock<Regex> = OnceLock::new();
    DATATYPE_REGEX.get_or_init(|| {
        Regex::new(r"^\w+$").unwrap_or_else(|e| panic!("invalid datatype regex: {}", e))
    })
}

/// 数据类型能否写入首行表头并被再次解析（与表头格式中的 \w+ 一致）
pub fn is_valid_datatype(datatype: &str) -> bool {
    datatype_regex().is_match(datatype)
}

/// 解析出的首行表头
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecHeader {
    pub datatype: String,
    pub columns: usize,
}

/// 生成首行表头
pub fn format_header(datatype: &str, columns: usize) -> String {
    format!(
        "Data type: {}; Columns: {}; Version: {}",
        datatype, columns, SPEC_VERSION
    )
}

/// 解析首行表头
///
/// # 返回
/// - Ok(SpecHeader): 数据类型与列数
/// - Err(SpecError): 格式不符或版本高于可处理版本（PARSE_FAIL）
pub fn parse_header(header: &str, source: &SpecificationSource) -> Result<SpecHeader, SpecError> {
    let invalid = || {
        SpecError::parse_fail(
            format!(
                r#"Invalid header; got "{}", expected "{}""#,
                header, EXPECTED_HEADER
            ),
            source.clone(),
        )
    };

    let caps = header_regex().captures(header).ok_or_else(invalid)?;
    let columns: usize = caps[2].parse().map_err(|_| invalid())?;
    let version: u32 = caps[3].parse().map_err(|_| invalid())?;

    if version > SPEC_VERSION {
        return Err(SpecError::parse_fail(
            format!(
                "Schema version {} is larger than maximum processable version {}",
                version, SPEC_VERSION
            ),
            source.clone(),
        ));
    }

    Ok(SpecHeader {
        datatype: caps[1].to_string(),
        columns,
    })
}

/// 规范化参数 ID 行: 去除空白，不允许空项与重复项
///
/// # 参数
/// - headers: 原始表头单元格（None 表示空单元格）
/// - line_number: 行号（用于错误信息）
pub fn normalize_headers(
    headers: &[Option<String>],
    line_number: usize,
    source: &SpecificationSource,
) -> Result<Vec<String>, SpecError> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());

    for (i, raw) in headers.iter().enumerate() {
        let name = raw.as_deref().map(str::trim).unwrap_or("");
        if name.is_empty() {
            return Err(SpecError::parse_fail(
                format!(
                    "Missing header entry in row {}, position {}",
                    line_number,
                    i + 1
                ),
                source.clone(),
            ));
        }
        if !seen.insert(name.to_string()) {
            return Err(SpecError::parse_fail(
                format!("Duplicate header name in row {}: {}", line_number, name),
                source.clone(),
            ));
        }
        names.push(name.to_string());
    }

    Ok(names)
}

/// 列数错误
pub fn column_count_error(
    line_number: usize,
    expected: usize,
    actual: usize,
    source: &SpecificationSource,
) -> SpecError {
    SpecError::incorrect_column_count(
        format!(
            "Incorrect number of items in line {}, expected {}, got {}",
            line_number, expected, actual
        ),
        source.clone(),
    )
}
