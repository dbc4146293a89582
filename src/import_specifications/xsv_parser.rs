// ==========================================
// 暂存服务 - CSV / TSV 导入规范解析器
// ==========================================
// 格式: 第 1 行数据类型表头，第 2 行参数 ID，第 3 行显示名称，第 4 行起为数据
// 说明: 引号转义交由 csv 库处理；空行跳过
// ==========================================

use crate::import_specifications::error::{ParseFailure, SpecError, SpecificationSource};
use crate::import_specifications::format::ImportSpecParser;
use crate::import_specifications::header::{column_count_error, normalize_headers, parse_header};
use crate::import_specifications::types::{CellValue, ParseResult, ParseResults, Row};
use anyhow::Context;
use csv::{ReaderBuilder, StringRecord, StringRecordsIter};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// 分隔符文本解析器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XsvParser {
    delimiter: u8,
}

impl XsvParser {
    pub const CSV: XsvParser = XsvParser { delimiter: b',' };
    pub const TSV: XsvParser = XsvParser { delimiter: b'\t' };

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl ImportSpecParser for XsvParser {
    fn parse(&self, path: &Path) -> anyhow::Result<ParseResults> {
        let source = SpecificationSource::new(path);

        // 检查文件存在
        match fs::metadata(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(ParseResults::error(SpecError::file_not_found(source)));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("无法读取文件信息: {}", path.display()));
            }
            Ok(meta) if meta.is_dir() => {
                return Ok(ParseResults::error(SpecError::parse_fail(
                    "The given path is a directory",
                    source,
                )));
            }
            Ok(_) => {}
        }

        let file =
            File::open(path).with_context(|| format!("无法打开文件: {}", path.display()))?;

        match read_specification(file, self.delimiter, &source) {
            Ok((datatype, rows)) => {
                debug!(file = %path.display(), datatype = %datatype, rows = rows.len(), "分隔符文件解析完成");
                Ok(ParseResults::single(datatype, ParseResult::new(source, rows)))
            }
            Err(ParseFailure::Spec(e)) => Ok(ParseResults::error(e)),
            Err(ParseFailure::Fault(e)) => Err(e),
        }
    }
}

/// 从读取器解析单个数据类型
fn read_specification<R: Read>(
    input: R,
    delimiter: u8,
    source: &SpecificationSource,
) -> Result<(String, Vec<Row>), ParseFailure> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // 列数由表头声明校验
        .delimiter(delimiter)
        .from_reader(input);
    let mut records = reader.records();

    // 第 1 行: 数据类型 / 列数 / 版本
    let first = next_line(&mut records, source, "Missing data type / version header")?;
    let header = parse_header(first.get(0).unwrap_or(""), source)?;

    // 第 2 行: 参数 ID
    let ids = next_line(&mut records, source, "Missing 2nd header line")?;
    check_columns(&ids, 2, header.columns, source)?;
    let raw_ids: Vec<Option<String>> = ids.iter().map(|s| Some(s.to_string())).collect();
    let param_ids = normalize_headers(&raw_ids, 2, source)?;

    // 第 3 行: 显示名称（仅校验列数）
    let names = next_line(&mut records, source, "Missing 3rd header line")?;
    check_columns(&names, 3, header.columns, source)?;

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| csv_failure(e, source))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 4);
        check_columns(&record, line, header.columns, source)?;

        let row: Row = param_ids
            .iter()
            .cloned()
            .zip(record.iter().map(CellValue::from_text))
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(SpecError::parse_fail("No non-header data in file", source.clone()).into());
    }

    Ok((header.datatype, rows))
}

fn next_line<R: Read>(
    records: &mut StringRecordsIter<'_, R>,
    source: &SpecificationSource,
    missing: &str,
) -> Result<StringRecord, ParseFailure> {
    match records.next() {
        Some(Ok(record)) => Ok(record),
        Some(Err(e)) => Err(csv_failure(e, source)),
        None => Err(SpecError::parse_fail(missing, source.clone()).into()),
    }
}

fn check_columns(
    record: &StringRecord,
    line_number: usize,
    expected: usize,
    source: &SpecificationSource,
) -> Result<(), SpecError> {
    if record.len() != expected {
        return Err(column_count_error(line_number, expected, record.len(), source));
    }
    Ok(())
}

// 非 UTF-8 内容视为非文本文件，其余读取错误为未预期故障
fn csv_failure(err: csv::Error, source: &SpecificationSource) -> ParseFailure {
    match err.kind() {
        csv::ErrorKind::Utf8 { .. } => {
            SpecError::parse_fail("Not a text file", source.clone()).into()
        }
        _ => ParseFailure::Fault(anyhow::Error::new(err).context(format!(
            "读取分隔符文件失败: {}",
            source.file.display()
        ))),
    }
}
