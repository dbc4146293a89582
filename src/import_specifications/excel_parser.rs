// ==========================================
// 暂存服务 - Excel 导入规范解析器
// ==========================================
// 规则: 每个工作表承载一个数据类型；少于 4 行的工作表忽略
// 说明: 超出声明列数的尾部空单元格被截去，全空数据行跳过
// ==========================================

use crate::import_specifications::error::{SpecError, SpecificationSource};
use crate::import_specifications::format::ImportSpecParser;
use crate::import_specifications::header::{
    column_count_error, normalize_headers, parse_header, SpecHeader,
};
use crate::import_specifications::types::{CellValue, ParseResult, ParseResults, Row};
use anyhow::Context;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

// 表头 3 行 + 至少 1 行数据
const MIN_ROWS: usize = 4;

static EMPTY: Data = Data::Empty;

/// Excel 工作簿解析器
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelParser;

impl ImportSpecParser for ExcelParser {
    fn parse(&self, path: &Path) -> anyhow::Result<ParseResults> {
        let source = SpecificationSource::new(path);

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

        let mut workbook = match open_workbook_auto(path) {
            Ok(wb) => wb,
            Err(e) => {
                debug!(file = %path.display(), error = %e, "无法打开工作簿");
                return Ok(ParseResults::error(SpecError::parse_fail(
                    "Not a supported Excel file type",
                    source,
                )));
            }
        };

        let mut results: BTreeMap<String, ParseResult> = BTreeMap::new();
        let mut datatype_tabs: HashMap<String, String> = HashMap::new();
        let mut errors = Vec::new();

        for tab in workbook.sheet_names() {
            let tab_source = SpecificationSource::with_tab(path, tab.as_str());
            let range = match workbook.worksheet_range(&tab) {
                Ok(range) => range,
                Err(e) => {
                    warn!(file = %path.display(), tab = %tab, error = %e, "工作表读取失败");
                    errors.push(SpecError::parse_fail(
                        format!("Unable to read tab {}: {}", tab, e),
                        tab_source,
                    ));
                    continue;
                }
            };

            match process_tab(&range, &tab_source) {
                Ok(None) => {
                    debug!(file = %path.display(), tab = %tab, "工作表无数据，已跳过");
                }
                Ok(Some((datatype, rows))) => match datatype_tabs.get(&datatype) {
                    Some(first_tab) => errors.push(SpecError::multiple_specifications(
                        format!("Found datatype {} in multiple tabs", datatype),
                        SpecificationSource::with_tab(path, first_tab.as_str()),
                        tab_source,
                    )),
                    None => {
                        datatype_tabs.insert(datatype.clone(), tab.clone());
                        results.insert(datatype, ParseResult::new(tab_source, rows));
                    }
                },
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return Ok(ParseResults::Errors(errors));
        }
        if results.is_empty() {
            return Ok(ParseResults::error(SpecError::parse_fail(
                "No non-header data in file",
                source,
            )));
        }

        debug!(file = %path.display(), datatypes = results.len(), "工作簿解析完成");
        Ok(ParseResults::Results(results))
    }
}

/// 解析单个工作表
///
/// # 返回
/// - Ok(Some((数据类型, 行))): 有数据的工作表
/// - Ok(None): 行数不足或无非空数据行
/// - Err(SpecError): 表头或列数错误
fn process_tab(
    range: &Range<Data>,
    source: &SpecificationSource,
) -> Result<Option<(String, Vec<Row>)>, SpecError> {
    // 使用绝对坐标，工作表可能不从 A1 开始
    let Some((end_row, end_col)) = range.end() else {
        return Ok(None);
    };
    let total_rows = end_row as usize + 1;
    let total_cols = end_col as usize + 1;
    if total_rows < MIN_ROWS {
        return Ok(None);
    }

    let SpecHeader { datatype, columns } = parse_header(&header_text(cell(range, 0, 0)), source)?;

    let ids = row_cells(range, 1, total_cols, columns, source)?;
    let raw_ids: Vec<Option<String>> = ids.iter().map(|c| header_cell(c)).collect();
    let param_ids = normalize_headers(&raw_ids, 2, source)?;

    row_cells(range, 2, total_cols, columns, source)?;

    let mut rows = Vec::new();
    for r in 3..total_rows {
        let cells = row_cells(range, r, total_cols, columns, source)?;
        if cells.iter().all(|c| is_empty(c)) {
            continue;
        }
        let row: Row = param_ids
            .iter()
            .cloned()
            .zip(cells.iter().map(|c| cell_value(c)))
            .collect();
        rows.push(row);
    }

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some((datatype, rows)))
}

fn cell(range: &Range<Data>, row: usize, col: usize) -> &Data {
    range
        .get_value((row as u32, col as u32))
        .unwrap_or(&EMPTY)
}

/// 读取一行并对齐到声明列数
///
/// 尾部多余的空单元格截去；多余单元格非空时报列数错误
fn row_cells<'a>(
    range: &'a Range<Data>,
    row: usize,
    total_cols: usize,
    columns: usize,
    source: &SpecificationSource,
) -> Result<Vec<&'a Data>, SpecError> {
    let mut cells: Vec<&Data> = (0..total_cols).map(|c| cell(range, row, c)).collect();
    while cells.len() > columns {
        if cells.last().is_some_and(|c| is_empty(c)) {
            cells.pop();
        } else {
            return Err(column_count_error(row + 1, columns, cells.len(), source));
        }
    }
    cells.resize(columns, &EMPTY);
    Ok(cells)
}

fn is_empty(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn header_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::Float(f) => Some(CellValue::from_float(*f).to_string()),
        other => Some(header_text(other)),
    }
}

/// 单元格转为取值；错误单元格视为空，布尔与日期按显示文本保留
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::from_float(*f),
        Data::Bool(b) => CellValue::String(if *b { "TRUE" } else { "FALSE" }.to_string()),
        other => CellValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_specifications::error::ErrorKind;
    use rust_xlsxwriter::Workbook;
    use std::path::PathBuf;
    use tempfile::{tempdir, TempDir};

    /// 每个元素: (工作表名, 行)
    fn write_workbook(sheets: &[(&str, Vec<Vec<&str>>)]) -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spec.xlsx");
        let mut workbook = Workbook::new();
        for (name, rows) in sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    match value.parse::<f64>() {
                        Ok(n) => sheet.write_number(r as u32, c as u16, n).unwrap(),
                        Err(_) => sheet.write_string(r as u32, c as u16, *value).unwrap(),
                    };
                }
            }
        }
        workbook.save(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn test_parse_multiple_tabs() {
        let (_dir, path) = write_workbook(&[
            (
                "genomes",
                vec![
                    vec!["Data type: genome; Columns: 2; Version: 1"],
                    vec!["id", "count"],
                    vec!["ID", "Count"],
                    vec!["g1", "3"],
                    vec!["", ""],
                    vec!["g2", "1.5"],
                ],
            ),
            ("notes", vec![vec!["just a note"]]),
            (
                "reads",
                vec![
                    vec!["Data type: reads; Columns: 1; Version: 1"],
                    vec!["name"],
                    vec!["Name"],
                    vec!["r1"],
                ],
            ),
        ]);

        let results = ExcelParser.parse(&path).unwrap();
        let results = results.results().unwrap();
        assert_eq!(results.len(), 2);

        let genome = &results["genome"];
        assert_eq!(genome.source, SpecificationSource::with_tab(&path, "genomes"));
        assert_eq!(genome.rows.len(), 2);
        assert_eq!(genome.rows[0]["id"], CellValue::from("g1"));
        assert_eq!(genome.rows[0]["count"], CellValue::Int(3));
        assert_eq!(genome.rows[1]["count"], CellValue::Float(1.5));

        assert_eq!(results["reads"].source.tab.as_deref(), Some("reads"));
    }

    #[test]
    fn test_duplicate_datatype_across_tabs() {
        let sheet = vec![
            vec!["Data type: genome; Columns: 1; Version: 1"],
            vec!["id"],
            vec!["ID"],
            vec!["g1"],
        ];
        let (_dir, path) = write_workbook(&[("first", sheet.clone()), ("second", sheet)]);

        let results = ExcelParser.parse(&path).unwrap();
        let errors = results.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::MultipleSpecificationsForDataType);
        assert_eq!(errors[0].message(), Some("Found datatype genome in multiple tabs"));
        assert_eq!(errors[0].source_1().unwrap().tab.as_deref(), Some("first"));
        assert_eq!(errors[0].source_2().unwrap().tab.as_deref(), Some("second"));
    }

    #[test]
    fn test_extra_non_empty_column() {
        let (_dir, path) = write_workbook(&[(
            "t",
            vec![
                vec!["Data type: genome; Columns: 1; Version: 1"],
                vec!["id"],
                vec!["ID"],
                vec!["g1", "oops"],
            ],
        )]);

        let results = ExcelParser.parse(&path).unwrap();
        let errors = results.errors();
        assert_eq!(errors[0].kind(), ErrorKind::IncorrectColumnCount);
        assert_eq!(
            errors[0].message(),
            Some("Incorrect number of items in line 4, expected 1, got 2")
        );
    }

    #[test]
    fn test_invalid_header_in_tab() {
        let (_dir, path) = write_workbook(&[(
            "t",
            vec![vec!["Datatype: genome"], vec!["id"], vec!["ID"], vec!["g1"]],
        )]);

        let results = ExcelParser.parse(&path).unwrap();
        let errors = results.errors();
        assert_eq!(errors[0].kind(), ErrorKind::ParseFail);
        assert_eq!(errors[0].source_1().unwrap().tab.as_deref(), Some("t"));
    }

    #[test]
    fn test_no_data_tabs() {
        let (_dir, path) = write_workbook(&[("t", vec![vec!["header only"]])]);
        let results = ExcelParser.parse(&path).unwrap();
        assert_eq!(results.errors()[0].message(), Some("No non-header data in file"));
    }

    #[test]
    fn test_not_an_excel_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.xlsx");
        std::fs::write(&path, "plain text").unwrap();

        let results = ExcelParser.parse(&path).unwrap();
        assert_eq!(
            results.errors()[0].message(),
            Some("Not a supported Excel file type")
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let results = ExcelParser.parse(&dir.path().join("none.xlsx")).unwrap();
        assert_eq!(results.errors()[0].kind(), ErrorKind::FileNotFound);
    }
}
