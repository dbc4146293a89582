// ==========================================
// 暂存服务 - Excel 模板写出
// ==========================================
// 输出: 单个工作簿 import_specification.xlsx，每个数据类型一个工作表
// 说明: 参数 ID 行（第 2 行）隐藏，仅供解析使用
// ==========================================

use crate::import_specifications::error::{WriteError, WriteResult};
use crate::import_specifications::format::ImportSpecWriter;
use crate::import_specifications::header::format_header;
use crate::import_specifications::types::{CellValue, TemplateSpec, TemplateSpecs};
use crate::import_specifications::validation::{check_sheet_names, check_write_args};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// 工作簿文件名
pub const EXCEL_FILE_NAME: &str = "import_specification.xlsx";

/// Excel 模板写出器
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcelWriter;

impl ImportSpecWriter for ExcelWriter {
    fn write(&self, folder: &Path, types: &TemplateSpecs) -> WriteResult<BTreeMap<String, String>> {
        check_write_args(folder, types)?;
        check_sheet_names(types)?;

        let mut workbook = Workbook::new();
        let mut created = BTreeMap::new();
        for (datatype, spec) in types {
            let sheet = workbook.add_worksheet();
            sheet.set_name(datatype)?;
            fill_sheet(sheet, datatype, spec)?;
            created.insert(datatype.clone(), EXCEL_FILE_NAME.to_string());
        }

        let path = folder.join(EXCEL_FILE_NAME);
        workbook.save(&path)?;
        info!(file = %path.display(), sheets = created.len(), "Excel 模板已写出");
        Ok(created)
    }
}

fn fill_sheet(sheet: &mut Worksheet, datatype: &str, spec: &TemplateSpec) -> WriteResult<()> {
    let param_ids = spec.param_ids();

    sheet.write_string(0, 0, format_header(datatype, param_ids.len()))?;
    for (i, (param_id, display)) in spec.order_and_display.iter().enumerate() {
        let col = column(i)?;
        sheet.write_string(1, col, param_id)?;
        sheet.write_string(2, col, display)?;
    }

    for (r, row) in spec.data.iter().enumerate() {
        let row_num = u32::try_from(r + 3)
            .map_err(|_| WriteError::invalid("Too many data rows for an Excel sheet"))?;
        for (i, param_id) in param_ids.iter().enumerate() {
            write_cell(sheet, row_num, column(i)?, row.get(*param_id))?;
        }
    }

    sheet.set_row_hidden(1)?;
    Ok(())
}

fn column(index: usize) -> WriteResult<u16> {
    u16::try_from(index).map_err(|_| WriteError::invalid("Too many columns for an Excel sheet"))
}

// 空值不写入单元格
fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<&CellValue>,
) -> Result<(), XlsxError> {
    match value {
        None | Some(CellValue::Null) => {}
        Some(CellValue::Int(i)) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        Some(CellValue::Float(f)) => {
            sheet.write_number(row, col, *f)?;
        }
        Some(CellValue::String(s)) => {
            sheet.write_string(row, col, s)?;
        }
    }
    Ok(())
}
