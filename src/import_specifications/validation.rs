// ==========================================
// 暂存服务 - 模板规范校验
// ==========================================
// 职责: 写出前检查全部数据类型，任一不合法则不写出任何文件
// ==========================================

use crate::import_specifications::error::{WriteError, WriteResult};
use crate::import_specifications::format::SpecFormat;
use crate::import_specifications::header::is_valid_datatype;
use crate::import_specifications::types::{TemplateSpec, TemplateSpecs};
use std::collections::HashSet;
use std::path::Path;

/// Excel 工作表名称长度上限
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// 写出参数校验: 输出目录存在且规范合法
pub fn check_write_args(folder: &Path, types: &TemplateSpecs) -> WriteResult<()> {
    if !folder.is_dir() {
        return Err(WriteError::MissingDirectory(folder.to_path_buf()));
    }
    check_import_specification(types)
}

/// 按输出格式校验模板规范（Excel 额外校验工作表名称）
pub fn check_write_specification(format: SpecFormat, types: &TemplateSpecs) -> WriteResult<()> {
    check_import_specification(types)?;
    if format == SpecFormat::Excel {
        check_sheet_names(types)?;
    }
    Ok(())
}

/// Excel 工作表名称校验: 长度不超过上限，忽略大小写后不重复
pub fn check_sheet_names(types: &TemplateSpecs) -> WriteResult<()> {
    let mut seen = HashSet::new();
    for datatype in types.keys() {
        if datatype.chars().count() > MAX_SHEET_NAME_CHARS {
            return Err(WriteError::invalid(format!(
                "Data type {} is longer than the {} character limit for Excel sheet names",
                datatype, MAX_SHEET_NAME_CHARS
            )));
        }
        if !seen.insert(datatype.to_lowercase()) {
            return Err(WriteError::invalid(format!(
                "Data type {} differs from another data type only by case, \
                 which Excel sheet names do not allow",
                datatype
            )));
        }
    }
    Ok(())
}

/// 校验模板规范
///
/// # 规则
/// 1. 至少一个数据类型
/// 2. 数据类型非空白，不含路径分隔符，且只由字母、数字、下划线组成
/// 3. order_and_display 非空，ID 与显示名称非空白，ID 不重复
/// 4. 每个数据行的键集合与 order_and_display 的 ID 集合一致
pub fn check_import_specification(types: &TemplateSpecs) -> WriteResult<()> {
    if types.is_empty() {
        return Err(WriteError::invalid("At least one data type must be specified"));
    }
    for (datatype, spec) in types {
        check_datatype(datatype)?;
        check_template(datatype, spec)?;
    }
    Ok(())
}

fn check_datatype(datatype: &str) -> WriteResult<()> {
    if datatype.trim().is_empty() {
        return Err(WriteError::invalid(
            "A data type cannot be a whitespace only string",
        ));
    }
    // 数据类型用作输出文件名
    if datatype.contains(['/', '\\']) || datatype == "." || datatype == ".." {
        return Err(WriteError::invalid(format!(
            "Data type {} cannot contain path separators",
            datatype
        )));
    }
    // 首行表头只接受 \w+ 数据类型
    if !is_valid_datatype(datatype) {
        return Err(WriteError::invalid(format!(
            "Data type {} may only contain letters, digits and underscores",
            datatype
        )));
    }
    Ok(())
}

fn check_template(datatype: &str, spec: &TemplateSpec) -> WriteResult<()> {
    if spec.order_and_display.is_empty() {
        return Err(WriteError::invalid(format!(
            "At least one entry is required for order_and_display for type {}",
            datatype
        )));
    }

    let mut seen = HashSet::new();
    for (i, (param_id, display)) in spec.order_and_display.iter().enumerate() {
        let prefix = format!(
            "Invalid order_and_display entry for datatype {} at index {}",
            datatype, i
        );
        if param_id.trim().is_empty() {
            return Err(WriteError::invalid(format!(
                "{} - parameter ID cannot be a whitespace only string",
                prefix
            )));
        }
        if display.trim().is_empty() {
            return Err(WriteError::invalid(format!(
                "{} - parameter display name cannot be a whitespace only string",
                prefix
            )));
        }
        if !seen.insert(param_id.as_str()) {
            return Err(WriteError::invalid(format!(
                "{} - duplicate parameter ID {}",
                prefix, param_id
            )));
        }
    }

    let ids = spec.param_id_set();
    for (i, row) in spec.data.iter().enumerate() {
        let same_keys =
            row.len() == ids.len() && row.keys().all(|k| ids.contains(k.as_str()));
        if !same_keys {
            return Err(WriteError::invalid(format!(
                "Data type {} data row {} does not have the same keys as order_and_display",
                datatype, i
            )));
        }
    }
    Ok(())
}
