// ==========================================
// 暂存服务 - 导入规范数据结构
// ==========================================
// 职责: 单元格值、解析结果、模板规范
// ==========================================

use crate::import_specifications::error::{SpecError, SpecificationSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 单元格值: 字符串、整数、浮点数或空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
}

impl CellValue {
    /// 规范化分隔符文本单元格
    ///
    /// # 规则
    /// 1. 去除首尾空白
    /// 2. 可解析为有限数值时转为数字，整数值转为 Int
    /// 3. 空字符串转为 Null
    pub fn from_text(raw: &str) -> Self {
        let val = raw.trim();
        if val.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = val.parse::<i64>() {
            return CellValue::Int(i);
        }
        match val.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::from_float(f),
            _ => CellValue::String(val.to_string()),
        }
    }

    /// 浮点数规范化: 整数值且在 i64 范围内时转为 Int
    pub fn from_float(f: f64) -> Self {
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
            CellValue::Int(f as i64)
        } else {
            CellValue::Float(f)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    /// 写出时的文本形式，Null 为空字符串
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

/// 一行记录: 参数 ID -> 值
pub type Row = BTreeMap<String, CellValue>;

/// 单个数据类型的解析结果（行序与源文件一致）
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub source: SpecificationSource,
    pub rows: Vec<Row>,
}

impl ParseResult {
    pub fn new(source: SpecificationSource, rows: Vec<Row>) -> Self {
        Self { source, rows }
    }
}

/// 解析结果: 成功（数据类型 -> 结果）与失败（错误列表）互斥
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResults {
    Results(BTreeMap<String, ParseResult>),
    Errors(Vec<SpecError>),
}

impl ParseResults {
    /// 单个错误
    pub fn error(error: SpecError) -> Self {
        ParseResults::Errors(vec![error])
    }

    /// 单个数据类型的成功结果
    pub fn single(datatype: impl Into<String>, result: ParseResult) -> Self {
        let mut results = BTreeMap::new();
        results.insert(datatype.into(), result);
        ParseResults::Results(results)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ParseResults::Results(_))
    }

    pub fn results(&self) -> Option<&BTreeMap<String, ParseResult>> {
        match self {
            ParseResults::Results(r) => Some(r),
            ParseResults::Errors(_) => None,
        }
    }

    pub fn errors(&self) -> &[SpecError] {
        match self {
            ParseResults::Results(_) => &[],
            ParseResults::Errors(e) => e,
        }
    }
}

/// 单个数据类型的模板规范
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSpec {
    /// 列定义: (参数 ID, 显示名称)，顺序即列顺序
    pub order_and_display: Vec<(String, String)>,
    /// 数据行；为空时生成仅含表头的模板
    #[serde(default)]
    pub data: Vec<Row>,
}

impl TemplateSpec {
    pub fn new(order_and_display: Vec<(String, String)>, data: Vec<Row>) -> Self {
        Self {
            order_and_display,
            data,
        }
    }

    /// 参数 ID（按列顺序）
    pub fn param_ids(&self) -> Vec<&str> {
        self.order_and_display
            .iter()
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// 显示名称（按列顺序）
    pub fn display_names(&self) -> Vec<&str> {
        self.order_and_display
            .iter()
            .map(|(_, name)| name.as_str())
            .collect()
    }

    pub(crate) fn param_id_set(&self) -> BTreeSet<&str> {
        self.order_and_display
            .iter()
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

/// 数据类型 -> 模板规范
pub type TemplateSpecs = BTreeMap<String, TemplateSpec>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_normalization() {
        assert_eq!(CellValue::from_text("  abc "), CellValue::from("abc"));
        assert_eq!(CellValue::from_text(""), CellValue::Null);
        assert_eq!(CellValue::from_text("   "), CellValue::Null);
        assert_eq!(CellValue::from_text("42"), CellValue::Int(42));
        assert_eq!(CellValue::from_text(" -7 "), CellValue::Int(-7));
        assert_eq!(CellValue::from_text("3.0"), CellValue::Int(3));
        assert_eq!(CellValue::from_text("2.5"), CellValue::Float(2.5));
        assert_eq!(CellValue::from_text("1e3"), CellValue::Int(1000));
        // 非有限数值保留为字符串
        assert_eq!(CellValue::from_text("nan"), CellValue::from("nan"));
        assert_eq!(CellValue::from_text("inf"), CellValue::from("inf"));
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Int(5).to_string(), "5");
        assert_eq!(CellValue::Float(1.5).to_string(), "1.5");
        assert_eq!(CellValue::from("x y").to_string(), "x y");
    }

    #[test]
    fn test_cell_value_json() {
        let row: Row = serde_json::from_str(r#"{"a": "s", "b": 1, "c": 2.5, "d": null}"#).unwrap();
        assert_eq!(row["a"], CellValue::from("s"));
        assert_eq!(row["b"], CellValue::Int(1));
        assert_eq!(row["c"], CellValue::Float(2.5));
        assert_eq!(row["d"], CellValue::Null);

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"a":"s","b":1,"c":2.5,"d":null}"#);
    }

    #[test]
    fn test_template_spec_json() {
        let spec: TemplateSpec = serde_json::from_str(
            r#"{"order_and_display": [["id", "ID"], ["name", "Name"]], "data": []}"#,
        )
        .unwrap();
        assert_eq!(spec.param_ids(), vec!["id", "name"]);
        assert_eq!(spec.display_names(), vec!["ID", "Name"]);
        assert!(spec.data.is_empty());
    }
}
