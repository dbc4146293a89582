// ==========================================
// 暂存服务 - 导入规范格式
// ==========================================
// 职责: 定义解析 / 写出接口，并按格式分派到具体实现
// 支持: CSV / TSV / EXCEL
// ==========================================

use crate::autodetect::FileType;
use crate::import_specifications::error::WriteResult;
use crate::import_specifications::excel_parser::ExcelParser;
use crate::import_specifications::excel_writer::ExcelWriter;
use crate::import_specifications::types::{ParseResults, TemplateSpecs};
use crate::import_specifications::xsv_parser::XsvParser;
use crate::import_specifications::xsv_writer::XsvWriter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// ==========================================
// 解析 / 写出接口
// ==========================================

/// 导入规范解析器
///
/// 可预期的结构错误放在 ParseResults::Errors 中返回；
/// Err 仅用于未预期的故障，由调用方记录并归类为 OTHER
pub trait ImportSpecParser: Send + Sync {
    fn parse(&self, path: &Path) -> anyhow::Result<ParseResults>;
}

/// 模板写出器
///
/// # 返回
/// - Ok(map): 数据类型 -> 输出文件名（相对输出目录）
pub trait ImportSpecWriter: Send + Sync {
    fn write(&self, folder: &Path, types: &TemplateSpecs) -> WriteResult<BTreeMap<String, String>>;
}

// ==========================================
// 格式枚举
// ==========================================

/// 导入规范文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpecFormat {
    Csv,
    Tsv,
    Excel,
}

impl SpecFormat {
    pub const ALL: [SpecFormat; 3] = [SpecFormat::Csv, SpecFormat::Tsv, SpecFormat::Excel];

    /// 文件类型对应的格式；非表格类型返回 None
    pub fn from_file_type(file_type: &FileType) -> Option<Self> {
        match file_type {
            FileType::Csv => Some(SpecFormat::Csv),
            FileType::Tsv => Some(SpecFormat::Tsv),
            FileType::Excel => Some(SpecFormat::Excel),
            _ => None,
        }
    }

    pub fn file_type(&self) -> FileType {
        match self {
            SpecFormat::Csv => FileType::Csv,
            SpecFormat::Tsv => FileType::Tsv,
            SpecFormat::Excel => FileType::Excel,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecFormat::Csv => "CSV",
            SpecFormat::Tsv => "TSV",
            SpecFormat::Excel => "EXCEL",
        }
    }

    /// 解析单个文件
    pub fn parse(&self, path: &Path) -> anyhow::Result<ParseResults> {
        self.parser().parse(path)
    }

    /// 写出模板
    pub fn write(
        &self,
        folder: &Path,
        types: &TemplateSpecs,
    ) -> WriteResult<BTreeMap<String, String>> {
        self.writer().write(folder, types)
    }

    pub fn parser(&self) -> &'static dyn ImportSpecParser {
        match self {
            SpecFormat::Csv => &XsvParser::CSV,
            SpecFormat::Tsv => &XsvParser::TSV,
            SpecFormat::Excel => &ExcelParser,
        }
    }

    pub fn writer(&self) -> &'static dyn ImportSpecWriter {
        match self {
            SpecFormat::Csv => &XsvWriter::CSV,
            SpecFormat::Tsv => &XsvWriter::TSV,
            SpecFormat::Excel => &ExcelWriter,
        }
    }
}

impl fmt::Display for SpecFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知的输出格式名
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid output_file_type: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for SpecFormat {
    type Err = UnknownFormat;

    /// 格式名区分大小写
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}
