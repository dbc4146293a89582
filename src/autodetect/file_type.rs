// ==========================================
// 暂存服务 - 文件类型
// ==========================================
// 职责: 扩展名归类后的规范文件类型
// 说明: 映射文档中出现的未知类型以 Other 原样保留
// ==========================================

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// 规范文件类型
///
/// 序列化为映射文档中使用的类型名（如 "FASTA"、"EXCEL"）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileType {
    Sra,
    Fastq,
    Fasta,
    Genbank,
    Gff,
    CompressedArchive,
    Csv,
    Tsv,
    Excel,
    Json,
    Sbml,
    /// 映射文档中声明、但不在内置目录中的类型
    Other(String),
}

impl FileType {
    /// 内置目录中的全部类型（不含 Other）
    pub const BUILTIN: [FileType; 11] = [
        FileType::Sra,
        FileType::Fastq,
        FileType::Fasta,
        FileType::Genbank,
        FileType::Gff,
        FileType::CompressedArchive,
        FileType::Csv,
        FileType::Tsv,
        FileType::Excel,
        FileType::Json,
        FileType::Sbml,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FileType::Sra => "SRA",
            FileType::Fastq => "FASTQ",
            FileType::Fasta => "FASTA",
            FileType::Genbank => "GENBANK",
            FileType::Gff => "GFF",
            FileType::CompressedArchive => "CompressedFileFormatArchive",
            FileType::Csv => "CSV",
            FileType::Tsv => "TSV",
            FileType::Excel => "EXCEL",
            FileType::Json => "JSON",
            FileType::Sbml => "SBML",
            FileType::Other(name) => name,
        }
    }

    /// 是否为导入规范表格格式（CSV / TSV / EXCEL）
    pub fn is_tabular(&self) -> bool {
        matches!(self, FileType::Csv | FileType::Tsv | FileType::Excel)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 按类型名排序，保证派生表输出稳定
impl Ord for FileType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for FileType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<String> for FileType {
    fn from(name: String) -> Self {
        FileType::BUILTIN
            .iter()
            .find(|t| t.as_str() == name)
            .cloned()
            .unwrap_or(FileType::Other(name))
    }
}

impl From<&str> for FileType {
    fn from(name: &str) -> Self {
        FileType::from(name.to_string())
    }
}

impl From<FileType> for String {
    fn from(file_type: FileType) -> Self {
        file_type.as_str().to_string()
    }
}

impl FromStr for FileType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FileType::from(s))
    }
}
