// ==========================================
// 暂存服务 - 扩展名映射文档
// ==========================================
// 职责: 映射配置文档的序列化结构
// 格式: {"types": {ext: {"file_ext_type": [...], "mappings": [...]}}}
// ==========================================

use crate::autodetect::file_type::FileType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 完全匹配权重（当前所有匹配均为完全匹配，预留给部分匹配打分）
pub const PERFECT_MATCH_WEIGHT: f64 = 1.0;

fn default_app_weight() -> f64 {
    PERFECT_MATCH_WEIGHT
}

/// 扩展名到导入 App 的一条候选匹配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppMatch {
    /// 导入 App 标识（即数据类型）
    pub id: String,

    /// 匹配权重
    #[serde(default = "default_app_weight")]
    pub app_weight: f64,

    /// App 显示名称（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// 该匹配对应的文件类型（列表形式，预留正反向读段等细分类型）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_type: Vec<FileType>,
}

impl AppMatch {
    /// 创建完全匹配
    pub fn perfect(id: impl Into<String>, file_type: FileType) -> Self {
        Self {
            id: id.into(),
            app_weight: PERFECT_MATCH_WEIGHT,
            title: None,
            file_type: vec![file_type],
        }
    }
}

/// 单个扩展名的映射条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    /// 候选文件类型，首个为规范类型（更通用的类型排在前面）
    pub file_ext_type: Vec<FileType>,

    /// 接受该扩展名的导入 App
    #[serde(default)]
    pub mappings: Vec<AppMatch>,
}

impl ExtensionEntry {
    /// 规范文件类型（file_ext_type 首项）
    pub fn canonical_type(&self) -> Option<&FileType> {
        self.file_ext_type.first()
    }
}

/// 映射配置文档
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    pub types: BTreeMap<String, ExtensionEntry>,
}

impl MappingDocument {
    /// 从 JSON 文本解析
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
