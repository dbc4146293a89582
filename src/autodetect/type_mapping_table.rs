// ==========================================
// 暂存服务 - 类型映射表
// ==========================================
// 职责: 扩展名 -> 文件类型 -> 导入 App 的只读映射
// 生命周期: 启动时由映射文档一次性构建，此后只读；
//           重新加载必须整体重建，不做增量修改
// ==========================================

use crate::autodetect::file_type::FileType;
use crate::autodetect::mapping_document::{AppMatch, ExtensionEntry, MappingDocument};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// 映射表构建错误
#[derive(Error, Debug, PartialEq)]
pub enum TableBuildError {
    #[error("映射文档为空: 未声明任何扩展名")]
    EmptyDocument,

    #[error("扩展名为空字符串")]
    EmptyExtension,

    #[error("扩展名 {0} 的 file_ext_type 列表为空")]
    MissingFileType(String),

    #[error("扩展名 {0} 重复声明（大小写归一化后）")]
    DuplicateExtension(String),
}

/// 启动后静态不变的两张派生表
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatatypeMappings {
    /// 导入 App -> 接受的文件类型（已排序）
    pub datatype_to_filetype: BTreeMap<String, Vec<FileType>>,
    /// 文件类型 -> 扩展名（已排序）
    pub filetype_to_extensions: BTreeMap<FileType, Vec<String>>,
}

/// 单个文件名的归类信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// 匹配后缀之前的部分；未匹配时为完整文件名
    pub prefix: String,
    /// 匹配到的后缀（保留原始大小写）
    pub suffix: Option<String>,
    /// 后缀对应的候选文件类型，未匹配时为空
    pub file_ext_type: Vec<FileType>,
}

impl FileInfo {
    /// 规范文件类型（首个候选类型）
    pub fn canonical_type(&self) -> Option<&FileType> {
        self.file_ext_type.first()
    }
}

/// 导入 App 映射查询结果，mappings 与 fileinfo 按输入顺序一一对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingsResponse {
    pub mappings: Vec<Option<Vec<AppMatch>>>,
    pub fileinfo: Vec<FileInfo>,
}

/// 类型映射表
#[derive(Debug, Clone)]
pub struct TypeMappingTable {
    /// 扩展名（小写）-> 映射条目
    extensions: BTreeMap<String, ExtensionEntry>,
    /// 构建时计算并缓存的派生表
    datatype_mappings: DatatypeMappings,
}

impl TypeMappingTable {
    /// 由映射文档构建映射表
    ///
    /// # 算法
    /// 对每个扩展名条目:
    /// 1. 取 file_ext_type[0] 作为规范类型
    /// 2. 将扩展名加入该类型的扩展名集合
    /// 3. 对 mappings 中的每个 App，将规范类型加入该 App 的类型集合
    ///
    /// # 返回
    /// - Ok(TypeMappingTable): 完整构建的映射表
    /// - Err(TableBuildError): 文档不完整（启动时应视为致命错误）
    pub fn from_document(document: MappingDocument) -> Result<Self, TableBuildError> {
        if document.types.is_empty() {
            return Err(TableBuildError::EmptyDocument);
        }

        let mut extensions: BTreeMap<String, ExtensionEntry> = BTreeMap::new();
        let mut datatypes: BTreeMap<String, BTreeSet<FileType>> = BTreeMap::new();
        let mut filetypes: BTreeMap<FileType, BTreeSet<String>> = BTreeMap::new();

        for (raw_ext, entry) in document.types {
            let ext = raw_ext.trim().to_lowercase();
            if ext.is_empty() {
                return Err(TableBuildError::EmptyExtension);
            }
            let file_type = entry
                .canonical_type()
                .cloned()
                .ok_or_else(|| TableBuildError::MissingFileType(raw_ext.clone()))?;

            filetypes
                .entry(file_type.clone())
                .or_default()
                .insert(ext.clone());
            for app in &entry.mappings {
                datatypes
                    .entry(app.id.clone())
                    .or_default()
                    .insert(file_type.clone());
            }

            if extensions.insert(ext.clone(), entry).is_some() {
                return Err(TableBuildError::DuplicateExtension(ext));
            }
        }

        let datatype_mappings = DatatypeMappings {
            datatype_to_filetype: datatypes
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            filetype_to_extensions: filetypes
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
        };

        info!(
            extensions = extensions.len(),
            datatypes = datatype_mappings.datatype_to_filetype.len(),
            filetypes = datatype_mappings.filetype_to_extensions.len(),
            "类型映射表构建完成"
        );

        Ok(Self {
            extensions,
            datatype_mappings,
        })
    }

    /// 获取派生表（datatype_to_filetype / filetype_to_extensions）
    pub fn datatype_mappings(&self) -> &DatatypeMappings {
        &self.datatype_mappings
    }

    /// 按扩展名查询映射条目（大小写不敏感）
    pub fn entry(&self, extension: &str) -> Option<&ExtensionEntry> {
        self.extensions.get(&extension.to_lowercase())
    }

    /// 已注册的扩展名数量
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// 判定文件名可能的导入 App
    ///
    /// # 规则
    /// - 从左到右依次尝试每个 '.' 之后的后缀，最长后缀优先
    ///   （x.tar.gz 先尝试 tar.gz，再尝试 gz）
    /// - 后缀匹配大小写不敏感，返回的 suffix 保留原始大小写
    /// - 无任何匹配时 prefix 为完整文件名，suffix 为空
    ///
    /// # 返回
    /// - (Some(候选 App), FileInfo): 匹配成功
    /// - (None, FileInfo): 无匹配
    pub fn determine_possible_importers(
        &self,
        filename: &str,
    ) -> (Option<&[AppMatch]>, FileInfo) {
        for (idx, _) in filename.match_indices('.') {
            let suffix = &filename[idx + 1..];
            if let Some(entry) = self.entry(suffix) {
                return (
                    Some(entry.mappings.as_slice()),
                    FileInfo {
                        prefix: filename[..idx].to_string(),
                        suffix: Some(suffix.to_string()),
                        file_ext_type: entry.file_ext_type.clone(),
                    },
                );
            }
        }

        (
            None,
            FileInfo {
                prefix: filename.to_string(),
                suffix: None,
                file_ext_type: Vec::new(),
            },
        )
    }

    /// 对路径进行归类（仅使用文件名部分，不访问文件内容）
    pub fn classify_path(&self, path: &Path) -> FileInfo {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        self.determine_possible_importers(&filename).1
    }

    /// 批量查询文件名对应的导入 App
    ///
    /// 每个文件的候选 App 按权重降序排列（稳定排序，同权重保持文档顺序）
    pub fn get_mappings<S: AsRef<str>>(&self, file_list: &[S]) -> MappingsResponse {
        let mut mappings = Vec::with_capacity(file_list.len());
        let mut fileinfo = Vec::with_capacity(file_list.len());

        for filename in file_list {
            let (apps, info) = self.determine_possible_importers(filename.as_ref());
            debug!(file = filename.as_ref(), suffix = ?info.suffix, "文件类型判定");
            mappings.push(apps.map(sort_by_weight));
            fileinfo.push(info);
        }

        MappingsResponse { mappings, fileinfo }
    }

    /// 由映射表反推 扩展名 -> 带权重的候选 App
    ///
    /// 对每个 App 的每个接受类型的每个扩展名，产出 {id, app_weight=1, file_type}，
    /// 按扩展名分组；同一扩展名的多个 App 全部保留
    pub fn extension_app_weights(&self) -> BTreeMap<String, Vec<AppMatch>> {
        let mut result: BTreeMap<String, Vec<AppMatch>> = BTreeMap::new();
        let mappings = &self.datatype_mappings;

        for (app_id, file_types) in &mappings.datatype_to_filetype {
            for file_type in file_types {
                let Some(exts) = mappings.filetype_to_extensions.get(file_type) else {
                    continue;
                };
                for ext in exts {
                    result
                        .entry(ext.clone())
                        .or_default()
                        .push(AppMatch::perfect(app_id.clone(), file_type.clone()));
                }
            }
        }

        result
    }
}

fn sort_by_weight(apps: &[AppMatch]) -> Vec<AppMatch> {
    let mut sorted = apps.to_vec();
    sorted.sort_by(|a, b| {
        b.app_weight
            .partial_cmp(&a.app_weight)
            .unwrap_or(Ordering::Equal)
    });
    sorted
}
