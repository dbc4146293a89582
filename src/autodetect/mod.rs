// ==========================================
// 暂存服务 - 文件类型自动判定层
// ==========================================
// 职责: 扩展名 -> 文件类型 -> 导入 App 的映射
// 数据来源: 扩展名映射文档（启动时加载，进程内只读）
// ==========================================

pub mod catalog;
pub mod file_type;
pub mod mapping_document;
pub mod registry;
pub mod type_mapping_table;

// 重导出核心类型
pub use file_type::FileType;
pub use mapping_document::{AppMatch, ExtensionEntry, MappingDocument, PERFECT_MATCH_WEIGHT};
pub use registry::MappingRegistry;
pub use type_mapping_table::{
    DatatypeMappings, FileInfo, MappingsResponse, TableBuildError, TypeMappingTable,
};
