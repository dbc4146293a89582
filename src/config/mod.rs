// ==========================================
// 暂存服务 - 配置层
// ==========================================
// 职责: 服务主配置读取，扩展名映射文档加载
// ==========================================

pub mod error;
pub mod mapping_source;
pub mod service_config;

// 重导出核心类型
pub use error::{ConfigError, ConfigResult};
pub use mapping_source::{BuiltinMappingSource, FileMappingSource, MappingDocumentSource};
pub use service_config::ServiceConfig;
