// ==========================================
// 暂存服务 - 核心库
// ==========================================
// 职责: 文件类型自动判定、批量导入规范的解析与模板写出
// 系统定位: 暂存服务的无状态核心（映射表启动后只读）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 自动判定层 - 扩展名 / 文件类型 / 导入 App 映射
pub mod autodetect;

// 配置层 - 服务配置与映射文档来源
pub mod config;

// 导入规范层 - 解析、错误分级、模板写出
pub mod import_specifications;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use api::{ApiError, ApiResult, BulkSpecificationApi};
pub use app::AppState;
pub use autodetect::{FileType, MappingRegistry, TypeMappingTable};
pub use config::{ConfigError, ServiceConfig};
pub use import_specifications::{
    parse_import_specifications, write_import_specification, ParseResults, SpecError,
    SpecFormat, TemplateSpec,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "staging-service";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
