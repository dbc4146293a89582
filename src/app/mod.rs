// ==========================================
// 暂存服务 - 应用层
// ==========================================
// 职责: 组装配置、映射表与 API 实例
// ==========================================

pub mod state;

// 重导出
pub use state::AppState;
