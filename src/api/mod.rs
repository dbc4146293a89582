// ==========================================
// 暂存服务 - API 层
// ==========================================
// 职责: 提供批量导入规范相关的业务接口，供 HTTP 层或命令行调用
// ==========================================

pub mod bulk_specification_api;
pub mod error;
pub mod path_authorizer;

// 重导出核心类型
pub use bulk_specification_api::{
    split_file_list, success_response, BulkSpecificationApi, BulkSpecificationResponse, SpecificationFile,
    WriteBulkSpecificationRequest, WriteBulkSpecificationResponse,
};
pub use error::{ApiError, ApiResult};
pub use path_authorizer::{PathAuthorizer, SandboxPathAuthorizer, StagingPath};
