// ==========================================
// 暂存服务 - 应用状态
// ==========================================
// 职责: 管理进程级共享状态和 API 实例
// 启动顺序: 读取配置 → 加载映射表（失败即终止）→ 创建 API
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{BulkSpecificationApi, SandboxPathAuthorizer};
use crate::autodetect::MappingRegistry;
use crate::config::{
    BuiltinMappingSource, ConfigError, FileMappingSource, MappingDocumentSource, ServiceConfig,
};
use crate::import_specifications::MappingFileTypeResolver;

/// 应用状态
///
/// 映射表在创建时完整构建，此后只能整体替换
pub struct AppState {
    /// 用户暂存区根目录
    pub data_dir: PathBuf,

    /// 映射文档来源（重载时复用）
    pub mapping_source: Arc<dyn MappingDocumentSource>,

    /// 映射表注册中心
    pub registry: Arc<MappingRegistry>,

    /// 批量导入规范 API
    pub bulk_specification_api: Arc<BulkSpecificationApi>,
}

impl AppState {
    /// 按进程环境创建应用状态
    ///
    /// 未配置时使用内置映射目录，数据目录为当前工作目录
    pub async fn from_env() -> Result<Self, ConfigError> {
        match ServiceConfig::from_env()? {
            Some(config) => Self::from_config(&config).await,
            None => {
                let cwd = std::env::current_dir().map_err(|e| ConfigError::ReadFailed {
                    path: PathBuf::from("."),
                    source: e,
                })?;
                tracing::info!("未找到服务配置，使用内置映射目录");
                Self::new(cwd, Arc::new(BuiltinMappingSource)).await
            }
        }
    }

    /// 按服务配置创建应用状态
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        let source = FileMappingSource::new(&config.file_extension_mappings);
        Self::new(config.data_dir.clone(), Arc::new(source)).await
    }

    /// 创建应用状态
    ///
    /// # 参数
    /// - data_dir: 用户暂存区根目录
    /// - mapping_source: 映射文档来源
    ///
    /// # 返回
    /// - Err(ConfigError): 映射文档缺失或不完整
    pub async fn new(
        data_dir: PathBuf,
        mapping_source: Arc<dyn MappingDocumentSource>,
    ) -> Result<Self, ConfigError> {
        tracing::info!(
            data_dir = %data_dir.display(),
            source = %mapping_source.describe(),
            "初始化AppState"
        );

        let registry = Arc::new(MappingRegistry::load(mapping_source.as_ref()).await?);
        let authorizer = Arc::new(SandboxPathAuthorizer::new(data_dir.clone()));
        let bulk_specification_api =
            Arc::new(BulkSpecificationApi::new(Arc::clone(&registry), authorizer));

        Ok(Self {
            data_dir,
            mapping_source,
            registry,
            bulk_specification_api,
        })
    }

    /// 以当前映射表创建文件类型解析器
    pub fn resolver(&self) -> MappingFileTypeResolver {
        MappingFileTypeResolver::new(self.registry.snapshot())
    }

    /// 重新加载映射文档；失败时保留旧表
    pub async fn reload_mappings(&self) -> Result<(), ConfigError> {
        self.registry.reload(self.mapping_source.as_ref()).await
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodetect::FileType;

    #[tokio::test]
    async fn test_builtin_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(dir.path().to_path_buf(), Arc::new(BuiltinMappingSource))
            .await
            .unwrap();

        let filetypes = state.bulk_specification_api.importer_filetypes();
        assert!(filetypes.filetype_to_extensions[&FileType::Csv].contains(&"csv".to_string()));
        assert!(state.reload_mappings().await.is_ok());
        assert_eq!(state.data_dir(), dir.path());
    }

    #[tokio::test]
    async fn test_missing_mapping_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileMappingSource::new(dir.path().join("missing.json"));
        let result = AppState::new(dir.path().to_path_buf(), Arc::new(source)).await;
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }
}
