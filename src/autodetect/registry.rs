// ==========================================
// 暂存服务 - 映射表注册中心
// ==========================================
// 职责: 持有进程级只读映射表，支持整体替换式重载
// 并发: 读者获取 Arc 快照后立即释放锁，I/O 期间不持锁
// ==========================================

use crate::autodetect::type_mapping_table::TypeMappingTable;
use crate::config::error::ConfigError;
use crate::config::mapping_source::MappingDocumentSource;
use std::sync::{Arc, RwLock};
use tracing::info;

/// 映射表注册中心
pub struct MappingRegistry {
    current: RwLock<Arc<TypeMappingTable>>,
}

impl MappingRegistry {
    /// 以已完整构建的映射表创建注册中心
    pub fn new(table: TypeMappingTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// 从映射文档来源加载并创建注册中心
    ///
    /// # 返回
    /// - Err(ConfigError): 文档缺失或不完整，调用方不应继续启动
    pub async fn load(source: &dyn MappingDocumentSource) -> Result<Self, ConfigError> {
        let table = Self::build(source).await?;
        Ok(Self::new(table))
    }

    /// 获取当前映射表快照
    pub fn snapshot(&self) -> Arc<TypeMappingTable> {
        // 写锁只在替换指针时短暂持有，中毒时仍可安全读取旧值
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// 整体替换映射表
    pub fn replace(&self, table: TypeMappingTable) {
        let table = Arc::new(table);
        match self.current.write() {
            Ok(mut guard) => *guard = table,
            Err(poisoned) => *poisoned.into_inner() = table,
        }
    }

    /// 重新加载映射文档
    ///
    /// 新表完整构建成功后才替换；构建失败时保留旧表并返回错误
    pub async fn reload(&self, source: &dyn MappingDocumentSource) -> Result<(), ConfigError> {
        let table = Self::build(source).await?;
        self.replace(table);
        info!(source = %source.describe(), "映射表已重新加载");
        Ok(())
    }

    async fn build(source: &dyn MappingDocumentSource) -> Result<TypeMappingTable, ConfigError> {
        let document = source.load().await?;
        let table = TypeMappingTable::from_document(document)?;
        info!(source = %source.describe(), extensions = table.len(), "映射文档加载完成");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodetect::catalog::builtin_mapping_document;
    use crate::autodetect::mapping_document::MappingDocument;
    use crate::config::mapping_source::BuiltinMappingSource;
    use async_trait::async_trait;

    struct BrokenSource;

    #[async_trait]
    impl MappingDocumentSource for BrokenSource {
        async fn load(&self) -> Result<MappingDocument, ConfigError> {
            Ok(MappingDocument::default())
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    #[tokio::test]
    async fn test_load_builtin() {
        let registry = MappingRegistry::load(&BuiltinMappingSource).await.unwrap();
        assert!(registry.snapshot().entry("csv").is_some());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_old_table() {
        let registry = MappingRegistry::load(&BuiltinMappingSource).await.unwrap();
        let before = registry.snapshot();

        assert!(registry.reload(&BrokenSource).await.is_err());
        assert!(Arc::ptr_eq(&before, &registry.snapshot()));
    }

    #[test]
    fn test_replace_swaps_whole_table() {
        let table = TypeMappingTable::from_document(builtin_mapping_document()).unwrap();
        let registry = MappingRegistry::new(table);
        let old = registry.snapshot();

        let doc = MappingDocument::from_json(r#"{"types": {"csv": {"file_ext_type": ["CSV"]}}}"#)
            .unwrap();
        registry.replace(TypeMappingTable::from_document(doc).unwrap());

        // 旧快照不受影响
        assert!(old.entry("xlsx").is_some());
        assert!(registry.snapshot().entry("xlsx").is_none());
        assert_eq!(registry.snapshot().len(), 1);
    }
}
