// ==========================================
// 暂存服务 - 映射文档来源 Trait
// ==========================================
// 职责: 定义启动时提供扩展名映射文档的配置加载接口
// 实现者: FileMappingSource（磁盘 JSON）, BuiltinMappingSource（内置目录）
// ==========================================

use crate::autodetect::catalog::builtin_mapping_document;
use crate::autodetect::mapping_document::MappingDocument;
use crate::config::error::ConfigError;
use async_trait::async_trait;
use std::path::PathBuf;

// ==========================================
// MappingDocumentSource Trait
// ==========================================
#[async_trait]
pub trait MappingDocumentSource: Send + Sync {
    /// 加载映射文档
    ///
    /// # 返回
    /// - Ok(MappingDocument): 解析后的文档
    /// - Err(ConfigError): 文档缺失或格式错误
    async fn load(&self) -> Result<MappingDocument, ConfigError>;

    /// 来源描述（用于日志）
    fn describe(&self) -> String;
}

/// 磁盘上的 JSON 映射文档
pub struct FileMappingSource {
    path: PathBuf,
}

impl FileMappingSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MappingDocumentSource for FileMappingSource {
    async fn load(&self) -> Result<MappingDocument, ConfigError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::ReadFailed {
                path: self.path.clone(),
                source: e,
            })?;
        MappingDocument::from_json(&text).map_err(|e| ConfigError::Malformed {
            path: self.path.clone(),
            source: e,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// 内置映射目录
pub struct BuiltinMappingSource;

#[async_trait]
impl MappingDocumentSource for BuiltinMappingSource {
    async fn load(&self) -> Result<MappingDocument, ConfigError> {
        Ok(builtin_mapping_document())
    }

    fn describe(&self) -> String {
        "builtin".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_file_source_reads_document() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"types": {{"tsv": {{"file_ext_type": ["TSV"], "mappings": [{{"id": "media"}}]}}}}}}"#
        )
        .unwrap();

        let doc = FileMappingSource::new(file.path()).load().await.unwrap();
        assert_eq!(doc.types["tsv"].mappings[0].id, "media");
    }

    #[tokio::test]
    async fn test_file_source_missing_file() {
        let result = FileMappingSource::new("/nonexistent/mappings.json").load().await;
        assert!(matches!(result, Err(ConfigError::ReadFailed { .. })));
    }
}
