// ==========================================
// 暂存服务 - 批量导入规范 API
// ==========================================
// 职责: 文件类型查询、导入 App 映射、导入规范解析与模板写出
// 说明: 路径经 PathAuthorizer 授权；响应中仅出现用户可见路径
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::path_authorizer::{PathAuthorizer, StagingPath};
use crate::autodetect::{DatatypeMappings, MappingRegistry, MappingsResponse};
use crate::import_specifications::{
    check_write_specification, classify_errors, log_unexpected_error,
    parse_import_specifications_concurrently, ErrorLogger, FileTypeResolver,
    MappingFileTypeResolver, ParseResult, ParseResults, Row, SpecFormat, TemplateSpecs, UnknownFormat,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 数据来源（用户可见路径 + 工作表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationFile {
    pub file: String,
    pub tab: Option<String>,
}

/// 解析成功响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkSpecificationResponse {
    /// 数据类型 -> 数据行
    pub types: BTreeMap<String, Vec<Row>>,
    /// 数据类型 -> 来源
    pub files: BTreeMap<String, SpecificationFile>,
}

/// 模板写出请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteBulkSpecificationRequest {
    /// 相对用户暂存区的输出目录
    pub output_directory: String,
    /// CSV / TSV / EXCEL
    pub output_file_type: String,
    pub types: TemplateSpecs,
}

/// 模板写出响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBulkSpecificationResponse {
    pub output_file_type: SpecFormat,
    /// 数据类型 -> 用户可见文件路径
    pub files_created: BTreeMap<String, String>,
}

/// 批量导入规范 API
pub struct BulkSpecificationApi {
    registry: Arc<MappingRegistry>,
    authorizer: Arc<dyn PathAuthorizer>,
    log_error: Arc<ErrorLogger>,
}

impl BulkSpecificationApi {
    /// 创建 API 实例，未预期错误写入 tracing 日志
    pub fn new(registry: Arc<MappingRegistry>, authorizer: Arc<dyn PathAuthorizer>) -> Self {
        Self {
            registry,
            authorizer,
            log_error: Arc::new(log_unexpected_error),
        }
    }

    /// 替换未预期错误的记录回调
    pub fn with_error_logger(mut self, log_error: Arc<ErrorLogger>) -> Self {
        self.log_error = log_error;
        self
    }

    /// 查询 App -> 文件类型、文件类型 -> 扩展名 两张静态表
    pub fn importer_filetypes(&self) -> DatatypeMappings {
        self.registry.snapshot().datatype_mappings().clone()
    }

    /// 查询文件名对应的导入 App
    ///
    /// # 返回
    /// - Err(ApiError::InvalidInput): 文件列表为空
    pub fn importer_mappings(&self, file_list: &[String]) -> ApiResult<MappingsResponse> {
        if file_list.is_empty() {
            return Err(ApiError::InvalidInput(
                "must provide file_list field".to_string(),
            ));
        }
        Ok(self.registry.snapshot().get_mappings(file_list))
    }

    /// 解析用户暂存区中的导入规范文件
    ///
    /// # 参数
    /// - username: 暂存区所属用户
    /// - files: 逗号分隔的相对路径列表
    ///
    /// # 返回
    /// - Ok(BulkSpecificationResponse): 全部文件解析成功
    /// - Err(ApiError::ImportSpecification): 全部错误及其分级
    #[instrument(skip_all, fields(user = %username))]
    pub async fn bulk_specification(
        &self,
        username: &str,
        files: &str,
    ) -> ApiResult<BulkSpecificationResponse> {
        let staged: Vec<StagingPath> = split_file_list(files)
            .iter()
            .map(|f| self.authorizer.authorize(username, f))
            .collect::<ApiResult<_>>()?;

        let translations: HashMap<PathBuf, PathBuf> = staged
            .iter()
            .map(|s| (s.full_path.clone(), s.user_path.clone()))
            .collect();
        let paths: Vec<PathBuf> = staged.into_iter().map(|s| s.full_path).collect();

        let resolver: Arc<dyn FileTypeResolver> =
            Arc::new(MappingFileTypeResolver::new(self.registry.snapshot()));
        let outcome =
            parse_import_specifications_concurrently(paths, resolver, Arc::clone(&self.log_error))
                .await;

        match outcome {
            ParseResults::Errors(errors) => {
                let classified = classify_errors(&errors, &translations);
                warn!(
                    errors = errors.len(),
                    status = classified.severity.http_status(),
                    "导入规范解析失败"
                );
                Err(ApiError::ImportSpecification(classified))
            }
            ParseResults::Results(results) => {
                let response = success_response(results, &translations);
                info!(datatypes = response.types.len(), "导入规范解析完成");
                Ok(response)
            }
        }
    }

    /// 写出导入规范模板到用户暂存区
    ///
    /// 校验在创建目录与写出文件之前完成
    #[instrument(skip_all, fields(user = %username))]
    pub async fn write_bulk_specification(
        &self,
        username: &str,
        request: WriteBulkSpecificationRequest,
    ) -> ApiResult<WriteBulkSpecificationResponse> {
        let format: SpecFormat = request
            .output_file_type
            .parse()
            .map_err(|e: UnknownFormat| ApiError::InvalidInput(e.to_string()))?;
        check_write_specification(format, &request.types)?;

        let staged = self
            .authorizer
            .authorize(username, &request.output_directory)?;
        tokio::fs::create_dir_all(&staged.full_path)
            .await
            .map_err(|e| {
                ApiError::InternalError(format!(
                    "Unable to create directory {}: {}",
                    staged.user_path.display(),
                    e
                ))
            })?;

        let folder = staged.full_path.clone();
        let types = request.types;
        let created = tokio::task::spawn_blocking(move || format.write(&folder, &types))
            .await
            .map_err(|e| ApiError::InternalError(format!("Template writer task failed: {}", e)))??;

        let files_created = created
            .into_iter()
            .map(|(datatype, name)| {
                (
                    datatype,
                    staged.user_path.join(name).to_string_lossy().into_owned(),
                )
            })
            .collect::<BTreeMap<_, _>>();
        info!(format = %format, files = files_created.len(), "模板写出完成");

        Ok(WriteBulkSpecificationResponse {
            output_file_type: format,
            files_created,
        })
    }
}

/// 由解析结果构造成功响应，来源路径经 translations 转换为用户可见路径
pub fn success_response(
    results: BTreeMap<String, ParseResult>,
    translations: &HashMap<PathBuf, PathBuf>,
) -> BulkSpecificationResponse {
    let mut types = BTreeMap::new();
    let mut files = BTreeMap::new();
    for (datatype, result) in results {
        let file = translations
            .get(&result.source.file)
            .unwrap_or(&result.source.file)
            .to_string_lossy()
            .into_owned();
        files.insert(
            datatype.clone(),
            SpecificationFile {
                file,
                tab: result.source.tab,
            },
        );
        types.insert(datatype, result.rows);
    }
    BulkSpecificationResponse { types, files }
}

/// 拆分逗号分隔的文件列表（去除空白，忽略空项）
pub fn split_file_list(files: &str) -> Vec<String> {
    files
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}
