// ==========================================
// 暂存服务 - 服务配置
// ==========================================
// 职责: 读取服务主配置（JSON 文件 + 环境变量覆写）
// 规则: 以 '.' 开头的路径相对当前工作目录解析并规范化
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// 主配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "STAGING_SERVICE_CONFIG";
/// 数据目录覆写环境变量
pub const DATA_DIR_ENV: &str = "STAGING_SERVICE_DATA_DIR";
/// 扩展名映射文档路径覆写环境变量
pub const FILE_EXTENSION_MAPPINGS_ENV: &str = "STAGING_SERVICE_FILE_EXTENSION_MAPPINGS";

#[derive(Debug, Default, Deserialize)]
struct RawServiceConfig {
    data_dir: Option<String>,
    file_extension_mappings: Option<String>,
}

/// 服务配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// 用户暂存区根目录
    pub data_dir: PathBuf,
    /// 扩展名映射文档路径
    pub file_extension_mappings: PathBuf,
}

impl ServiceConfig {
    /// 从进程环境读取配置
    ///
    /// # 返回
    /// - Ok(Some(ServiceConfig)): 已配置
    /// - Ok(None): 未设置任何配置来源
    /// - Err(ConfigError): 配置不完整或无法读取
    pub fn from_env() -> ConfigResult<Option<Self>> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::ReadFailed {
            path: PathBuf::from("."),
            source: e,
        })?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// 从查询函数读取配置（便于测试注入环境）
    pub fn from_lookup<F>(lookup: F, cwd: &Path) -> ConfigResult<Option<Self>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut raw = match lookup(CONFIG_PATH_ENV) {
            Some(path) => read_raw(&resolve_path(&path, cwd))?,
            None => RawServiceConfig::default(),
        };

        if let Some(v) = lookup(DATA_DIR_ENV) {
            raw.data_dir = Some(v);
        }
        if let Some(v) = lookup(FILE_EXTENSION_MAPPINGS_ENV) {
            raw.file_extension_mappings = Some(v);
        }

        if raw.data_dir.is_none() && raw.file_extension_mappings.is_none() {
            return Ok(None);
        }

        let data_dir = raw.data_dir.ok_or(ConfigError::MissingValue("data_dir"))?;
        let mappings = raw
            .file_extension_mappings
            .ok_or(ConfigError::MissingValue("file_extension_mappings"))?;

        Ok(Some(Self {
            data_dir: resolve_path(&data_dir, cwd),
            file_extension_mappings: resolve_path(&mappings, cwd),
        }))
    }

    /// 从 JSON 配置文件读取
    pub fn from_json_file(path: &Path, cwd: &Path) -> ConfigResult<Self> {
        let raw = read_raw(path)?;
        let data_dir = raw.data_dir.ok_or(ConfigError::MissingValue("data_dir"))?;
        let mappings = raw
            .file_extension_mappings
            .ok_or(ConfigError::MissingValue("file_extension_mappings"))?;
        Ok(Self {
            data_dir: resolve_path(&data_dir, cwd),
            file_extension_mappings: resolve_path(&mappings, cwd),
        })
    }
}

fn read_raw(path: &Path) -> ConfigResult<RawServiceConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| ConfigError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// 解析配置中的路径：'.' 开头的相对路径基于 cwd 展开并规范化
pub fn resolve_path(raw: &str, cwd: &Path) -> PathBuf {
    if raw.starts_with('.') {
        normalize(&cwd.join(raw))
    } else {
        PathBuf::from(raw)
    }
}

// 纯词法规范化，不访问文件系统
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
