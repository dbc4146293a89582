// ==========================================
// 暂存服务 - 路径授权
// ==========================================
// 职责: 将用户请求中的相对路径映射到其暂存区内的绝对路径
// 规则: 路径限定在 data_dir/<username>/ 之下，拒绝 '..'
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use std::path::{Component, Path, PathBuf};

/// 已授权的暂存区路径
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StagingPath {
    /// 服务端绝对路径
    pub full_path: PathBuf,
    /// 用户可见路径（<username>/<relative>）
    pub user_path: PathBuf,
}

/// 路径授权接口
pub trait PathAuthorizer: Send + Sync {
    fn authorize(&self, username: &str, path: &str) -> ApiResult<StagingPath>;
}

/// 基于数据目录的沙箱授权
#[derive(Debug, Clone)]
pub struct SandboxPathAuthorizer {
    data_dir: PathBuf,
}

impl SandboxPathAuthorizer {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

impl PathAuthorizer for SandboxPathAuthorizer {
    fn authorize(&self, username: &str, path: &str) -> ApiResult<StagingPath> {
        if username.is_empty()
            || username == "."
            || username == ".."
            || username.contains(['/', '\\'])
        {
            return Err(ApiError::InvalidInput(format!("Invalid username: {}", username)));
        }

        // 前导 '/' 视为相对用户根目录
        let mut relative = PathBuf::new();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ApiError::Forbidden(format!(
                        "Path {} escapes the user staging area",
                        path
                    )));
                }
            }
        }

        let user_path = Path::new(username).join(relative);
        Ok(StagingPath {
            full_path: self.data_dir.join(&user_path),
            user_path,
        })
    }
}
