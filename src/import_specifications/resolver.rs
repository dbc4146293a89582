// ==========================================
// 暂存服务 - 导入规范文件类型解析
// ==========================================
// 职责: 路径 -> 解析格式；不支持的类型返回用于报错的扩展名
// 依据: 类型映射表的文件名归类结果（不读取文件内容）
// ==========================================

use crate::autodetect::TypeMappingTable;
use crate::import_specifications::format::SpecFormat;
use std::path::Path;
use std::sync::Arc;

/// 文件类型解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTypeResolution {
    /// 可解析的导入规范格式
    Parser(SpecFormat),
    /// 不支持的类型（附带用于错误信息的扩展名或文件名）
    Unsupported(String),
}

/// 文件类型解析器
pub trait FileTypeResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> FileTypeResolution;
}

impl<F> FileTypeResolver for F
where
    F: Fn(&Path) -> FileTypeResolution + Send + Sync,
{
    fn resolve(&self, path: &Path) -> FileTypeResolution {
        self(path)
    }
}

/// 基于类型映射表的解析器
#[derive(Debug, Clone)]
pub struct MappingFileTypeResolver {
    table: Arc<TypeMappingTable>,
}

impl MappingFileTypeResolver {
    pub fn new(table: Arc<TypeMappingTable>) -> Self {
        Self { table }
    }
}

impl FileTypeResolver for MappingFileTypeResolver {
    fn resolve(&self, path: &Path) -> FileTypeResolution {
        let info = self.table.classify_path(path);
        if let Some(format) = info.canonical_type().and_then(SpecFormat::from_file_type) {
            return FileTypeResolution::Parser(format);
        }

        // 报错用扩展名: 归类后缀 > 路径扩展名 > 文件名
        let extension = info
            .suffix
            .or_else(|| {
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
            })
            .unwrap_or(info.prefix);
        FileTypeResolution::Unsupported(extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodetect::catalog::builtin_mapping_document;

    fn resolver() -> MappingFileTypeResolver {
        let table = TypeMappingTable::from_document(builtin_mapping_document()).unwrap();
        MappingFileTypeResolver::new(Arc::new(table))
    }

    #[test]
    fn test_resolve_tabular() {
        let r = resolver();
        assert_eq!(
            r.resolve(Path::new("/data/u/spec.csv")),
            FileTypeResolution::Parser(SpecFormat::Csv)
        );
        assert_eq!(
            r.resolve(Path::new("/data/u/SPEC.TSV")),
            FileTypeResolution::Parser(SpecFormat::Tsv)
        );
        assert_eq!(
            r.resolve(Path::new("/data/u/spec.xlsx")),
            FileTypeResolution::Parser(SpecFormat::Excel)
        );
    }

    #[test]
    fn test_resolve_unsupported() {
        let r = resolver();
        assert_eq!(
            r.resolve(Path::new("/data/u/genome.fasta")),
            FileTypeResolution::Unsupported("fasta".to_string())
        );
        assert_eq!(
            r.resolve(Path::new("/data/u/reads.fq.gz")),
            FileTypeResolution::Unsupported("fq.gz".to_string())
        );
        assert_eq!(
            r.resolve(Path::new("/data/u/notes.weird")),
            FileTypeResolution::Unsupported("weird".to_string())
        );
        assert_eq!(
            r.resolve(Path::new("/data/u/README")),
            FileTypeResolution::Unsupported("README".to_string())
        );
    }

    #[test]
    fn test_closure_resolver() {
        let r = |_: &Path| FileTypeResolution::Parser(SpecFormat::Tsv);
        assert_eq!(
            r.resolve(Path::new("anything")),
            FileTypeResolution::Parser(SpecFormat::Tsv)
        );
    }
}
