// ==========================================
// 暂存服务 - 导入规范解析分派
// ==========================================
// 职责: 按文件类型分派解析器，合并各文件结果并检测数据类型冲突
// 流程: 解析类型 → 逐文件解析 → 按输入顺序合并
// 规则: 任一文件出错则整体返回错误列表（收集全部错误，不提前终止）；
//       重复路径只解析一次
// ==========================================

use crate::import_specifications::error::{SpecError, SpecificationSource};
use crate::import_specifications::resolver::{FileTypeResolution, FileTypeResolver};
use crate::import_specifications::types::{ParseResult, ParseResults};
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// 未预期错误的记录回调
pub type ErrorLogger = dyn Fn(&anyhow::Error) + Send + Sync;

/// 默认记录方式: 以 error 级别写入日志（含错误链）
pub fn log_unexpected_error(err: &anyhow::Error) {
    error!(error = ?err, "解析导入规范时发生未预期错误");
}

/// 解析一组导入规范文件
///
/// # 参数
/// - paths: 待解析文件（顺序决定冲突报告中的先后来源）
/// - resolver: 文件类型解析器
/// - log_error: 未预期错误的记录回调
///
/// # 返回
/// - ParseResults::Results: 数据类型 -> 解析结果
/// - ParseResults::Errors: 全部文件的错误（含数据类型冲突）
pub fn parse_import_specifications(
    paths: &[PathBuf],
    resolver: &dyn FileTypeResolver,
    log_error: &ErrorLogger,
) -> ParseResults {
    if paths.is_empty() {
        return ParseResults::error(SpecError::no_files_provided());
    }

    let outcomes: Vec<ParseResults> = unique_paths(paths)
        .into_iter()
        .map(|path| parse_one(&path, resolver, log_error))
        .collect();
    merge_outcomes(outcomes)
}

/// 并发解析一组导入规范文件
///
/// 每个文件在阻塞线程池中解析，结果按输入顺序合并，
/// 与 parse_import_specifications 的结果一致
pub async fn parse_import_specifications_concurrently(
    paths: Vec<PathBuf>,
    resolver: Arc<dyn FileTypeResolver>,
    log_error: Arc<ErrorLogger>,
) -> ParseResults {
    if paths.is_empty() {
        return ParseResults::error(SpecError::no_files_provided());
    }

    let paths = unique_paths(&paths);
    info!(count = paths.len(), "开始并发解析导入规范");

    let tasks = paths.into_iter().map(|path| {
        let resolver = Arc::clone(&resolver);
        let log_error = Arc::clone(&log_error);
        async move {
            let task_path = path.clone();
            let task_logger = Arc::clone(&log_error);
            let joined = tokio::task::spawn_blocking(move || {
                parse_one(&task_path, resolver.as_ref(), task_logger.as_ref())
            })
            .await;

            match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    // 解析任务 panic 或被取消，按未预期错误处理
                    let err = anyhow::anyhow!("parser task for {} failed: {}", path.display(), e);
                    log_error(&err);
                    ParseResults::error(SpecError::other(
                        err.to_string(),
                        Some(SpecificationSource::new(path)),
                    ))
                }
            }
        }
    });

    merge_outcomes(join_all(tasks).await)
}

// 同一文件列出多次时只保留首次出现，避免与自身产生数据类型冲突
fn unique_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter(|p| seen.insert(p.as_path()))
        .cloned()
        .collect()
}

/// 解析单个文件；未预期错误经回调记录后转为 OTHER
pub(crate) fn parse_one(
    path: &Path,
    resolver: &dyn FileTypeResolver,
    log_error: &ErrorLogger,
) -> ParseResults {
    match resolver.resolve(path) {
        FileTypeResolution::Unsupported(extension) => {
            debug!(file = %path.display(), extension = %extension, "不支持的导入规范类型");
            ParseResults::error(SpecError::unsupported_type(
                &extension,
                SpecificationSource::new(path),
            ))
        }
        FileTypeResolution::Parser(format) => match format.parse(path) {
            Ok(outcome) => outcome,
            Err(err) => {
                log_error(&err);
                ParseResults::error(SpecError::other(
                    err.to_string(),
                    Some(SpecificationSource::new(path)),
                ))
            }
        },
    }
}

/// 按输入顺序合并各文件结果
///
/// 同一数据类型出现在多个来源时，先出现的来源记为 source_1
pub(crate) fn merge_outcomes<I>(outcomes: I) -> ParseResults
where
    I: IntoIterator<Item = ParseResults>,
{
    let mut results: BTreeMap<String, ParseResult> = BTreeMap::new();
    let mut errors: Vec<SpecError> = Vec::new();

    for outcome in outcomes {
        match outcome {
            ParseResults::Errors(errs) => errors.extend(errs),
            ParseResults::Results(parsed) => {
                for (datatype, result) in parsed {
                    match results.get(&datatype) {
                        Some(existing) => errors.push(SpecError::multiple_specifications(
                            format!(
                                "Data type {} appears in two importer specification sources",
                                datatype
                            ),
                            existing.source.clone(),
                            result.source,
                        )),
                        None => {
                            results.insert(datatype, result);
                        }
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        ParseResults::Results(results)
    } else {
        ParseResults::Errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_specifications::error::ErrorKind;
    use crate::import_specifications::format::SpecFormat;
    use crate::import_specifications::types::{CellValue, Row};
    use std::sync::Mutex;

    fn result(file: &str, value: i64) -> ParseResult {
        let row: Row = [("a".to_string(), CellValue::Int(value))].into_iter().collect();
        ParseResult::new(SpecificationSource::new(file), vec![row])
    }

    fn no_log(_: &anyhow::Error) {}

    #[test]
    fn test_empty_paths() {
        let resolver = |_: &Path| FileTypeResolution::Parser(SpecFormat::Csv);
        let outcome = parse_import_specifications(&[], &resolver, &no_log);
        assert_eq!(outcome.errors()[0].kind(), ErrorKind::NoFilesProvided);
    }

    #[test]
    fn test_merge_detects_collisions() {
        let merged = merge_outcomes(vec![
            ParseResults::single("genome", result("/a.csv", 1)),
            ParseResults::single("reads", result("/b.csv", 2)),
            ParseResults::single("genome", result("/c.csv", 3)),
        ]);

        let errors = merged.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::MultipleSpecificationsForDataType);
        assert_eq!(
            errors[0].message(),
            Some("Data type genome appears in two importer specification sources")
        );
        assert_eq!(errors[0].file(), Some(Path::new("/a.csv")));
        assert_eq!(
            errors[0].source_2().map(|s| s.file.as_path()),
            Some(Path::new("/c.csv"))
        );
    }

    #[test]
    fn test_merge_collects_all_errors() {
        let merged = merge_outcomes(vec![
            ParseResults::single("genome", result("/a.csv", 1)),
            ParseResults::error(SpecError::file_not_found(SpecificationSource::new("/x.csv"))),
            ParseResults::error(SpecError::parse_fail("bad", SpecificationSource::new("/y.csv"))),
        ]);
        let kinds: Vec<ErrorKind> = merged.errors().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::FileNotFound, ErrorKind::ParseFail]);
    }

    #[test]
    fn test_unsupported_type() {
        let resolver = |_: &Path| FileTypeResolution::Unsupported("fasta".to_string());
        let outcome =
            parse_import_specifications(&[PathBuf::from("/g.fasta")], &resolver, &no_log);
        let errors = outcome.errors();
        assert_eq!(errors[0].kind(), ErrorKind::UnsupportedType);
        assert_eq!(
            errors[0].message(),
            Some("fasta is not a supported file type for import specifications")
        );
    }

    #[test]
    fn test_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.csv");
        std::fs::write(&path, "Data type: genome; Columns: 1; Version: 1\nid\nID\ng1\n").unwrap();

        let resolver = |_: &Path| FileTypeResolution::Parser(SpecFormat::Csv);
        let outcome = parse_import_specifications(&[path.clone()], &resolver, &no_log);
        let results = outcome.results().unwrap();
        assert_eq!(results["genome"].source.file, path);
    }

    #[tokio::test]
    async fn test_repeated_path_is_parsed_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.csv");
        std::fs::write(&path, "Data type: genome; Columns: 1; Version: 1\nid\nID\ng1\n").unwrap();
        let paths = vec![path.clone(), path.clone()];

        let resolver = |_: &Path| FileTypeResolution::Parser(SpecFormat::Csv);
        let sequential = parse_import_specifications(&paths, &resolver, &no_log);
        assert_eq!(sequential.results().unwrap()["genome"].source.file, path);

        let concurrent =
            parse_import_specifications_concurrently(paths, Arc::new(resolver), Arc::new(no_log))
                .await;
        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.tsv");
        std::fs::write(&a, "Data type: genome; Columns: 1; Version: 1\nid\nID\ng1\n").unwrap();
        std::fs::write(&b, "Data type: genome; Columns: 1; Version: 1\nid\nID\ng2\n").unwrap();
        let paths = vec![a.clone(), b.clone(), dir.path().join("missing.csv")];

        let resolver = |p: &Path| match p.extension().and_then(|e| e.to_str()) {
            Some("tsv") => FileTypeResolution::Parser(SpecFormat::Tsv),
            _ => FileTypeResolution::Parser(SpecFormat::Csv),
        };
        let sequential = parse_import_specifications(&paths, &resolver, &no_log);

        let concurrent = parse_import_specifications_concurrently(
            paths,
            Arc::new(resolver),
            Arc::new(no_log),
        )
        .await;

        assert_eq!(sequential, concurrent);
        let errors = concurrent.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].file(), Some(a.as_path()));
        assert_eq!(errors[1].kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn test_unreadable_workbook_is_not_logged() {
        struct ExcelOnly;
        impl FileTypeResolver for ExcelOnly {
            fn resolve(&self, _: &Path) -> FileTypeResolution {
                FileTypeResolution::Parser(SpecFormat::Excel)
            }
        }

        // 无法打开工作簿属于可预期错误，不触发回调
        let logged = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&logged);
        let logger = move |_: &anyhow::Error| *counter.lock().unwrap() += 1;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.xlsx");
        std::fs::write(&path, "not a workbook").unwrap();

        let outcome = parse_import_specifications(&[path], &ExcelOnly, &logger);
        assert_eq!(outcome.errors()[0].kind(), ErrorKind::ParseFail);
        assert_eq!(*logged.lock().unwrap(), 0);
    }
}
