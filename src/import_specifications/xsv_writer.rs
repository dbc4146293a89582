// ==========================================
// 暂存服务 - CSV / TSV 模板写出
// ==========================================
// 输出: 每个数据类型一个文件 <datatype>.csv / <datatype>.tsv
// 说明: 全部内容先在内存中渲染，校验与渲染都成功后才落盘；
//       落盘中途失败时删除本次已写出的文件
// ==========================================

use crate::import_specifications::error::{WriteError, WriteResult};
use crate::import_specifications::format::ImportSpecWriter;
use crate::import_specifications::header::format_header;
use crate::import_specifications::types::{TemplateSpec, TemplateSpecs};
use crate::import_specifications::validation::check_write_args;
use csv::{Terminator, WriterBuilder};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 分隔符文本模板写出器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XsvWriter {
    delimiter: u8,
    extension: &'static str,
}

impl XsvWriter {
    pub const CSV: XsvWriter = XsvWriter {
        delimiter: b',',
        extension: "csv",
    };
    pub const TSV: XsvWriter = XsvWriter {
        delimiter: b'\t',
        extension: "tsv",
    };

    /// 渲染单个数据类型的模板内容
    pub fn render(&self, datatype: &str, spec: &TemplateSpec) -> WriteResult<Vec<u8>> {
        let param_ids = spec.param_ids();

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true) // 首行只有一列
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record([format_header(datatype, param_ids.len())])?;
        writer.write_record(&param_ids)?;
        writer.write_record(spec.display_names())?;
        for row in &spec.data {
            writer.write_record(
                param_ids
                    .iter()
                    .map(|id| row.get(*id).map(|v| v.to_string()).unwrap_or_default()),
            )?;
        }

        writer
            .into_inner()
            .map_err(|e| WriteError::Csv(io::Error::new(io::ErrorKind::Other, e.to_string()).into()))
    }
}

impl ImportSpecWriter for XsvWriter {
    fn write(&self, folder: &Path, types: &TemplateSpecs) -> WriteResult<BTreeMap<String, String>> {
        check_write_args(folder, types)?;

        let mut rendered = Vec::with_capacity(types.len());
        for (datatype, spec) in types {
            let file_name = format!("{}.{}", datatype, self.extension);
            rendered.push((datatype, file_name, self.render(datatype, spec)?));
        }

        let mut created = BTreeMap::new();
        let mut written = Vec::with_capacity(rendered.len());
        for (datatype, file_name, content) in rendered {
            let path = folder.join(&file_name);
            if let Err(e) = fs::write(&path, content) {
                remove_written(&written);
                return Err(WriteError::Io { path, source: e });
            }
            info!(file = %path.display(), datatype = %datatype, "模板已写出");
            written.push(path);
            created.insert(datatype.clone(), file_name);
        }
        Ok(created)
    }
}

// 写出中途失败时删除本次已写出的文件，不留部分结果
fn remove_written(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!(file = %path.display(), error = %e, "无法删除部分写出的模板");
        }
    }
}
