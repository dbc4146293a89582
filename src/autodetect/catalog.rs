// ==========================================
// 暂存服务 - 内置映射目录
// ==========================================
// 职责: 内置的 文件类型 -> 扩展名 / 文件类型 -> 导入 App 表，
//       以及据此生成扩展名映射文档
// 说明: 批量 App、多序列比对、属性映射等导入器不在目录内
// ==========================================

use crate::autodetect::file_type::FileType;
use crate::autodetect::mapping_document::{AppMatch, ExtensionEntry, MappingDocument};
use std::collections::BTreeMap;

// ==========================================
// 导入 App 标识
// ==========================================
pub mod app_ids {
    pub const SRA_READS: &str = "sra_reads";
    pub const FASTQ_READS_INTERLEAVED: &str = "fastq_reads_interleaved";
    pub const FASTQ_READS_NONINTERLEAVED: &str = "fastq_reads_noninterleaved";
    pub const ASSEMBLY: &str = "assembly";
    pub const GFF_GENOME: &str = "gff_genome";
    pub const GFF_METAGENOME: &str = "gff_metagenome";
    pub const GENBANK_GENOME: &str = "genbank_genome";
    pub const DECOMPRESS: &str = "decompress";
    pub const SAMPLE_SET: &str = "sample_set";
    pub const MEDIA: &str = "media";
    pub const EXPRESSION_MATRIX: &str = "expression_matrix";
    pub const METABOLIC_ANNOTATIONS: &str = "metabolic_annotation";
    pub const METABOLIC_ANNOTATIONS_BULK: &str = "metabolic_annotation_bulk";
    pub const FBA_MODEL: &str = "fba_model";
    pub const PHENOTYPE_SET: &str = "phenotype_set";
    pub const ESCHER_MAP: &str = "escher_map";
}

const FASTA_EXTENSIONS: &[&str] = &["fna", "fa", "faa", "fsa", "fasta"];
const FASTQ_EXTENSIONS: &[&str] = &["fq", "fastq"];
const GFF_EXTENSIONS: &[&str] = &["gff", "gff2", "gff3"];
const GENBANK_EXTENSIONS: &[&str] = &["gbk", "gb", "gbff", "genbank"];
const SRA_EXTENSIONS: &[&str] = &["sra"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "tgz", "tar.gz", "7z", "gz", "gzip", "rar"];
const CSV_EXTENSIONS: &[&str] = &["csv"];
const TSV_EXTENSIONS: &[&str] = &["tsv"];
const EXCEL_EXTENSIONS: &[&str] = &["xls", "xlsx"];
const JSON_EXTENSIONS: &[&str] = &["json"];
const SBML_EXTENSIONS: &[&str] = &["sbml", "xml"];

// 序列类文件常以 gzip 压缩形式上传
const GZIP_SUFFIXES: &[&str] = &["gz", "gzip"];

/// 内置类型的扩展名列表（小写）
pub fn builtin_extensions(file_type: &FileType) -> Vec<String> {
    let (base, gzipped) = match file_type {
        FileType::Fasta => (FASTA_EXTENSIONS, true),
        FileType::Fastq => (FASTQ_EXTENSIONS, true),
        FileType::Gff => (GFF_EXTENSIONS, true),
        FileType::Genbank => (GENBANK_EXTENSIONS, true),
        FileType::Sra => (SRA_EXTENSIONS, false),
        FileType::CompressedArchive => (ARCHIVE_EXTENSIONS, false),
        FileType::Csv => (CSV_EXTENSIONS, false),
        FileType::Tsv => (TSV_EXTENSIONS, false),
        FileType::Excel => (EXCEL_EXTENSIONS, false),
        FileType::Json => (JSON_EXTENSIONS, false),
        FileType::Sbml => (SBML_EXTENSIONS, false),
        FileType::Other(_) => return Vec::new(),
    };

    let mut extensions: Vec<String> = base.iter().map(|e| e.to_string()).collect();
    if gzipped {
        for suffix in GZIP_SUFFIXES {
            extensions.extend(base.iter().map(|e| format!("{}.{}", e, suffix)));
        }
    }
    extensions
}

/// 内置的 文件类型 -> 导入 App 表（顺序即生成文档中的候选顺序）
pub fn builtin_app_mappings() -> Vec<(FileType, Vec<&'static str>)> {
    use app_ids::*;

    vec![
        (FileType::Sra, vec![SRA_READS]),
        (
            FileType::Fastq,
            vec![FASTQ_READS_INTERLEAVED, FASTQ_READS_NONINTERLEAVED],
        ),
        (FileType::Fasta, vec![ASSEMBLY, GFF_GENOME, GFF_METAGENOME]),
        (FileType::Genbank, vec![GENBANK_GENOME]),
        (FileType::Gff, vec![GFF_GENOME, GFF_METAGENOME]),
        (FileType::CompressedArchive, vec![DECOMPRESS]),
        (FileType::Csv, vec![SAMPLE_SET]),
        (
            FileType::Tsv,
            vec![
                MEDIA,
                EXPRESSION_MATRIX,
                METABOLIC_ANNOTATIONS,
                METABOLIC_ANNOTATIONS_BULK,
                FBA_MODEL,
                PHENOTYPE_SET,
            ],
        ),
        (FileType::Excel, vec![SAMPLE_SET, MEDIA, FBA_MODEL]),
        (FileType::Json, vec![ESCHER_MAP]),
        (FileType::Sbml, vec![FBA_MODEL]),
    ]
}

/// 由 文件类型 -> App 表与 文件类型 -> 扩展名表 生成扩展名映射文档
///
/// # 算法
/// 1. 对每个 App，汇总其接受的全部文件类型的扩展名
/// 2. 对每个 (App, 扩展名)，向该扩展名追加一条完全匹配 {id, app_weight=1, file_type}
/// 3. 同一扩展名对应多个 App 时全部保留，不做额外排序
///
/// # 参数
/// - format_to_apps: 文件类型 -> App 列表
/// - format_to_extensions: 文件类型 -> 扩展名查询函数
pub fn generate_mapping_document<F>(
    format_to_apps: &[(FileType, Vec<&str>)],
    format_to_extensions: F,
) -> MappingDocument
where
    F: Fn(&FileType) -> Vec<String>,
{
    // 扩展名 -> 文件类型（每个扩展名只归属一个类型）
    let mut extension_types: BTreeMap<String, FileType> = BTreeMap::new();
    // App -> 扩展名，保持首次出现顺序
    let mut app_extensions: Vec<(String, Vec<String>)> = Vec::new();

    for (file_type, apps) in format_to_apps {
        let extensions = format_to_extensions(file_type);
        for ext in &extensions {
            extension_types
                .entry(ext.clone())
                .or_insert_with(|| file_type.clone());
        }
        for app in apps {
            match app_extensions.iter_mut().find(|(id, _)| id == app) {
                Some((_, exts)) => exts.extend(extensions.iter().cloned()),
                None => app_extensions.push((app.to_string(), extensions.clone())),
            }
        }
    }

    let mut types: BTreeMap<String, ExtensionEntry> = BTreeMap::new();
    for (app_id, extensions) in &app_extensions {
        for ext in extensions {
            let Some(file_type) = extension_types.get(ext) else {
                continue;
            };
            types
                .entry(ext.clone())
                .or_insert_with(|| ExtensionEntry {
                    file_ext_type: vec![file_type.clone()],
                    mappings: Vec::new(),
                })
                .mappings
                .push(AppMatch::perfect(app_id.clone(), file_type.clone()));
        }
    }

    MappingDocument { types }
}

/// 生成内置映射文档
pub fn builtin_mapping_document() -> MappingDocument {
    generate_mapping_document(&builtin_app_mappings(), builtin_extensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_extensions_unique_across_types() {
        let mut seen = HashSet::new();
        for file_type in FileType::BUILTIN.iter() {
            for ext in builtin_extensions(file_type) {
                assert!(seen.insert(ext.clone()), "扩展名重复: {}", ext);
            }
        }
    }

    #[test]
    fn test_gzip_variants_for_sequence_types() {
        let fasta = builtin_extensions(&FileType::Fasta);
        assert!(fasta.contains(&"fa".to_string()));
        assert!(fasta.contains(&"fa.gz".to_string()));
        assert!(fasta.contains(&"fasta.gzip".to_string()));

        let csv = builtin_extensions(&FileType::Csv);
        assert_eq!(csv, vec!["csv".to_string()]);
    }

    #[test]
    fn test_generated_document_keeps_ties() {
        let doc = builtin_mapping_document();

        let gff3 = &doc.types["gff3"];
        assert_eq!(gff3.file_ext_type, vec![FileType::Gff]);
        let ids: Vec<&str> = gff3.mappings.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![app_ids::GFF_GENOME, app_ids::GFF_METAGENOME]);
        assert!(gff3.mappings.iter().all(|m| m.app_weight == 1.0));

        let fa = &doc.types["fa"];
        let ids: Vec<&str> = fa.mappings.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![app_ids::ASSEMBLY, app_ids::GFF_GENOME, app_ids::GFF_METAGENOME]
        );
    }

    #[test]
    fn test_generated_document_multi_type_app() {
        let doc = builtin_mapping_document();

        let xlsx = &doc.types["xlsx"];
        assert_eq!(xlsx.file_ext_type, vec![FileType::Excel]);
        let ids: Vec<&str> = xlsx.mappings.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![app_ids::SAMPLE_SET, app_ids::MEDIA, app_ids::FBA_MODEL]
        );
        assert_eq!(xlsx.mappings[0].file_type, vec![FileType::Excel]);

        let tar_gz = &doc.types["tar.gz"];
        assert_eq!(tar_gz.file_ext_type, vec![FileType::CompressedArchive]);
    }
}
