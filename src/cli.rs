// ==========================================
// 暂存服务 - 命令行参数
// ==========================================
// 使用 clap derive 定义子命令
// ==========================================

use clap::{Parser, Subcommand, ValueEnum};
use staging_service::SpecFormat;
use std::path::PathBuf;

/// 模板输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "UPPER")]
pub enum OutputFormat {
    Csv,
    Tsv,
    Excel,
}

impl From<OutputFormat> for SpecFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => SpecFormat::Csv,
            OutputFormat::Tsv => SpecFormat::Tsv,
            OutputFormat::Excel => SpecFormat::Excel,
        }
    }
}

/// staging-service 命令行
#[derive(Parser, Debug)]
#[command(
    name = "staging-service",
    version,
    about = "Staging service core: file type autodetection and bulk import specifications",
    long_about = r#"
Staging service core
====================

Classifies uploaded files by extension, maps them to importer apps, and
parses or writes bulk import specifications (CSV / TSV / Excel).

The extension mapping document is read from STAGING_SERVICE_CONFIG (or
STAGING_SERVICE_FILE_EXTENSION_MAPPINGS); the built-in catalog is used when
neither is set.

Examples:
  staging-service mappings reads.fq.gz assembly.fasta
  staging-service parse specs/genomes.csv specs/reads.xlsx
  staging-service write --format EXCEL --output-dir out --types types.json
"#
)]
pub struct Cli {
    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    pub log_json: bool,

    /// 美化 JSON 输出
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the app -> file types and file type -> extensions tables
    Filetypes,

    /// Print candidate importer apps for file names
    Mappings {
        /// File names (only the name is inspected)
        files: Vec<String>,
    },

    /// Parse import specification files given by path
    Parse {
        paths: Vec<PathBuf>,
    },

    /// Parse import specifications from a user's staging area
    BulkSpecification {
        /// Staging area owner
        #[arg(long)]
        user: String,

        /// Comma separated paths relative to the user's staging area
        #[arg(long)]
        files: String,
    },

    /// Write import specification templates
    Write {
        #[arg(long, value_enum)]
        format: OutputFormat,

        /// Existing output directory
        #[arg(long)]
        output_dir: PathBuf,

        /// JSON file mapping data type -> {order_and_display, data}
        #[arg(long)]
        types: PathBuf,
    },

    /// Print the built-in extension mapping document
    GenerateMappings,
}
