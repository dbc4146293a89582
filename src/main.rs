// ==========================================
// 暂存服务 - 命令行入口
// ==========================================
// 输出: 成功时向 stdout 打印 JSON；失败时打印 {status, body} 并以非零码退出
// ==========================================

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use serde::Serialize;
use staging_service::api::{success_response, ApiError, ApiResult, WriteBulkSpecificationResponse};
use staging_service::autodetect::catalog::builtin_mapping_document;
use staging_service::import_specifications::{
    classify_errors, log_unexpected_error, parse_import_specifications_concurrently,
    write_import_specification, FileTypeResolver, ParseResults, SpecFormat, TemplateSpecs,
};
use staging_service::logging::{self, LogFormat};
use staging_service::AppState;
use std::collections::HashMap;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // 初始化日志系统
    logging::init_with(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    tracing::debug!(version = staging_service::VERSION, "staging-service 启动");

    // 映射表加载失败时不继续执行
    let state = AppState::from_env()
        .await
        .context("无法初始化应用状态")?;

    match run(&state, cli.command).await {
        Ok(value) => {
            print_json(&value, cli.pretty)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::warn!(status = err.http_status(), error = %err, "命令执行失败");
            let payload = serde_json::json!({
                "status": err.http_status(),
                "body": err.body(),
            });
            print_json(&payload, cli.pretty)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(state: &AppState, command: Command) -> ApiResult<serde_json::Value> {
    let api = &state.bulk_specification_api;

    match command {
        Command::Filetypes => to_json(&api.importer_filetypes()),
        Command::Mappings { files } => to_json(&api.importer_mappings(&files)?),
        Command::Parse { paths } => {
            let resolver: Arc<dyn FileTypeResolver> = Arc::new(state.resolver());
            let outcome = parse_import_specifications_concurrently(
                paths,
                resolver,
                Arc::new(log_unexpected_error),
            )
            .await;
            match outcome {
                ParseResults::Results(results) => {
                    to_json(&success_response(results, &HashMap::new()))
                }
                ParseResults::Errors(errors) => Err(ApiError::ImportSpecification(
                    classify_errors(&errors, &HashMap::new()),
                )),
            }
        }
        Command::BulkSpecification { user, files } => {
            to_json(&api.bulk_specification(&user, &files).await?)
        }
        Command::Write {
            format,
            output_dir,
            types,
        } => {
            let text = tokio::fs::read_to_string(&types).await.map_err(|e| {
                ApiError::InvalidInput(format!("Unable to read {}: {}", types.display(), e))
            })?;
            let specs: TemplateSpecs = serde_json::from_str(&text).map_err(|e| {
                ApiError::InvalidInput(format!("Invalid template specification: {}", e))
            })?;

            let format = SpecFormat::from(format);
            let created = write_import_specification(&output_dir, format, &specs)?;
            to_json(&WriteBulkSpecificationResponse {
                output_file_type: format,
                files_created: created
                    .into_iter()
                    .map(|(datatype, name)| {
                        (datatype, output_dir.join(name).to_string_lossy().into_owned())
                    })
                    .collect(),
            })
        }
        Command::GenerateMappings => to_json(&builtin_mapping_document()),
    }
}

fn to_json<T: Serialize>(value: &T) -> ApiResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Other(e.into()))
}

fn print_json(value: &serde_json::Value, pretty: bool) -> anyhow::Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}
