//! alt-text CLI
//!
//! 호스트 없이 명령을 실행하는 얇은 진입점. 결과는 JSON으로 stdout에 출력하고,
//! 로그는 stderr로 보냅니다.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use alt_text_lib::commands::{analyze, bulk, settings, stats, AnalyzerState};
use alt_text_lib::db::{Database, DbState};
use alt_text_lib::models::{Attachment, SavedAltText, SettingsInput};
use alt_text_lib::{AltTextError, CommandError, VisionConfig};

#[derive(Parser)]
#[command(name = "alt-text", version, about = "AI alt text generator for image libraries")]
struct Cli {
    /// SQLite 데이터베이스 경로
    #[arg(long, global = true, default_value = "alt-text.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 설정 저장 (API 키는 암호화되어 저장됨)
    Configure {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        suffix: Option<String>,
        #[arg(long)]
        auto_generate: bool,
        #[arg(long)]
        update_title: bool,
        #[arg(long)]
        update_caption: bool,
        #[arg(long)]
        update_description: bool,
    },
    /// 현재 설정 조회
    Settings,
    /// 이미지 등록 (자동 생성이 켜져 있으면 바로 분석)
    Attach {
        id: i64,
        url: String,
        #[arg(long)]
        mime_type: Option<String>,
    },
    /// 이미지 1개 분석
    Analyze { id: i64 },
    /// alt text 수동 저장
    Save { id: i64, alt_text: String },
    /// 순차 일괄 분석 (ID 생략 시 alt text 없는 이미지 전체)
    Bulk { ids: Vec<i64> },
    /// alt text 적용 현황
    Stats,
    /// 설정과 암호화 키 삭제
    Uninstall,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::from(AltTextError::from(e)))?;
    println!("{}", out);
    Ok(())
}

fn open_state(path: &Path) -> Result<DbState, CommandError> {
    let db = Database::new(path).map_err(|e| CommandError::from(AltTextError::from(e)))?;
    db.initialize().map_err(|e| CommandError::from(AltTextError::from(e)))?;
    Ok(DbState::new(db))
}

fn analyzer_state() -> Result<AnalyzerState, CommandError> {
    VisionConfig::from_env()
        .and_then(AnalyzerState::new)
        .map_err(CommandError::from)
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let state = open_state(&cli.db)?;

    match cli.command {
        Command::Configure {
            api_key,
            prefix,
            suffix,
            auto_generate,
            update_title,
            update_caption,
            update_description,
        } => {
            let view = settings::save_settings(
                &state,
                SettingsInput {
                    api_key,
                    prefix,
                    suffix,
                    auto_generate: Some(auto_generate),
                    update_title: Some(update_title),
                    update_caption: Some(update_caption),
                    update_description: Some(update_description),
                },
            )?;
            print_json(&view)
        }
        Command::Settings => print_json(&settings::load_settings(&state)?),
        Command::Attach { id, url, mime_type } => {
            let mut attachment = Attachment::new(id, url);
            attachment.mime_type = mime_type;
            analyze::register_attachment(&state, &attachment)?;

            // 자동 생성이 꺼져 있으면 분석기 설정을 읽지 않음
            if !analyze::auto_generate_enabled(&state)? {
                return print_json(&None::<SavedAltText>);
            }
            let analyzer = analyzer_state()?;
            let outcome = analyze::handle_new_image(&state, &analyzer, id).await?;
            print_json(&outcome)
        }
        Command::Analyze { id } => {
            let analyzer = analyzer_state()?;
            print_json(&analyze::analyze_image(&state, &analyzer, id).await?)
        }
        Command::Save { id, alt_text } => {
            print_json(&analyze::save_alt_text(&state, id, &alt_text)?)
        }
        Command::Bulk { ids } => {
            let analyzer = analyzer_state()?;
            print_json(&bulk::bulk_analyze(&state, &analyzer, ids).await?)
        }
        Command::Stats => print_json(&stats::coverage_stats(&state)?),
        Command::Uninstall => {
            settings::uninstall(&state)?;
            print_json(&serde_json::json!({ "uninstalled": true }))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_loaded = alt_text_lib::load_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = env_loaded {
        tracing::warn!(error = %e, "failed to parse .env.local");
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = print_json(&e);
            tracing::error!(code = %e.code, "command failed");
            ExitCode::FAILURE
        }
    }
}
