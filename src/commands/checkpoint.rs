use crate::checkpoint::run_checkpoint;
use crate::commands::ExitStatus;
use crate::config::Config;
use crate::context::{DataContext, FileDataContext};
use crate::error::GxError;
use crate::usage::{UsageEvent, CHECKPOINT_LIST, CHECKPOINT_RUN};
use colored::*;

fn open_context(directory: Option<&str>, config: &Config) -> Option<FileDataContext> {
    let directory = config.project_directory(directory);
    match FileDataContext::open(&directory, config.usage_statistics_enabled()) {
        Ok(context) => Some(context),
        Err(e) => {
            tracing::debug!(error = ?e, "failed to open data context");
            println!("{}", e.to_string().red());
            None
        }
    }
}

/// `checkpoint list`
pub fn list(directory: Option<&str>, config: &Config) -> ExitStatus {
    match open_context(directory, config) {
        Some(context) => list_with(&context),
        None => ExitStatus::Failure,
    }
}

/// 열린 context로 체크포인트 목록 출력
pub fn list_with(context: &dyn DataContext) -> ExitStatus {
    let checkpoints = match context.list_checkpoints() {
        Ok(checkpoints) => checkpoints,
        Err(e) => {
            println!("{}", e.to_string().red());
            context.emit_usage(UsageEvent::new(CHECKPOINT_LIST, false));
            return ExitStatus::Failure;
        }
    };

    if checkpoints.is_empty() {
        println!(
            "{}\n  - Add a `checkpoints/<name>.yml` file to create one.",
            "No checkpoints found.".yellow()
        );
    } else {
        println!("{}", found_message(checkpoints.len()));
        for name in &checkpoints {
            println!(" - {}", name.cyan());
        }
    }

    context.emit_usage(UsageEvent::new(CHECKPOINT_LIST, true));
    ExitStatus::Success
}

/// `checkpoint run NAME`
pub fn run(checkpoint_name: &str, directory: Option<&str>, config: &Config) -> ExitStatus {
    match open_context(directory, config) {
        Some(context) => run_with(&context, checkpoint_name),
        None => ExitStatus::Failure,
    }
}

/// 열린 context로 체크포인트 실행
///
/// 실행이 끝나면 검증 실패여도 성공 이벤트를, 중단되면 실패 이벤트를 하나 남깁니다.
pub fn run_with(context: &dyn DataContext, checkpoint_name: &str) -> ExitStatus {
    match run_checkpoint(context, checkpoint_name) {
        Ok(result) => {
            context.emit_usage(UsageEvent::new(CHECKPOINT_RUN, true));
            tracing::info!(
                checkpoint = %checkpoint_name,
                success = result.success,
                batches = result.run_results.len(),
                "checkpoint finished"
            );

            if result.success {
                println!("{}", "Validation Succeeded!".green());
                ExitStatus::Success
            } else {
                println!("{}", "Validation Failed!".red());
                ExitStatus::Failure
            }
        }
        Err(e) => {
            if e.is_user_correctable() {
                tracing::debug!(error = ?e, "checkpoint run aborted");
            } else {
                tracing::warn!(checkpoint = %checkpoint_name, error = %e, "checkpoint run failed");
            }
            println!("{}", failure_message(checkpoint_name, &e).red());
            context.emit_usage(UsageEvent::new(CHECKPOINT_RUN, false));
            ExitStatus::Failure
        }
    }
}

fn found_message(count: usize) -> String {
    let plural = if count > 1 { "s" } else { "" };
    format!("Found {} checkpoint{}.", count, plural)
}

/// 실행 실패를 사용자용 메시지로 변환
pub fn failure_message(checkpoint_name: &str, err: &GxError) -> String {
    match err {
        GxError::CheckpointNotFound(name) => format!(
            "{}\n  Try running:\n  - `gxcheck checkpoint list` to verify your checkpoint exists\n  - add `checkpoints/{}.yml` to configure a new checkpoint",
            err, name
        ),
        GxError::SuiteNotFound { available, .. } if !available.is_empty() => {
            let suites: Vec<String> = available.iter().map(|s| format!("  - {}", s)).collect();
            format!("{}\n  Available suites:\n{}", err, suites.join("\n"))
        }
        GxError::SuiteNotFound { .. } => {
            format!("{}\n  This project has no expectation suites.", err)
        }
        GxError::BatchLoad {
            checkpoint_file,
            source,
            ..
        } => format!(
            "{}\n  {}\nPlease verify these batch kwargs in the checkpoint file: `{}`",
            err, source, checkpoint_file
        ),
        GxError::EmptySuiteList {
            batch_kwargs,
            checkpoint_file,
        } => format!(
            "{}\n    - Batch: {}\n    - Please add at least one suite to your checkpoint file: {}",
            err, batch_kwargs, checkpoint_file
        ),
        GxError::Checkpoint(_) | GxError::ValidationOperatorNotFound(_) => err.to_string(),
        other => format!("Checkpoint `{}` could not be run: {}", checkpoint_name, other),
    }
}
