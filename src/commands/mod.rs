pub mod checkpoint;

use crate::cli::{CheckpointCommand, Command};
use crate::config::Config;

/// 프로세스 종료 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

/// 서브커맨드 실행
pub fn dispatch(command: &Command, config: &Config) -> ExitStatus {
    match command {
        Command::Checkpoint(CheckpointCommand::List(project)) => {
            checkpoint::list(project.directory.as_deref(), config)
        }
        Command::Checkpoint(CheckpointCommand::Run {
            checkpoint: name,
            project,
        }) => checkpoint::run(name, project.directory.as_deref(), config),
    }
}
