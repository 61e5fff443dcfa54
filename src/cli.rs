use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gxcheck")]
#[command(version)]
#[command(about = "Run data-quality checkpoints", long_about = None)]
pub struct Cli {
    /// 디버그 로그 출력
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 체크포인트 관리 (list, run)
    #[command(subcommand)]
    Checkpoint(CheckpointCommand),
}

#[derive(Subcommand, Debug)]
pub enum CheckpointCommand {
    /// 프로젝트의 체크포인트 목록
    List(ProjectArgs),

    /// 체크포인트 실행
    Run {
        /// 실행할 체크포인트 이름
        checkpoint: String,

        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// 프로젝트 디렉토리 (great_expectations.yml이 있는 곳)
    #[arg(short = 'd', long)]
    pub directory: Option<String>,
}

impl Cli {
    /// 로그 레벨: `--debug`가 설정보다 우선
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        if self.debug {
            "debug"
        } else {
            configured
        }
    }
}
