//! gxcheck: 데이터 품질 체크포인트 실행기
//!
//! 체크포인트(`checkpoints/<name>.yml`)가 가리키는 배치들을 expectation suite와
//! 함께 로드하고 validation operator에 넘깁니다.

pub mod batch;
pub mod checkpoint;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod operator;
pub mod suite;
pub mod usage;
