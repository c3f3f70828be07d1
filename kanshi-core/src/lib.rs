//! Kanshi トレーサのコア機能
//!
//! このクレートは、トレーサの中核となるロジックを提供します。
//! ブレークポイントへの到達ごとにレジスタを報告し、ブレークポイントを
//! 踏み越えて実行を再開するイベントループを実装します。

pub mod error;
pub mod parse;
pub mod report;
pub mod resume;
pub mod tracer;

pub use error::Error;
pub use report::RegisterSnapshot;
pub use tracer::{RunSummary, Tracer};

// 他のクレートから使用するために再エクスポート
pub use kanshi_target::{ExitStatus, ProcessState};

/// トレーサの結果型
pub type Result<T> = std::result::Result<T, Error>;
