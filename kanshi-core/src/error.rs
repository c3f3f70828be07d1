//! トレーサのエラー型

/// トレーサの実行中に発生するエラー
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// トレース対象の操作に失敗した
    #[error(transparent)]
    Target(#[from] kanshi_target::Error),

    /// レジスタの報告を出力できなかった
    #[error("write report: {0}")]
    Output(#[from] std::io::Error),
}
