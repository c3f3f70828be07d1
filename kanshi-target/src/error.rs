//! ターゲット制御のエラー型

use nix::errno::Errno;

/// トレース対象の操作で発生するエラー
///
/// 各バリアントは失敗したOS操作を表し、元のerrnoを保持します。
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// 子プロセスの生成に失敗した
    #[error("fork: {0}")]
    Launch(Errno),

    /// コマンドライン引数にNULバイトが含まれている
    #[error("invalid argument: {0}")]
    Argument(#[from] std::ffi::NulError),

    /// トレースの要求・設定に失敗した
    #[error("{op}: {source}")]
    TraceRequest { op: &'static str, source: Errno },

    /// トレース対象のコードメモリの読み書きに失敗した
    #[error("{op} at {addr:#x}: {source}")]
    MemoryAccess {
        op: &'static str,
        addr: u64,
        source: Errno,
    },

    /// トレース対象のレジスタの読み書きに失敗した
    #[error("{op}: {source}")]
    RegisterAccess { op: &'static str, source: Errno },

    /// シングルステップまたは実行継続の要求に失敗した
    #[error("{op}: {source}")]
    Step { op: &'static str, source: Errno },

    /// 状態変化の待機に失敗した
    #[error("waitpid: {0}")]
    Wait(Errno),

    /// 停止していないプロセスのメモリ・レジスタにアクセスしようとした
    #[error("process {0} is not stopped")]
    NotStopped(i32),
}
