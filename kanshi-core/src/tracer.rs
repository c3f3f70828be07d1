//! トレーサのイベントループ

use crate::report::report;
use crate::resume::step_over_breakpoint;
use crate::Result;
use kanshi_target::arch::TRAP_WIDTH;
use kanshi_target::{Breakpoint, ExitStatus, Process, ProcessState};
use nix::sys::signal::Signal;
use std::io::Write;

/// トレースの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 報告したブレークポイント到達の回数
    pub hits: usize,
    /// トレース対象の終了状態
    pub exit: ExitStatus,
}

/// トレーサ
///
/// 対象プログラムを起動して1つのブレークポイントを設定し、到達するたびに
/// レジスタを `out` に報告して実行を再開します。対象が終了するまで繰り返します。
pub struct Tracer<W> {
    /// ブレークポイントのアドレス
    address: u64,
    /// 報告の出力先
    out: W,
}

impl<W: Write> Tracer<W> {
    /// 新しいトレーサを作成する
    pub fn new(address: u64, out: W) -> Self {
        Self { address, out }
    }

    /// 報告の出力先を取り出す
    pub fn into_inner(self) -> W {
        self.out
    }

    /// 対象プログラムを起動し、終了するまでトレースする
    ///
    /// 最初の停止より前に対象が終了した場合（実行ファイルが見つからない場合など）は、
    /// ブレークポイントを設定せずに終了します。いずれかの操作が失敗した時点で
    /// ループを中断してエラーを返し、トレース対象は強制終了されます。
    pub fn run(&mut self, program: &str, args: &[String]) -> Result<RunSummary> {
        let mut process = Process::spawn(program, args)?;
        let pid = process.pid();

        // execによる最初のSIGTRAPを待つ
        if let ProcessState::Exited(exit) = process.wait()? {
            tracing::info!(pid, ?exit, "debugee exited");
            return Ok(RunSummary { hits: 0, exit });
        }

        process.kill_on_tracer_exit()?;

        let mut breakpoint = Breakpoint::new(self.address);
        breakpoint.enable(&process.memory()?)?;
        tracing::debug!(
            pid,
            addr = format_args!("{:#x}", self.address),
            "breakpoint installed"
        );

        process.continue_execution(None)?;

        let mut hits = 0;

        loop {
            let signal = match process.wait()? {
                ProcessState::Exited(exit) => {
                    tracing::info!(pid, hits, ?exit, "debugee terminated");
                    return Ok(RunSummary { hits, exit });
                }
                ProcessState::Stopped(signal) => signal,
                state => {
                    tracing::warn!(pid, ?state, "unexpected process state");
                    continue;
                }
            };

            if !self.is_breakpoint_hit(&process, signal)? {
                // 他のシグナルはそのまま配送して再開する
                tracing::warn!(pid, ?signal, "stopped outside the breakpoint");
                process.continue_execution(signal.filter(|&s| s != Signal::SIGTRAP))?;
                continue;
            }

            hits += 1;
            tracing::debug!(pid, hits, "reached breakpoint");

            report(&process, &mut self.out)?;

            let state = step_over_breakpoint(&mut process, &mut breakpoint)?;
            if let ProcessState::Exited(exit) = state {
                tracing::info!(pid, hits, ?exit, "debugee terminated");
                return Ok(RunSummary { hits, exit });
            }
        }
    }

    /// 停止がこのブレークポイントのトラップによるものかどうか
    fn is_breakpoint_hit(&self, process: &Process, signal: Option<Signal>) -> Result<bool> {
        if signal != Some(Signal::SIGTRAP) {
            return Ok(false);
        }

        let pc = process.registers()?.pc()?;
        Ok(pc == self.address.wrapping_add(TRAP_WIDTH))
    }
}
