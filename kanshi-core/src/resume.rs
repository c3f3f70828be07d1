//! ブレークポイントからの再開

use crate::Result;
use kanshi_target::arch::TRAP_WIDTH;
use kanshi_target::{Breakpoint, Process, ProcessState};
use nix::sys::signal::Signal;

/// ブレークポイントで停止したプロセスを、元の命令を1つ実行してから再開する
///
/// 1. 元のワードを書き戻してトラップを取り除く
/// 2. 命令ポインタをトラップ命令の幅だけ戻す
/// 3. 1命令だけ実行する
/// 4. 同じアドレスに再びトラップを設定する（ループや再帰で再到達するため）
/// 5. 次の停止まで実行を継続する
///
/// ステップ実行中にプロセスが終了した場合は、それ以降の手順を行わずに
/// 終了状態を返します。
pub fn step_over_breakpoint(
    process: &mut Process,
    breakpoint: &mut Breakpoint,
) -> Result<ProcessState> {
    breakpoint.disable(&process.memory()?)?;

    let pc = process.registers()?.rewind_pc(TRAP_WIDTH)?;
    tracing::trace!(
        pid = process.pid(),
        pc = format_args!("{pc:#x}"),
        "rewound to breakpoint"
    );

    let state = process.step()?;
    if state.is_exited() {
        return Ok(state);
    }

    breakpoint.enable(&process.memory()?)?;

    // ステップ中に受け取ったシグナルは捨てずに配送する
    let pending = match state {
        ProcessState::Stopped(Some(signal)) if signal != Signal::SIGTRAP => Some(signal),
        _ => None,
    };
    process.continue_execution(pending)?;

    Ok(process.state())
}
