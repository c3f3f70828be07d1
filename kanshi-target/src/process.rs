//! プロセス制御機能

use crate::{Error, Memory, Registers, Result};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::ptrace;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{execvp, fork, pipe2, ForkResult, Pid};
use std::ffi::CString;
use std::fs::File;
use std::io::{Read, Write as _};

/// 子プロセスでexecvpが失敗した場合の終了コード
const EXEC_FAILURE_CODE: i32 = 127;

/// パイプで送るerrnoのサイズ
const ERRNO_SIZE: usize = std::mem::size_of::<i32>();

/// 子プロセスがパイプに書いたTRACEMEの結果を読み取る
///
/// 何も書かれずにパイプが閉じられた（execで閉じたか、exec失敗で終了した）場合は成功です。
/// errnoがちょうど4バイト書かれていればTRACEMEの失敗、それ以外は起動の失敗です。
fn read_trace_request_status<R: Read>(channel: &mut R) -> Result<()> {
    let mut report = Vec::with_capacity(ERRNO_SIZE);
    channel
        .read_to_end(&mut report)
        .map_err(|e| Error::Launch(e.raw_os_error().map_or(Errno::EIO, Errno::from_raw)))?;

    match <[u8; ERRNO_SIZE]>::try_from(report.as_slice()) {
        _ if report.is_empty() => Ok(()),
        Ok(errno) => Err(Error::TraceRequest {
            op: "ptrace(PTRACE_TRACEME)",
            source: Errno::from_raw(i32::from_ne_bytes(errno)),
        }),
        Err(_) => Err(Error::Launch(Errno::EIO)),
    }
}

/// プロセスの終了状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// exitによる終了
    Code(i32),
    /// シグナルによる終了
    Signaled(Signal),
}

/// トレース対象プロセスの状態
///
/// 状態は `wait` の結果からのみ遷移します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// forkされたが、まだ状態変化を観測していない
    Created,
    /// 実行中
    Running,
    /// 停止中（シグナルを伴わない停止イベントは `None`）
    Stopped(Option<Signal>),
    /// 終了済み
    Exited(ExitStatus),
}

impl ProcessState {
    /// waitpidの結果から状態を導出する
    ///
    /// 停止と終了以外のイベントは停止として扱います。
    pub fn from_wait_status(status: WaitStatus) -> Self {
        match status {
            WaitStatus::Stopped(_, signal) | WaitStatus::PtraceEvent(_, signal, _) => {
                Self::Stopped(Some(signal))
            }
            WaitStatus::Exited(_, code) => Self::Exited(ExitStatus::Code(code)),
            WaitStatus::Signaled(_, signal, _) => Self::Exited(ExitStatus::Signaled(signal)),
            _ => Self::Stopped(None),
        }
    }

    /// 停止中かどうか
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    /// 終了済みかどうか
    pub fn is_exited(&self) -> bool {
        matches!(self, Self::Exited(_))
    }
}

/// トレース対象のプロセス
pub struct Process {
    pid: Pid,
    state: ProcessState,
}

impl Process {
    /// トレース対象プロセスを起動する
    ///
    /// forkした子プロセスでPTRACE_TRACEMEを要求してから、`program` を
    /// execvpで実行します（PATHを検索し、標準入出力は継承されます）。
    /// argv[0]は `program` そのもので、続けて `args` が渡されます。
    ///
    /// PTRACE_TRACEMEが失敗した場合、子プロセスは対象を実行せずに終了し、
    /// このメソッドは `Error::TraceRequest` を返します。execvpの失敗は
    /// 通常の終了（終了コード127）として `wait` で観測されます。
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        // fork後にメモリ確保しないよう、引数は先に変換しておく
        let mut argv = vec![CString::new(program)?];
        for arg in args {
            argv.push(CString::new(arg.as_str())?);
        }

        // execに成功すると閉じられるパイプで、TRACEMEの失敗を親に伝える
        let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC).map_err(Error::Launch)?;

        match unsafe { fork() }.map_err(Error::Launch)? {
            ForkResult::Parent { child } => {
                drop(write_end);
                tracing::debug!(program, pid = child.as_raw(), "run debugee");

                let mut channel = File::from(read_end);

                match read_trace_request_status(&mut channel) {
                    Ok(()) => Ok(Self {
                        pid: child,
                        state: ProcessState::Created,
                    }),
                    Err(e) => {
                        tracing::error!(error = %e, pid = child.as_raw(), "spawn");
                        let _ = signal::kill(child, Signal::SIGKILL);
                        let _ = waitpid(child, None);
                        Err(e)
                    }
                }
            }
            ForkResult::Child => {
                drop(read_end);

                if let Err(errno) = ptrace::traceme() {
                    let mut channel = File::from(write_end);
                    let _ = channel.write_all(&(errno as i32).to_ne_bytes());
                    unsafe { nix::libc::_exit(1) };
                }

                // execvpが成功すると戻ってこない
                let _ = execvp(&argv[0], &argv);
                unsafe { nix::libc::_exit(EXEC_FAILURE_CODE) }
            }
        }
    }

    /// プロセスIDを取得する
    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }

    /// 最後に観測した状態を取得する
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// 次の状態変化（停止または終了）までブロックして待機する
    pub fn wait(&mut self) -> Result<ProcessState> {
        let status = waitpid(self.pid, None)
            .inspect_err(|e| tracing::error!(error = %e, pid = self.pid(), "waitpid"))
            .map_err(Error::Wait)?;

        self.state = ProcessState::from_wait_status(status);
        tracing::trace!(pid = self.pid(), ?status, "state changed");

        Ok(self.state)
    }

    /// プロセスを実行継続する
    ///
    /// `signal` が指定された場合、そのシグナルを配送して再開します。
    pub fn continue_execution(&mut self, signal: Option<Signal>) -> Result<()> {
        self.ensure_stopped()?;

        ptrace::cont(self.pid, signal)
            .inspect_err(|e| tracing::error!(error = %e, pid = self.pid(), "ptrace(PTRACE_CONT)"))
            .map_err(|source| Error::Step {
                op: "ptrace(PTRACE_CONT)",
                source,
            })?;

        self.state = ProcessState::Running;
        Ok(())
    }

    /// 1命令だけ実行し、完了（または終了）まで待機する
    pub fn step(&mut self) -> Result<ProcessState> {
        self.ensure_stopped()?;

        ptrace::step(self.pid, None)
            .inspect_err(|e| {
                tracing::error!(error = %e, pid = self.pid(), "ptrace(PTRACE_SINGLESTEP)")
            })
            .map_err(|source| Error::Step {
                op: "ptrace(PTRACE_SINGLESTEP)",
                source,
            })?;

        self.state = ProcessState::Running;
        self.wait()
    }

    /// トレーサが終了した場合にプロセスも終了させる
    pub fn kill_on_tracer_exit(&self) -> Result<()> {
        self.ensure_stopped()?;

        ptrace::setoptions(self.pid, ptrace::Options::PTRACE_O_EXITKILL).map_err(|source| {
            Error::TraceRequest {
                op: "ptrace(PTRACE_SETOPTIONS)",
                source,
            }
        })
    }

    /// コードメモリへのアクセスを取得する（停止中のみ）
    pub fn memory(&self) -> Result<Memory<'_>> {
        self.ensure_stopped()?;
        Ok(Memory::new(self.pid))
    }

    /// レジスタへのアクセスを取得する（停止中のみ）
    pub fn registers(&self) -> Result<Registers<'_>> {
        self.ensure_stopped()?;
        Ok(Registers::new(self.pid))
    }

    fn ensure_stopped(&self) -> Result<()> {
        if self.state.is_stopped() {
            Ok(())
        } else {
            Err(Error::NotStopped(self.pid()))
        }
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        if self.state.is_exited() {
            return;
        }

        match signal::kill(self.pid, Signal::SIGKILL) {
            Ok(()) => {
                let _ = waitpid(self.pid, None);
                tracing::debug!(pid = self.pid(), "process killed");
            }
            Err(Errno::ESRCH) => (),
            Err(e) => tracing::error!(error = %e, pid = self.pid(), "kill"),
        }
    }
}
