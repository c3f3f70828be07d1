//! レジスタアクセス機能

use crate::{Error, Result};
use nix::libc::user_regs_struct;
use nix::sys::ptrace;
use nix::unistd::Pid;
use std::marker::PhantomData;

/// トレース対象のレジスタへのアクセス
///
/// `Process::registers` から取得でき、借用している間はプロセスを再開できません。
pub struct Registers<'a> {
    pid: Pid,
    _process: PhantomData<&'a crate::Process>,
}

impl Registers<'_> {
    pub(crate) fn new(pid: Pid) -> Self {
        Self {
            pid,
            _process: PhantomData,
        }
    }

    /// レジスタを読み取る
    pub fn read(&self) -> Result<user_regs_struct> {
        ptrace::getregs(self.pid)
            .inspect_err(|e| tracing::error!(error = %e, "ptrace(PTRACE_GETREGS)"))
            .map_err(|source| Error::RegisterAccess {
                op: "ptrace(PTRACE_GETREGS)",
                source,
            })
    }

    /// レジスタに書き込む
    pub fn write(&self, regs: user_regs_struct) -> Result<()> {
        ptrace::setregs(self.pid, regs)
            .inspect_err(|e| tracing::error!(error = %e, "ptrace(PTRACE_SETREGS)"))
            .map_err(|source| Error::RegisterAccess {
                op: "ptrace(PTRACE_SETREGS)",
                source,
            })
    }

    /// 命令ポインタ（RIP）を取得する
    pub fn pc(&self) -> Result<u64> {
        self.read().map(|regs| regs.rip)
    }

    /// 命令ポインタを `width` バイト戻し、戻した後の値を返す
    ///
    /// トラップ命令の実行後は命令ポインタがトラップの直後を指しているため、
    /// 元の命令を実行し直すにはトラップの幅だけ戻す必要があります。
    pub fn rewind_pc(&self, width: u64) -> Result<u64> {
        let mut regs = self.read()?;
        regs.rip = regs.rip.wrapping_sub(width);
        self.write(regs)?;
        Ok(regs.rip)
    }
}
