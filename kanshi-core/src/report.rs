//! レジスタの報告

use crate::Result;
use kanshi_target::Process;
use nix::libc::user_regs_struct;
use std::fmt;
use std::io::Write;

/// 停止時に読み取ったレジスタの値
///
/// 1回のブレークポイント到達の処理の中でだけ使われ、到達をまたいで保持されません。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub rip: u64,
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rdi: u64,
    pub rsi: u64,
}

impl RegisterSnapshot {
    /// 停止中のプロセスからレジスタを読み取る
    pub fn read(process: &Process) -> Result<Self> {
        let regs = process.registers()?.read()?;
        Ok(Self::from(&regs))
    }

    /// 報告する汎用レジスタを表示順に返す
    pub fn general_purpose(&self) -> [(&'static str, u64); 6] {
        [
            ("rax", self.rax),
            ("rbx", self.rbx),
            ("rcx", self.rcx),
            ("rdx", self.rdx),
            ("rdi", self.rdi),
            ("rsi", self.rsi),
        ]
    }
}

impl From<&user_regs_struct> for RegisterSnapshot {
    fn from(regs: &user_regs_struct) -> Self {
        Self {
            rip: regs.rip,
            rax: regs.rax,
            rbx: regs.rbx,
            rcx: regs.rcx,
            rdx: regs.rdx,
            rdi: regs.rdi,
            rsi: regs.rsi,
        }
    }
}

impl fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "@[{:#018x}]:", self.rip)?;
        for (name, value) in self.general_purpose() {
            writeln!(f, "  %{name}: {}", value as i64)?;
        }
        Ok(())
    }
}

/// 停止中のプロセスのレジスタを `out` に書き出す
///
/// レジスタの読み取りに失敗した場合は何も出力しません。
pub fn report<W: Write>(process: &Process, out: &mut W) -> Result<()> {
    let snapshot = RegisterSnapshot::read(process)?;

    out.write_all(snapshot.to_string().as_bytes())?;
    out.flush()?;

    Ok(())
}
