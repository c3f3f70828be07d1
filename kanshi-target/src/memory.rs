//! メモリアクセス機能

use crate::arch::WORD_SIZE;
use crate::{Error, Result};
use nix::sys::ptrace::{self, AddressType};
use nix::unistd::Pid;
use std::marker::PhantomData;

// PEEKDATA/POKEDATAのワードをu64として扱う
const _: () = assert!(WORD_SIZE == std::mem::size_of::<nix::libc::c_long>());

/// トレース対象のコードメモリへのアクセス
///
/// PTRACE_PEEKDATA/POKEDATAはワード単位でしか読み書きできないため、
/// このアクセスもワード単位です。`Process::memory` から取得でき、
/// 借用している間はプロセスを再開できません。
pub struct Memory<'a> {
    pid: Pid,
    _process: PhantomData<&'a crate::Process>,
}

impl Memory<'_> {
    pub(crate) fn new(pid: Pid) -> Self {
        Self {
            pid,
            _process: PhantomData,
        }
    }

    /// 指定されたアドレスから1ワードを読み取る
    pub fn read_word(&self, addr: u64) -> Result<u64> {
        ptrace::read(self.pid, addr as AddressType)
            .map(|word| word as u64)
            .inspect_err(|e| {
                tracing::error!(error = %e, addr = format_args!("{addr:#x}"), "ptrace(PTRACE_PEEKDATA)")
            })
            .map_err(|source| Error::MemoryAccess {
                op: "ptrace(PTRACE_PEEKDATA)",
                addr,
                source,
            })
    }

    /// 指定されたアドレスに1ワードを書き込む
    pub fn write_word(&self, addr: u64, word: u64) -> Result<()> {
        ptrace::write(self.pid, addr as AddressType, word as nix::libc::c_long)
            .inspect_err(|e| {
                tracing::error!(error = %e, addr = format_args!("{addr:#x}"), "ptrace(PTRACE_POKEDATA)")
            })
            .map_err(|source| Error::MemoryAccess {
                op: "ptrace(PTRACE_POKEDATA)",
                addr,
                source,
            })
    }
}
