//! 実プロセスを使ったプロセス制御とブレークポイントのテスト

use kanshi_target::breakpoint::{self, patch_word};
use kanshi_target::{Breakpoint, Error, ExitStatus, Process, ProcessState};
use nix::sys::signal::Signal;

/// `true` を起動して最初の停止（execによるSIGTRAP）まで進める
fn spawn_stopped() -> Process {
    let mut process = Process::spawn("true", &[]).expect("Failed to spawn `true`");
    assert_eq!(process.state(), ProcessState::Created);

    let state = process.wait().expect("Failed to wait for initial trap");
    assert_eq!(state, ProcessState::Stopped(Some(Signal::SIGTRAP)));

    process
}

#[test]
fn test_spawn_and_exit() {
    let mut process = spawn_stopped();

    process.continue_execution(None).unwrap();
    assert_eq!(process.state(), ProcessState::Running);

    let state = process.wait().unwrap();
    assert_eq!(state, ProcessState::Exited(ExitStatus::Code(0)));
}

#[test]
fn test_spawn_missing_executable_exits() {
    let mut process = Process::spawn("/nonexistent/kanshi-debugee", &[]).unwrap();

    let state = process.wait().unwrap();
    assert_eq!(state, ProcessState::Exited(ExitStatus::Code(127)));
}

#[test]
fn test_spawn_rejects_nul_argument() {
    let result = Process::spawn("true", &["a\0b".to_string()]);
    assert!(matches!(result, Err(Error::Argument(_))));
}

#[test]
fn test_access_requires_stopped_process() {
    let mut process = spawn_stopped();
    process.continue_execution(None).unwrap();

    assert!(matches!(process.memory(), Err(Error::NotStopped(_))));
    assert!(matches!(process.registers(), Err(Error::NotStopped(_))));
    assert!(matches!(process.step(), Err(Error::NotStopped(_))));

    process.wait().unwrap();
}

#[test]
fn test_install_and_restore_at_entry() {
    let mut process = spawn_stopped();
    let pc = process.registers().unwrap().pc().unwrap();

    {
        let memory = process.memory().unwrap();
        let before = memory.read_word(pc).unwrap();

        let original = breakpoint::install(&memory, pc).unwrap();
        assert_eq!(original, before);
        assert_eq!(memory.read_word(pc).unwrap(), patch_word(before));

        breakpoint::restore(&memory, pc, original).unwrap();
        assert_eq!(memory.read_word(pc).unwrap(), before);
    }

    process.continue_execution(None).unwrap();
    assert_eq!(
        process.wait().unwrap(),
        ProcessState::Exited(ExitStatus::Code(0))
    );
}

#[test]
fn test_breakpoint_keeps_first_original_word() {
    let process = spawn_stopped();
    let pc = process.registers().unwrap().pc().unwrap();
    let memory = process.memory().unwrap();
    let before = memory.read_word(pc).unwrap();

    let mut bp = Breakpoint::new(pc);
    bp.enable(&memory).unwrap();
    assert!(bp.is_installed());

    for _ in 0..3 {
        bp.disable(&memory).unwrap();
        assert_eq!(memory.read_word(pc).unwrap(), before);
        bp.enable(&memory).unwrap();
    }

    assert_eq!(bp.original_word(), Some(before));
    bp.disable(&memory).unwrap();
    assert!(!bp.is_installed());
    assert_eq!(memory.read_word(pc).unwrap(), before);
}

#[test]
fn test_install_at_unmapped_address_fails() {
    let process = spawn_stopped();
    let memory = process.memory().unwrap();

    let result = breakpoint::install(&memory, 0);
    assert!(matches!(result, Err(Error::MemoryAccess { addr: 0, .. })));
}

#[test]
fn test_rewind_pc() {
    let process = spawn_stopped();
    let registers = process.registers().unwrap();

    let pc = registers.pc().unwrap();
    assert_eq!(registers.rewind_pc(1).unwrap(), pc - 1);
    assert_eq!(registers.pc().unwrap(), pc - 1);

    // 他のレジスタは書き換わらない
    let before = registers.read().unwrap();
    registers.rewind_pc(0).unwrap();
    let after = registers.read().unwrap();
    assert_eq!((before.rax, before.rsp, before.rdx), (after.rax, after.rsp, after.rdx));
}
