//! サポートするアーキテクチャ（x86_64）の定数

/// INT3命令のオペコード
pub const TRAP_OPCODE: u8 = 0xCC;

/// トラップ命令の幅（停止時の命令ポインタの進み量）
pub const TRAP_WIDTH: u64 = 1;

/// PTRACE_PEEKTEXT/POKETEXTが扱うワードのサイズ
pub const WORD_SIZE: usize = std::mem::size_of::<u64>();

/// オペコードバイトのマスク（リトルエンディアンでワードの最下位バイト）
pub const OPCODE_MASK: u64 = 0xFF;
