//! Kanshi ターゲットプロセス制御
//!
//! このクレートは、トレース対象のプロセスを制御するための低レベル機能を提供します。
//! ptraceによるプロセス起動、レジスタアクセス、メモリアクセス、ブレークポイント設定などを行います。

#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
compile_error!("kanshi supports only Linux on x86_64.");

pub mod arch;
pub mod breakpoint;
pub mod error;
pub mod memory;
pub mod process;
pub mod registers;

pub use breakpoint::Breakpoint;
pub use error::Error;
pub use memory::Memory;
pub use process::{ExitStatus, Process, ProcessState};
pub use registers::Registers;

/// ターゲット制御の結果型
pub type Result<T> = std::result::Result<T, Error>;
