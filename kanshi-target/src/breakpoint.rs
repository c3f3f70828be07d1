//! ブレークポイント機能

use crate::arch::{OPCODE_MASK, TRAP_OPCODE};
use crate::{Memory, Result};

/// ワードの最下位バイトだけをトラップ命令に置き換える
pub fn patch_word(word: u64) -> u64 {
    (word & !OPCODE_MASK) | u64::from(TRAP_OPCODE)
}

/// 指定されたアドレスにトラップ命令を書き込み、書き換え前のワードを返す
///
/// 残りの命令バイトはそのまま保たれるため、返されたワードで元に戻せます。
pub fn install(memory: &Memory<'_>, address: u64) -> Result<u64> {
    let original_word = memory.read_word(address)?;
    memory.write_word(address, patch_word(original_word))?;
    Ok(original_word)
}

/// 保存しておいたワードを書き戻し、トラップ命令を取り除く
pub fn restore(memory: &Memory<'_>, address: u64, original_word: u64) -> Result<()> {
    memory.write_word(address, original_word)
}

/// ソフトウェアブレークポイント（INT3命令）
///
/// 最初に有効化したときに読み取ったワードを保持し、以後の無効化では
/// 常にそのワードを書き戻します。
#[derive(Debug)]
pub struct Breakpoint {
    address: u64,
    original_word: Option<u64>,
    installed: bool,
}

impl Breakpoint {
    /// ブレークポイントを作成する
    pub fn new(address: u64) -> Self {
        Self {
            address,
            original_word: None,
            installed: false,
        }
    }

    /// ブレークポイントのアドレスを取得する
    pub fn address(&self) -> u64 {
        self.address
    }

    /// ブレークポイントが設定されているかどうか
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// 書き換え前のワードを取得する
    pub fn original_word(&self) -> Option<u64> {
        self.original_word
    }

    /// ブレークポイントを設定する
    pub fn enable(&mut self, memory: &Memory<'_>) -> Result<()> {
        if self.installed {
            return Ok(());
        }

        let word = install(memory, self.address)?;
        self.original_word.get_or_insert(word);

        self.installed = true;
        Ok(())
    }

    /// ブレークポイントを解除する
    pub fn disable(&mut self, memory: &Memory<'_>) -> Result<()> {
        let Some(original_word) = self.original_word.filter(|_| self.installed) else {
            return Ok(());
        };

        restore(memory, self.address, original_word)?;

        self.installed = false;
        Ok(())
    }
}
