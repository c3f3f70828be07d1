//! テスト用のトレース対象プログラムのビルド

use object::{Object, ObjectSymbol};
use std::path::{Path, PathBuf};
use std::process::Command;

/// ビルドしたトレース対象プログラム
pub struct Debugee {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl Debugee {
    /// 実行ファイルのパスを取得する
    pub fn path(&self) -> &str {
        self.path.to_str().expect("non UTF-8 temp path")
    }

    /// シンボルのアドレスを取得する
    pub fn symbol(&self, name: &str) -> u64 {
        let data = std::fs::read(&self.path).expect("read debugee");
        let file = object::File::parse(&*data).expect("parse ELF");

        file.symbols()
            .find(|sym| sym.name() == Ok(name))
            .map(|sym| sym.address())
            .unwrap_or_else(|| panic!("symbol `{name}` not found"))
    }
}

/// `tests/fixtures/<name>.s` を静的リンクの実行ファイルとしてビルドする
pub fn compile_debugee(name: &str) -> Debugee {
    let source = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(format!("{name}.s"));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);

    let cc = std::env::var("CC").unwrap_or_else(|_| "cc".to_string());
    let mut cmd = Command::new(cc);
    cmd.args(["-nostdlib", "-static", "-no-pie", "-o"])
        .arg(&path)
        .arg(&source);

    println!("running: {cmd:?}");

    let output = cmd.output().expect("cc");
    if !output.status.success() {
        panic!("{}", String::from_utf8_lossy(&output.stderr));
    }

    Debugee { _dir: dir, path }
}
