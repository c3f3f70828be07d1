//! Kanshi CLI - コマンドラインインターフェース
//!
//! 指定したアドレスにブレークポイントを設定して対象プログラムを実行し、
//! 到達するたびにレジスタを表示します。

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use kanshi_core::parse::parse_address;
use kanshi_core::Tracer;
use tracing_subscriber::EnvFilter;

/// Kanshi - Breakpoint Register Tracer
#[derive(Parser, Debug)]
#[command(name = "debugger")]
#[command(version)]
#[command(about = "Print registers each time a program reaches a breakpoint", long_about = None)]
#[command(override_usage = "debugger <breakpoint address> <debugee command> <debugee argument>*")]
struct Cli {
    /// Breakpoint address (hexadecimal, `0x` prefix optional)
    #[arg(allow_negative_numbers = true)]
    address: String,

    /// Program to trace (searched in PATH) followed by its arguments
    ///
    /// Everything after the address is passed to the program as is,
    /// including `--help` or `--`.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<String>,
}

impl Cli {
    /// 対象プログラムと、その引数に分ける
    fn debugee(&self) -> (&str, &[String]) {
        // clap が少なくとも1つの値を保証する
        self.command
            .split_first()
            .map_or(("", &[][..]), |(program, args)| (program.as_str(), args))
    }
}

fn main() -> Result<()> {
    init_logging()?;

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprint!("{e}");
            std::process::exit(1);
        }
    };

    // 16進数として読めない部分は無視され、数字がなければ 0 になる
    let address = parse_address(&cli.address);
    let (program, args) = cli.debugee();
    tracing::debug!(
        addr = format_args!("{address:#x}"),
        program,
        "run debugger"
    );

    let mut tracer = Tracer::new(address, std::io::stdout().lock());

    // 失敗は報告するが、終了コードは区別しない
    match tracer.run(program, args) {
        Ok(summary) => tracing::debug!(hits = summary.hits, exit = ?summary.exit, "done"),
        Err(e) => eprintln!("debugger: {e}"),
    }

    Ok(())
}

/// ログ出力を初期化する（標準出力の報告と混ざらないよう標準エラーに出す）
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debugee_of(argv: &[&str]) -> (String, Vec<String>) {
        let cli = Cli::try_parse_from(argv).unwrap();
        let (program, args) = cli.debugee();
        (program.to_string(), args.to_vec())
    }

    #[test]
    fn test_parse_command_line() {
        let cli = Cli::try_parse_from(["debugger", "401000", "ls", "-la", "/tmp"]).unwrap();

        assert_eq!(cli.address, "401000");
        assert_eq!(cli.debugee(), ("ls", &["-la".to_string(), "/tmp".to_string()][..]));
    }

    #[test]
    fn test_debugee_help_and_version_are_forwarded() {
        assert_eq!(
            debugee_of(&["debugger", "401000", "prog", "--help"]),
            ("prog".into(), vec!["--help".into()])
        );
        assert_eq!(
            debugee_of(&["debugger", "401000", "prog", "-V"]),
            ("prog".into(), vec!["-V".into()])
        );
        assert_eq!(
            debugee_of(&["debugger", "401000", "prog", "-h", "--version"]).1,
            ["-h", "--version"]
        );
    }

    #[test]
    fn test_debugee_double_dash_is_kept() {
        assert_eq!(
            debugee_of(&["debugger", "401000", "prog", "--", "x"]),
            ("prog".into(), vec!["--".into(), "x".into()])
        );
    }

    #[test]
    fn test_hyphen_command_is_accepted() {
        assert_eq!(debugee_of(&["debugger", "401000", "-weird"]), ("-weird".into(), vec![]));
    }

    #[test]
    fn test_debugger_help_before_command() {
        let err = Cli::try_parse_from(["debugger", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_negative_address_is_positional() {
        let cli = Cli::try_parse_from(["debugger", "-1", "true"]).unwrap();

        assert_eq!(cli.address, "-1");
        assert_eq!(parse_address(&cli.address), u64::MAX);
    }

    #[test]
    fn test_missing_command_is_error() {
        let err = Cli::try_parse_from(["debugger", "401000"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        assert!(Cli::try_parse_from(["debugger"]).is_err());
    }

    #[test]
    fn test_usage_message() {
        let err = Cli::try_parse_from(["debugger"]).unwrap_err();
        assert!(err
            .to_string()
            .contains("debugger <breakpoint address> <debugee command> <debugee argument>*"));
    }
}
