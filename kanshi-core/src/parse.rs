//! パース関連のユーティリティ関数

/// ブレークポイントアドレスの文字列を16進数としてパースする
///
/// C の `strtol(s, NULL, 16)` と同じ規則で解釈します。先頭の空白、符号、
/// `0x`/`0X` プレフィックスを読み飛ばし、続く16進数字をできるだけ長く読みます。
/// 数字が1つもない場合は 0 になり、エラーにはなりません。
/// 範囲外の値は `i64` の最大値（負なら最小値）に丸められます。
///
/// # Examples
/// ```
/// use kanshi_core::parse::parse_address;
///
/// assert_eq!(parse_address("401000"), 0x401000);
/// assert_eq!(parse_address("0x401000"), 0x401000);
/// assert_eq!(parse_address("main"), 0);
/// ```
pub fn parse_address(s: &str) -> u64 {
    let s = s.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '\x0b');

    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    // "0x" の後に16進数字がなければ、"0" だけを数字として読む
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_hexdigit()))
        .unwrap_or(s);

    let magnitude = digits
        .chars()
        .map_while(|c| c.to_digit(16))
        .try_fold(0u64, |acc, digit| acc.checked_mul(16)?.checked_add(u64::from(digit)));

    const LIMIT: u64 = 1 << 63;

    match (negative, magnitude) {
        (false, Some(m)) if m < LIMIT => m,
        (false, _) => i64::MAX as u64,
        (true, Some(m)) if m <= LIMIT => 0u64.wrapping_sub(m),
        (true, _) => i64::MIN as u64,
    }
}
