use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

const NUMBER_ESCAPE_CHAR: &[char] = &['%', ',', ' ', '"', '\n', '$'];

/// 將 Big5/MS950 編碼的位元組轉成 UTF-8 字串，無法對應的字元直接忽略。
pub fn big5_2_utf8(data: &[u8]) -> Result<String> {
    let (decoded, _, _) = encoding_rs::BIG5.decode(data);
    Ok(decoded.into_owned())
}

/// 還原字串內的 `\uXXXX` 逃逸字元。
///
/// MoneyDJ 回傳的清單是塞在 script 變數裡的逃逸字串，必須先還原才能切割。
/// 不完整或無效的逃逸序列保留原樣，不視為錯誤。
pub fn unescape_unicode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = if hex.len() == 4 {
                    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                match code {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// 切割一行 CSV，支援雙引號包覆與引號內的逗號、`""` 跳脫。
///
/// Google 試算表的 CSV 匯出每個欄位都帶引號，不能直接用逗號切。
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    fields.push(field);
    fields
}

/// 解析可能帶千分位逗號、百分比符號等雜訊的數值字串。
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_big5_2_utf8() {
        // "中文" in Big5
        let bytes = [0xA4, 0xA4, 0xA4, 0xE5];
        assert_eq!(big5_2_utf8(&bytes).unwrap(), "中文");
        // 無效位元組被忽略，不會失敗
        assert!(big5_2_utf8(&[0xFF, 0xFF]).is_ok());
        assert_eq!(big5_2_utf8(b"2330 TSMC").unwrap(), "2330 TSMC");
    }

    #[test]
    fn test_unescape_unicode() {
        assert_eq!(unescape_unicode("plain"), "plain");
        assert_eq!(unescape_unicode(r"a\\b"), r"a\b");
        assert_eq!(
            unescape_unicode(r"\u0032\u0033\u0033\u0030,2317"),
            "2330,2317"
        );
        // 不完整的序列保留原樣
        assert_eq!(unescape_unicode(r"\u12"), "\\u12");
        assert_eq!(unescape_unicode("tail\\"), "tail\\");
    }

    #[test]
    fn test_split_csv_line() {
        assert_eq!(
            split_csv_line(r#""AAPL","95","Apple, Inc.""#),
            vec!["AAPL", "95", "Apple, Inc."]
        );
        assert_eq!(split_csv_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_csv_line(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(split_csv_line(""), vec![""]);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1,234.56", None).unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("\"95\"", None).unwrap(), dec!(95));
        assert!(parse_decimal("n/a", None).is_err());
    }
}
