//! 刷新计数器文本解析
//!
//! 站点把"今日剩余更新次数"渲染成 `残り 3/10回` 一类的页面文本。
//! 模式固定为"斜杠分隔的两个整数"；这段文本随站点改版和地区设定
//! 漂移，解析器单独隔离在此，方便整体替换。任何不匹配的文本一律
//! 返回 `Unknown`，绝不折算成 0。

use regex::Regex;

use crate::models::CounterReading;

/// 解析计数器文本
pub fn parse_counter(text: &str) -> CounterReading {
    let re = match Regex::new(r"(\d+)\s*/\s*(\d+)") {
        Ok(re) => re,
        Err(_) => return CounterReading::Unknown,
    };

    let captures = match re.captures(text) {
        Some(captures) => captures,
        None => return CounterReading::Unknown,
    };

    let remaining = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let total = captures.get(2).and_then(|m| m.as_str().parse::<u32>().ok());

    match (remaining, total) {
        (Some(remaining), Some(total)) => CounterReading::Known { remaining, total },
        _ => CounterReading::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_japanese_counter_text() {
        assert_eq!(
            parse_counter("残り 3/10回"),
            CounterReading::Known {
                remaining: 3,
                total: 10
            }
        );
        assert_eq!(
            parse_counter("本日の更新可能回数：0 / 20"),
            CounterReading::Known {
                remaining: 0,
                total: 20
            }
        );
    }

    #[test]
    fn whitespace_around_slash_is_tolerated() {
        assert_eq!(
            parse_counter("7　/　10"),
            CounterReading::Known {
                remaining: 7,
                total: 10
            }
        );
    }

    #[test]
    fn non_matching_text_is_unknown_not_zero() {
        assert_eq!(parse_counter(""), CounterReading::Unknown);
        assert_eq!(parse_counter("残り回数は後ほど表示されます"), CounterReading::Unknown);
        assert_eq!(parse_counter("メンテナンス中"), CounterReading::Unknown);
    }

    #[test]
    fn absurdly_large_numbers_are_unknown() {
        // 超出 u32 的数值按解析失败处理
        assert_eq!(parse_counter("99999999999/10"), CounterReading::Unknown);
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(
            parse_counter("残り 2/5回（先月: 9/10）"),
            CounterReading::Known {
                remaining: 2,
                total: 5
            }
        );
    }
}
