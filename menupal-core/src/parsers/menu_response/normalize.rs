use std::sync::LazyLock;

use regex::Regex;

const BOM: char = '\u{FEFF}';

/// One cleanup step applied to the upstream payload before it is decoded.
pub struct NormalizeRule {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// Applied in order. Append new upstream quirks here; decoding never changes.
pub const RULES: &[NormalizeRule] = &[
    NormalizeRule {
        name: "leading_bom",
        apply: strip_leading_bom,
    },
    NormalizeRule {
        name: "code_fence",
        apply: extract_fenced_body,
    },
    NormalizeRule {
        name: "newline_escapes",
        apply: strip_newline_escapes,
    },
    NormalizeRule {
        name: "control_chars",
        apply: strip_control_chars,
    },
    NormalizeRule {
        name: "trim",
        apply: trim_padding,
    },
];

pub fn normalize(text: &str) -> String {
    RULES.iter().fold(text.to_string(), |acc, rule| {
        let out = (rule.apply)(&acc);
        if out.len() != acc.len() {
            tracing::trace!(rule = rule.name, before = acc.len(), after = out.len(), "normalize");
        }
        out
    })
}

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[\w+.-]*[ \t]*\r?\n?(?P<body>.*?)```").expect("fence pattern")
});

static OPEN_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[\w+.-]*[ \t]*\r?\n?(?P<body>.*)$").expect("open fence pattern")
});

fn strip_leading_bom(text: &str) -> String {
    text.trim_start_matches(|c: char| c == BOM || c.is_whitespace())
        .to_string()
}

fn extract_fenced_body(text: &str) -> String {
    if let Some(caps) = FENCED.captures(text) {
        return caps["body"].to_string();
    }
    if let Some(caps) = OPEN_FENCE.captures(text) {
        return caps["body"].to_string();
    }
    text.to_string()
}

// `\\n` is an escaped backslash followed by `n` and is kept.
fn strip_newline_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => {}
            Some(next) => {
                out.push(ch);
                out.push(next);
            }
            None => out.push(ch),
        }
    }

    out
}

fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

fn trim_padding(text: &str) -> String {
    text.trim_matches(|c: char| c == BOM || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::bare("{\"a\":1}", "{\"a\":1}")]
    #[case::tagged_fence("```json\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case::untagged_fence("```\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case::commentary("Sure! Here it is:\n```json\n{\"a\":1}\n```\nEnjoy your meal.", "{\"a\":1}")]
    #[case::unterminated("```json\n{\"a\":1}", "{\"a\":1}")]
    #[case::bom_outside("\u{FEFF}```json\n{\"a\":1}\n```", "{\"a\":1}")]
    #[case::bom_inside("```json\n\u{FEFF}{\"a\":1}\n```", "{\"a\":1}")]
    #[case::literal_newlines("```json\\n{\\n\"a\":1\\n}\\n```", "{\"a\":1}")]
    #[case::control_chars("\u{0007}{\"a\":\u{0001}1}\u{001b}", "{\"a\":1}")]
    #[case::padding("  \r\n\t{\"a\":1} \n ", "{\"a\":1}")]
    fn recovers_document(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[test]
    fn escaped_backslash_before_n_is_kept() {
        assert_eq!(strip_newline_escapes(r#"{"a":"x\\n"}"#), r#"{"a":"x\\n"}"#);
        assert_eq!(strip_newline_escapes(r#"a\nb\"c\"#), r#"ab\"c\"#);
    }

    #[test]
    fn first_fence_wins() {
        let text = "```json\n{\"a\":1}\n```\nand also\n```json\n{\"b\":2}\n```";
        assert_eq!(extract_fenced_body(text), "{\"a\":1}\n");
    }
}
