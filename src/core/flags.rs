/// Flag pattern construction and matching
///
/// A flag pattern is the user's flag-format regex joined with its ROT13
/// rotation, so a single pass over tool output finds both the plain flag and
/// the rotated one. The rotation is applied to the regex source text, which
/// means letters used as regex syntax (`\d`, `\w`, character class ranges)
/// are rotated as well. A fragment that stops compiling after rotation is
/// reported as a pattern error.

use log::debug;
use regex::Regex;

use crate::core::errors::Result;

/// Compiled `plain|rot13(plain)` flag pattern
#[derive(Debug, Clone)]
pub struct FlagPattern {
    format: String,
    regex: Regex,
}

impl FlagPattern {
    /// The flag format the pattern was built from
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The combined pattern source
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Every non-overlapping match, left to right
    pub fn find_flags(&self, text: &str) -> Vec<String> {
        find_flags(self, text)
    }
}

/// Rotate ASCII letters by 13 places, preserving case
pub fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => c,
        })
        .collect()
}

/// Parse a counted repetition at the start of `chars` (which begins with `{`)
///
/// Returns the number of chars consumed and the repetition in the form the
/// regex engine accepts; an empty minimum becomes `0`.
fn counted_repetition(chars: &[char]) -> Option<(usize, String)> {
    let close = chars.iter().position(|&c| c == '}')?;
    let body: String = chars[1..close].iter().collect();

    let (min, max) = match body.split_once(',') {
        Some((min, max)) => (min, Some(max)),
        None => (body.as_str(), None),
    };
    let is_number = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !is_number(min) || !max.map_or(true, is_number) {
        return None;
    }

    let normalized = match max {
        None if min.is_empty() => return None,
        None => format!("{{{}}}", min),
        Some(max) => {
            let min = if min.is_empty() { "0" } else { min };
            format!("{{{},{}}}", min, max)
        }
    };
    Some((close + 1, normalized))
}

/// Escape braces that do not form a counted repetition
///
/// Flag formats are usually written as `flag{.*}`, where the braces are meant
/// literally. Quantifiers like `.{0,2}`, escaped braces, braces inside a
/// character class and the braces of `\p{..}`/`\x{..}` are left alone.
fn escape_literal_braces(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len() + 8);
    let mut class_depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                    if matches!(next, 'p' | 'P' | 'x' | 'u' | 'U') && chars.get(i + 1) == Some(&'{') {
                        while i + 1 < chars.len() {
                            i += 1;
                            out.push(chars[i]);
                            if chars[i] == '}' {
                                break;
                            }
                        }
                    }
                }
            }
            '[' => {
                out.push(c);
                class_depth += 1;
                if class_depth == 1 {
                    // `]` right after the opening bracket (or `^`) is literal
                    if chars.get(i + 1) == Some(&'^') {
                        out.push('^');
                        i += 1;
                    }
                    if chars.get(i + 1) == Some(&']') {
                        out.push(']');
                        i += 1;
                    }
                }
            }
            ']' if class_depth > 0 => {
                out.push(c);
                class_depth -= 1;
            }
            '{' if class_depth == 0 => match counted_repetition(&chars[i..]) {
                Some((len, repetition)) => {
                    out.push_str(&repetition);
                    i += len - 1;
                }
                None => out.push_str("\\{"),
            },
            '}' if class_depth == 0 => out.push_str("\\}"),
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Build a pattern matching `format` or its ROT13 rotation
///
/// Braces that are not a counted repetition are matched literally, so
/// `picoctf{.*}` works as well as `picoctf\{.*\}`.
pub fn build_pattern(format: &str) -> Result<FlagPattern> {
    let source = format!(
        "{}|{}",
        escape_literal_braces(format),
        escape_literal_braces(&rot13(format))
    );
    debug!("Compiling flag pattern: {}", source);

    let regex = Regex::new(&source)?;

    Ok(FlagPattern {
        format: format.to_string(),
        regex,
    })
}

/// Find all flags in `text`
pub fn find_flags(pattern: &FlagPattern, text: &str) -> Vec<String> {
    pattern
        .regex
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
