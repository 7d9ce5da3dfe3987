//! Comparators (RFC 3028 section 2.7.3) and the three match types.

use crate::model::enums::MatchType;

pub const OCTET: &str = "i;octet";
pub const ASCII_CASEMAP: &str = "i;ascii-casemap";

/// A string-equivalence function parameterizing `:is`, `:contains` and
/// `:matches`.
pub trait Comparator {
    fn equals(&self, value: &str, key: &str) -> bool;

    fn contains(&self, value: &str, key: &str) -> bool;

    /// Glob match of the whole `value` against `pattern`.
    fn matches(&self, value: &str, pattern: &str) -> bool;

    fn compare(&self, match_type: MatchType, value: &str, key: &str) -> bool {
        match match_type {
            MatchType::Is => self.equals(value, key),
            MatchType::Contains => self.contains(value, key),
            MatchType::Matches => self.matches(value, key),
        }
    }
}

/// `i;octet`: exact comparison, no folding.
#[derive(Debug, Default)]
pub struct Octet;

impl Comparator for Octet {
    fn equals(&self, value: &str, key: &str) -> bool {
        value == key
    }

    fn contains(&self, value: &str, key: &str) -> bool {
        value.contains(key)
    }

    fn matches(&self, value: &str, pattern: &str) -> bool {
        glob_match(value, pattern)
    }
}

/// `i;ascii-casemap`: ASCII letters fold to one case before comparing.
#[derive(Debug, Default)]
pub struct AsciiCasemap;

impl Comparator for AsciiCasemap {
    fn equals(&self, value: &str, key: &str) -> bool {
        value.eq_ignore_ascii_case(key)
    }

    fn contains(&self, value: &str, key: &str) -> bool {
        value.to_ascii_uppercase().contains(&key.to_ascii_uppercase())
    }

    fn matches(&self, value: &str, pattern: &str) -> bool {
        glob_match(&value.to_ascii_uppercase(), &pattern.to_ascii_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Glob {
    Literal(char),
    One,
    Any,
}

fn compile(pattern: &str) -> Vec<Glob> {
    let mut out = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        out.push(match c {
            '\\' => Glob::Literal(chars.next().unwrap_or('\\')),
            '?' => Glob::One,
            '*' => Glob::Any,
            c => Glob::Literal(c),
        });
    }
    out
}

/// Anchored wildcard match: `*` is any run of characters, `?` exactly one,
/// a backslash makes the next character literal. Nothing else is special.
pub fn glob_match(value: &str, pattern: &str) -> bool {
    let pattern = compile(pattern);
    let value: Vec<char> = value.chars().collect();

    let (mut v, mut p) = (0, 0);
    // Position after the last `*` and the value index it is currently absorbing up to
    let mut star: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some(Glob::Any) => {
                star = Some((p + 1, v));
                p += 1;
            }
            Some(Glob::One) => {
                v += 1;
                p += 1;
            }
            Some(Glob::Literal(c)) if *c == value[v] => {
                v += 1;
                p += 1;
            }
            _ => match star {
                Some((after, absorbed)) => {
                    p = after;
                    v = absorbed + 1;
                    star = Some((after, absorbed + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|g| *g == Glob::Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_basics() {
        assert!(glob_match("C8H10N4O2", "*10N?O2"));
        assert!(glob_match("C8H10N4O2", "C8H10N4O2"));
        assert!(glob_match("", "*"));
        assert!(glob_match("abc", "a*"));
        assert!(glob_match("abc", "*c"));
        assert!(glob_match("abc", "a*b*c"));
        assert!(!glob_match("abc", "a?"));
        assert!(!glob_match("abcd", "*c"));
        assert!(!glob_match("", "?"));
    }

    #[test]
    fn test_glob_is_anchored_and_literal() {
        assert!(glob_match("[test] my subject", "[test*"));
        assert!(!glob_match("x[test] my subject", "[test*"));
        assert!(glob_match("a.b", "a.b"));
        assert!(!glob_match("axb", "a.b"));
        assert!(glob_match("(x)+", "(x)+"));
    }

    #[test]
    fn test_glob_escapes() {
        assert!(glob_match("wild*card", "wild\\*card"));
        assert!(!glob_match("wildXcard", "wild\\*card"));
        assert!(glob_match("why?", "why\\?"));
        assert!(!glob_match("whyX", "why\\?"));
        assert!(glob_match("back\\slash", "back\\\\slash"));
    }

    #[test]
    fn test_glob_backtracking() {
        assert!(glob_match("mississippi", "*sip*"));
        assert!(glob_match("mississippi", "m*iss*ppi"));
        assert!(!glob_match("mississippi", "m*iss*ppx"));
        assert!(glob_match("日本語メール", "日本*ル"));
    }

    #[test]
    fn test_octet_is_exact() {
        let octet = Octet;
        assert!(octet.compare(MatchType::Is, "C8H10N4O2", "C8H10N4O2"));
        assert!(!octet.compare(MatchType::Is, "c8h10n4o2", "C8H10N4O2"));
        assert!(octet.compare(MatchType::Contains, "hello world", "o w"));
        assert!(!octet.compare(MatchType::Contains, "hello world", "O W"));
        assert!(octet.compare(MatchType::Contains, "anything", ""));
    }

    #[test]
    fn test_casemap_folds_ascii_only() {
        let casemap = AsciiCasemap;
        assert!(casemap.compare(MatchType::Is, "Frobnitzm", "FROBNITZM"));
        assert!(casemap.compare(MatchType::Contains, "Make Money Fast", "money"));
        assert!(casemap.compare(MatchType::Matches, "Make Money Fast", "make*FAST"));
        assert!(!casemap.compare(MatchType::Is, "é", "É"));
    }
}
