//! SIEVE script tokenizer (RFC 3028 section 8.1).

use crate::sieve::error::{Result, SieveError};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A `:tag` like `:is`, `:contains`, `:over`, `:domain`, lower-cased.
    Tag(String),
    /// An unquoted identifier like `if`, `header`, `allof`, `fileinto`.
    Identifier(String),
    /// A double-quoted string with escapes resolved.
    QuotedString(String),
    /// A multi-line string `text:\r\n...\r\n.\r\n`, dot-unstuffed.
    MultiLineString(String),
    /// A numeric literal, possibly with K/M/G suffix.
    Number(String),
    Semicolon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

#[derive(Debug, Clone)]
pub struct Span {
    pub token: Token,
    pub offset: usize,
    pub len: usize,
    pub line: usize,
    pub column: usize,
}

/// Maps byte offsets to 1-based line and column numbers.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(input: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(input.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&s| s <= offset);
        let column = offset - self.starts[line - 1] + 1;
        (line, column)
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Span>> {
    let index = LineIndex::new(input);
    let error = |offset: usize, message: String| {
        let (line, column) = index.position(offset);
        SieveError::Parse {
            line,
            column,
            message,
        }
    };

    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let token = match bytes[i] {
            b';' => {
                i += 1;
                Token::Semicolon
            }
            b',' => {
                i += 1;
                Token::Comma
            }
            b'(' => {
                i += 1;
                Token::LParen
            }
            b')' => {
                i += 1;
                Token::RParen
            }
            b'{' => {
                i += 1;
                Token::LBrace
            }
            b'}' => {
                i += 1;
                Token::RBrace
            }
            b'[' => {
                i += 1;
                Token::LBracket
            }
            b']' => {
                i += 1;
                Token::RBracket
            }

            // Hash comment runs to end of line
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }

            b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                i += 2;
                loop {
                    if i + 1 >= bytes.len() {
                        return Err(error(start, "Unterminated block comment".to_string()));
                    }
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        break;
                    }
                    i += 1;
                }
                i += 2;
                continue;
            }

            b'"' => {
                i += 1;
                let mut buf = Vec::new();
                loop {
                    if i >= bytes.len() {
                        return Err(error(start, "Unterminated string".to_string()));
                    }
                    match bytes[i] {
                        b'\\' if i + 1 < bytes.len() => {
                            buf.push(bytes[i + 1]);
                            i += 2;
                        }
                        b'"' => {
                            i += 1;
                            break;
                        }
                        b => {
                            buf.push(b);
                            i += 1;
                        }
                    }
                }
                // Escapes only ever drop an ASCII backslash, so the bytes stay valid UTF-8
                Token::QuotedString(String::from_utf8_lossy(&buf).into_owned())
            }

            b't' | b'T' if bytes.len() >= i + 5 && bytes[i..i + 5].eq_ignore_ascii_case(b"text:") => {
                i += 5;
                // Rest of the opening line may only hold whitespace or a comment
                while i < bytes.len() && bytes[i] != b'\n' {
                    if bytes[i] == b'#' {
                        while i < bytes.len() && bytes[i] != b'\n' {
                            i += 1;
                        }
                        break;
                    }
                    if !bytes[i].is_ascii_whitespace() {
                        return Err(error(i, "Unexpected text after 'text:'".to_string()));
                    }
                    i += 1;
                }
                if i < bytes.len() {
                    i += 1;
                }

                let mut body = String::new();
                loop {
                    if i >= bytes.len() {
                        return Err(error(start, "Unterminated multi-line string".to_string()));
                    }
                    let line_end = input[i..].find('\n').map(|n| i + n).unwrap_or(bytes.len());
                    let line = input[i..line_end].trim_end_matches('\r');
                    i = (line_end + 1).min(bytes.len());
                    if line == "." {
                        break;
                    }
                    body.push_str(line.strip_prefix("..").map_or(line, |_| &line[1..]));
                    body.push_str("\r\n");
                }
                Token::MultiLineString(body)
            }

            b':' => {
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                if i == start + 1 {
                    return Err(error(start, "Empty tag".to_string()));
                }
                Token::Tag(input[start..i].to_ascii_lowercase())
            }

            b'0'..=b'9' => {
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len() && matches!(bytes[i], b'K' | b'k' | b'M' | b'm' | b'G' | b'g')
                {
                    i += 1;
                }
                Token::Number(input[start..i].to_string())
            }

            b if b.is_ascii_alphabetic() || b == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                Token::Identifier(input[start..i].to_string())
            }

            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(error(start, format!("Unexpected character '{ch}'")));
            }
        };

        let (line, column) = index.position(start);
        tokens.push(Span {
            token,
            offset: start,
            len: i - start,
            line,
            column,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokens() {
        let tokens = tokenize("require \"fileinto\";").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(matches!(&tokens[0].token, Token::Identifier(s) if s == "require"));
        assert!(matches!(&tokens[1].token, Token::QuotedString(s) if s == "fileinto"));
        assert!(matches!(&tokens[2].token, Token::Semicolon));
    }

    #[test]
    fn test_tags_are_lowercased() {
        let tokens = tokenize("header :CONTAINS \"Subject\" \"SPAM\"").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(matches!(&tokens[1].token, Token::Tag(s) if s == ":contains"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = tokenize("# Filter: test\nkeep; /* block\ncomment */ stop;").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(matches!(&tokens[0].token, Token::Identifier(s) if s == "keep"));
        assert_eq!(tokens[0].line, 2);
        assert!(matches!(&tokens[2].token, Token::Identifier(s) if s == "stop"));
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_string_escapes_and_utf8() {
        let tokens = tokenize(r#""a \"quoted\" \\ word" "café""#).unwrap();
        assert!(matches!(&tokens[0].token, Token::QuotedString(s) if s == "a \"quoted\" \\ word"));
        assert!(matches!(&tokens[1].token, Token::QuotedString(s) if s == "café"));
    }

    #[test]
    fn test_number_with_suffix() {
        let tokens = tokenize("100K").unwrap();
        assert!(matches!(&tokens[0].token, Token::Number(s) if s == "100K"));
    }

    #[test]
    fn test_multiline_string_is_dot_unstuffed() {
        let input = "reject text:\r\nI'm away.\r\n..hidden\r\n.\r\n;";
        let tokens = tokenize(input).unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(
            matches!(&tokens[1].token, Token::MultiLineString(s) if s == "I'm away.\r\n.hidden\r\n")
        );
        assert!(matches!(&tokens[2].token, Token::Semicolon));
    }

    #[test]
    fn test_errors_carry_position() {
        match tokenize("keep;\n  \"open") {
            Err(SieveError::Parse { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
            }
            other => panic!("Expected parse error, got {other:?}"),
        }
        assert!(tokenize("keep $").is_err());
    }
}
