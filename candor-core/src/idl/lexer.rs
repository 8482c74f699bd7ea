use super::{ParseError, Position};
use std::{iter::Peekable, str::CharIndices};

#[derive(Debug, Clone, PartialEq)]
pub(super) enum TokenKind {
    /// Identifiers and keywords alike, the parser tells them apart.
    Ident(String),
    Text(String),
    Number(u64),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Colon,
    Comma,
    Equals,
    Arrow,
    Eof,
}

impl TokenKind {
    pub(super) fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Text(text) => format!("{text:?}"),
            TokenKind::Number(n) => n.to_string(),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::LBrace => "{".into(),
            TokenKind::RBrace => "}".into(),
            TokenKind::Semi => ";".into(),
            TokenKind::Colon => ":".into(),
            TokenKind::Comma => ",".into(),
            TokenKind::Equals => "=".into(),
            TokenKind::Arrow => "->".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Token {
    pub kind: TokenKind,
    pub at: Position,
}

/// Splits IDL text into tokens, skipping whitespace and comments.
pub(super) fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut lexer = Lexer {
        chars: text.char_indices().peekable(),
        text,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    text: &'a str,
    line: usize,
    column: usize,
}

impl Lexer<'_> {
    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.text.len(), |(i, _)| *i)
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Block comments nest.
    fn skip_block_comment(&mut self) -> Result<(), ParseError> {
        let start = self.position();
        self.bump();
        self.bump();
        let mut depth = 1;
        while depth > 0 {
            match (self.bump(), self.peek()) {
                (Some('/'), Some('*')) => {
                    self.bump();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.bump();
                    depth -= 1;
                }
                (Some(_), _) => {}
                (None, _) => return Err(ParseError::UnterminatedComment(start)),
            }
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        let at = self.position();
        let Some(c) = self.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                at,
            });
        };

        let kind = match c {
            '(' | ')' | '{' | '}' | ';' | ':' | ',' | '=' => {
                self.bump();
                match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ';' => TokenKind::Semi,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    _ => TokenKind::Equals,
                }
            }
            '-' if self.peek_second() == Some('>') => {
                self.bump();
                self.bump();
                TokenKind::Arrow
            }
            '"' => TokenKind::Text(self.text_literal(at)?),
            c if c.is_ascii_digit() => TokenKind::Number(self.number(at)?),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = self.offset();
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    self.bump();
                }
                let end = self.offset();
                TokenKind::Ident(self.text[start..end].to_string())
            }
            other => return Err(ParseError::InvalidCharacter { ch: other, at }),
        };
        Ok(Token { kind, at })
    }

    fn number(&mut self, at: Position) -> Result<u64, ParseError> {
        let start = self.offset();
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let end = self.offset();
        let raw = &self.text[start..end];
        let digits = raw.replace('_', "");

        let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => digits.parse::<u64>(),
        };
        parsed.map_err(|_| ParseError::InvalidNumber {
            text: raw.to_string(),
            at,
        })
    }

    fn text_literal(&mut self, at: Position) -> Result<String, ParseError> {
        self.bump();
        let mut bytes = Vec::new();
        loop {
            let escape_at = self.position();
            match self.bump() {
                None => return Err(ParseError::UnterminatedText(at)),
                Some('"') => break,
                Some('\\') => self.escape(&mut bytes, escape_at)?,
                Some(c) => {
                    let mut buf = [0u8; 4];
                    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        String::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8(at))
    }

    fn escape(&mut self, bytes: &mut Vec<u8>, at: Position) -> Result<(), ParseError> {
        let invalid = |escape: &str| ParseError::InvalidEscape {
            escape: escape.to_string(),
            at,
        };
        let c = self.bump().ok_or(ParseError::UnterminatedText(at))?;
        let simple = match c {
            'n' => Some(b'\n'),
            'r' => Some(b'\r'),
            't' => Some(b'\t'),
            '\\' => Some(b'\\'),
            '"' => Some(b'"'),
            '\'' => Some(b'\''),
            _ => None,
        };
        if let Some(byte) = simple {
            bytes.push(byte);
            return Ok(());
        }

        match c {
            // \u{XXXX}
            'u' => {
                if self.bump() != Some('{') {
                    return Err(invalid("\\u"));
                }
                let mut hex = String::new();
                loop {
                    match self.bump() {
                        Some('}') => break,
                        Some(d) if d.is_ascii_hexdigit() || d == '_' => hex.push(d),
                        _ => return Err(invalid(&format!("\\u{{{hex}"))),
                    }
                }
                let ch = u32::from_str_radix(&hex.replace('_', ""), 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(&format!("\\u{{{hex}}}")))?;
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            // \XX, a raw byte in hex
            high if high.is_ascii_hexdigit() => {
                let low = self
                    .bump()
                    .filter(char::is_ascii_hexdigit)
                    .ok_or_else(|| invalid(&format!("\\{high}")))?;
                let value = high.to_digit(16).unwrap_or_default() * 16
                    + low.to_digit(16).unwrap_or_default();
                bytes.push(value as u8);
            }
            other => return Err(invalid(&format!("\\{other}"))),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_punctuation_and_identifiers() {
        assert_eq!(
            kinds("type T = func (nat) -> ();"),
            vec![
                TokenKind::Ident("type".into()),
                TokenKind::Ident("T".into()),
                TokenKind::Equals,
                TokenKind::Ident("func".into()),
                TokenKind::LParen,
                TokenKind::Ident("nat".into()),
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped_and_nest() {
        assert_eq!(
            kinds("// line\n/* outer /* inner */ still comment */ nat"),
            vec![TokenKind::Ident("nat".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_numbers_and_text() {
        assert_eq!(
            kinds(r#"1_000 0x2A "a\"b\n" "\u{48}\69""#),
            vec![
                TokenKind::Number(1000),
                TokenKind::Number(42),
                TokenKind::Text("a\"b\n".into()),
                TokenKind::Text("Hi".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_are_tracked() {
        let tokens = tokenize("type\n  T").unwrap();
        assert_eq!(tokens[1].at, Position { line: 2, column: 3 });
    }

    #[test]
    fn test_lexical_errors() {
        assert!(matches!(
            tokenize("\"open"),
            Err(ParseError::UnterminatedText(Position { line: 1, column: 1 }))
        ));
        assert!(matches!(
            tokenize("/* never closed"),
            Err(ParseError::UnterminatedComment(_))
        ));
        assert!(matches!(
            tokenize("type T = nat @"),
            Err(ParseError::InvalidCharacter { ch: '@', .. })
        ));
        assert!(matches!(
            tokenize("12abc"),
            Err(ParseError::InvalidNumber { .. })
        ));
    }
}
