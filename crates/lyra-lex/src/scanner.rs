//! Scanner implementation.
//!
//! The scanner consumes the source through a [`Cursor`] and emits tokens by
//! dispatching on the first character of each lexeme. Scanning cannot fail:
//! malformed input becomes [`TokenKind::Error`] tokens and the stream is
//! always terminated by a single [`TokenKind::Eof`].

use lyra_util::{FxHashMap, Span, Symbol};

use crate::cursor::Cursor;
use crate::token::{Token, TokenKind};

/// Keyword and type-identifier table.
///
/// All type names share the single [`TokenKind::TypeIdent`] kind; the
/// lexeme tells them apart downstream.
fn keyword_table() -> FxHashMap<&'static str, TokenKind> {
    let mut map = FxHashMap::default();
    map.insert("let", TokenKind::Let);
    map.insert("const", TokenKind::Const);
    map.insert("pointer", TokenKind::Pointer);
    map.insert("true", TokenKind::True);
    map.insert("false", TokenKind::False);
    map.insert("null", TokenKind::Null);
    map.insert("if", TokenKind::If);
    map.insert("else", TokenKind::Else);
    map.insert("while", TokenKind::While);
    map.insert("break", TokenKind::Break);
    map.insert("continue", TokenKind::Continue);
    map.insert("fn", TokenKind::Fn);
    map.insert("return", TokenKind::Return);
    map.insert("load", TokenKind::Load);
    map.insert("print", TokenKind::Print);
    for ty in [
        "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float",
        "string", "void", "bool",
    ] {
        map.insert(ty, TokenKind::TypeIdent);
    }
    map
}

/// Scanner for Lyra source text.
///
/// # Example
///
/// ```
/// use lyra_lex::{Scanner, TokenKind};
///
/// let tokens = Scanner::new("let a : uint32 = 3;").scan();
/// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
/// ```
pub struct Scanner<'a> {
    cursor: Cursor<'a>,
    keywords: FxHashMap<&'static str, TokenKind>,
    tokens: Vec<Token>,

    /// Starting byte offset of the current token.
    token_start: usize,

    /// Column where the current token starts (1-based).
    token_column: u32,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            keywords: keyword_table(),
            tokens: Vec::new(),
            token_start: 0,
            token_column: 1,
        }
    }

    /// Scans the whole source and returns the token stream.
    ///
    /// The returned vector always ends with exactly one `Eof` token.
    pub fn scan(mut self) -> Vec<Token> {
        while !self.cursor.is_at_end() {
            self.token_start = self.cursor.position();
            self.token_column = self.cursor.column();
            self.scan_token();
        }
        self.token_start = self.cursor.position();
        self.token_column = self.cursor.column();
        self.add_token(TokenKind::Eof);
        self.tokens
    }

    /// Scans a single token starting at the current position.
    fn scan_token(&mut self) {
        let c = self.cursor.current_char();
        self.cursor.advance();

        if c.is_ascii_digit() {
            return self.scan_number();
        }
        if c.is_ascii_alphabetic() {
            return self.scan_identifier();
        }
        if c == '"' {
            return self.scan_string();
        }

        match c {
            '(' => self.add_token(TokenKind::LParen),
            ')' => self.add_token(TokenKind::RParen),
            '{' => self.add_token(TokenKind::LBrace),
            '}' => self.add_token(TokenKind::RBrace),
            ',' => self.add_token(TokenKind::Comma),
            ':' => self.add_token(TokenKind::Colon),
            ';' => self.add_token(TokenKind::Semicolon),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '%' => self.add_token(TokenKind::Percent),
            '^' => self.add_token(TokenKind::Caret),
            '~' => self.add_token(TokenKind::Tilde),
            '/' => {
                // line comment or plain slash
                if self.cursor.match_char('/') {
                    while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                        self.cursor.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            '!' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.cursor.match_char('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.cursor.match_char('>') {
                    TokenKind::Shr
                } else if self.cursor.match_char('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.cursor.match_char('<') {
                    TokenKind::Shl
                } else if self.cursor.match_char('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                };
                self.add_token(kind);
            }
            '&' => {
                let kind = if self.cursor.match_char('&') {
                    TokenKind::AndAnd
                } else {
                    TokenKind::Amp
                };
                self.add_token(kind);
            }
            '|' => {
                let kind = if self.cursor.match_char('|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Pipe
                };
                self.add_token(kind);
            }
            // whitespace; newlines are counted by the cursor
            ' ' | '\r' | '\t' | '\n' => {}
            _ => self.add_error("Unknown token"),
        }
    }

    /// Scans a number literal.
    ///
    /// A run of digits, optionally continued as a hex literal (`x`/`X`
    /// followed by an alphanumeric) or a float (`.` followed by a digit).
    /// The parser classifies and converts; the scanner only delimits.
    fn scan_number(&mut self) {
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        let is_hex = matches!(self.cursor.current_char(), 'x' | 'X');
        let is_float = self.cursor.current_char() == '.';
        if (is_float && self.cursor.peek_char(1).is_ascii_digit())
            || (is_hex && self.cursor.peek_char(1).is_ascii_alphanumeric())
        {
            // skip the 'x' / '.'
            self.cursor.advance();
            loop {
                let c = self.cursor.current_char();
                let more = (is_float && c.is_ascii_digit()) || (is_hex && c.is_ascii_alphanumeric());
                if !more {
                    break;
                }
                self.cursor.advance();
            }
        }
        self.add_token(TokenKind::Number);
    }

    /// Scans an identifier, keyword, or type identifier.
    fn scan_identifier(&mut self) {
        loop {
            let c = self.cursor.current_char();
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.cursor.advance();
        }
        let lexeme = self.cursor.slice_from(self.token_start);
        let kind = self
            .keywords
            .get(lexeme)
            .copied()
            .unwrap_or(TokenKind::Ident);
        self.add_token(kind);
    }

    /// Scans a string literal.
    ///
    /// Strings may span lines. The stored lexeme includes the quotes; the
    /// parser strips them. Reaching end-of-input first yields an `Error`
    /// token instead.
    fn scan_string(&mut self) {
        while !self.cursor.is_at_end() && self.cursor.current_char() != '"' {
            self.cursor.advance();
        }
        if self.cursor.is_at_end() {
            return self.add_error("Unterminated string found");
        }
        // get beyond the closing quote
        self.cursor.advance();
        self.add_token(TokenKind::Str);
    }

    /// Pushes a token spanning from the token start to the current position.
    fn add_token(&mut self, kind: TokenKind) {
        let span = Span::new(
            self.token_start,
            self.cursor.position(),
            self.cursor.line(),
            self.token_column,
        );
        let lexeme = Symbol::intern(self.cursor.slice_from(self.token_start));
        self.tokens.push(Token::new(kind, lexeme, span));
    }

    /// Pushes an `Error` token carrying `message` as its lexeme.
    fn add_error(&mut self, message: &str) {
        let span = Span::new(
            self.token_start,
            self.cursor.position(),
            self.cursor.line(),
            self.token_column,
        );
        self.tokens
            .push(Token::new(TokenKind::Error, Symbol::intern(message), span));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<Token> {
        Scanner::new(source).scan()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source_yields_single_eof() {
        let tokens = scan("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("(){},:;"),
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Comma,
                TokenKind::Colon,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators_greedy() {
        assert_eq!(
            kinds("! != = == < <= << > >= >> & && | || ^ ~ %"),
            vec![
                TokenKind::Bang,
                TokenKind::NotEq,
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Shl,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Shr,
                TokenKind::Amp,
                TokenKind::AndAnd,
                TokenKind::Pipe,
                TokenKind::OrOr,
                TokenKind::Caret,
                TokenKind::Tilde,
                TokenKind::Percent,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = scan("let foo while whilex fn");
        assert_eq!(tokens[0].kind, TokenKind::Let);
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].lexeme.as_str(), "foo");
        assert_eq!(tokens[2].kind, TokenKind::While);
        assert_eq!(tokens[3].kind, TokenKind::Ident);
        assert_eq!(tokens[4].kind, TokenKind::Fn);
    }

    #[test]
    fn test_type_identifiers() {
        for ty in [
            "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64", "float",
            "string", "void", "bool",
        ] {
            let tokens = scan(ty);
            assert_eq!(tokens[0].kind, TokenKind::TypeIdent, "{ty}");
            assert_eq!(tokens[0].lexeme.as_str(), ty);
        }
    }

    #[test]
    fn test_identifier_with_underscore() {
        let tokens = scan("c_foo2");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].lexeme.as_str(), "c_foo2");
    }

    #[test]
    fn test_decimal_number() {
        let tokens = scan("12345");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme.as_str(), "12345");
    }

    #[test]
    fn test_float_number() {
        let tokens = scan("3.14");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme.as_str(), "3.14");
    }

    #[test]
    fn test_hex_number() {
        let tokens = scan("0xFF");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme.as_str(), "0xFF");
    }

    #[test]
    fn test_trailing_dot_is_not_float() {
        // "1." is a number followed by an unknown byte
        let tokens = scan("1.");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme.as_str(), "1");
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme.as_str(), "Unknown token");
    }

    #[test]
    fn test_string_literal_keeps_quotes() {
        let tokens = scan("\"hello\"");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme.as_str(), "\"hello\"");
    }

    #[test]
    fn test_multiline_string_advances_line() {
        let tokens = scan("\"a\nb\" x");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        // identifier after the string sits on line 2
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].line(), 2);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = scan("\"oops");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].lexeme.as_str(), "Unterminated string found");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(
            kinds("a // the rest is gone\nb"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comment_at_end_of_input() {
        assert_eq!(kinds("// nothing"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_unknown_byte() {
        let tokens = scan("@");
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[0].lexeme.as_str(), "Unknown token");
    }

    #[test]
    fn test_line_numbers() {
        let tokens = scan("a\nb\n\nc");
        assert_eq!(tokens[0].line(), 1);
        assert_eq!(tokens[1].line(), 2);
        assert_eq!(tokens[2].line(), 4);
    }

    #[test]
    fn test_lexemes_are_source_slices() {
        let source = "let a : uint32 = 3; print(a + 4);";
        for token in scan(source) {
            if token.kind == TokenKind::Error {
                continue;
            }
            assert_eq!(
                token.lexeme.as_str(),
                &source[token.span.start..token.span.end]
            );
        }
    }

    #[test]
    fn test_scenario_program() {
        let source = "let i : uint8 = 0; while (i < 5) { if (i == 3) { break; } print(i); i = i + 1; }";
        let tokens = scan(source);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1
        );
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Break));
    }
}
