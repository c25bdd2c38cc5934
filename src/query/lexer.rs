//! Pull-based tokenizer for the note query language.
//!
//! Whitespace separates tokens and is otherwise ignored. A backslash makes
//! the next rune part of the current term whatever it is; a trailing lone
//! backslash is dropped. Quote and backtick are emitted as single-rune
//! tokens, and the parser asks for the raw text between them with
//! [`Lexer::phrase`].

use std::fmt;

/// Runes that never appear in a term unless escaped.
const SPECIAL_CHARS: &[char] = &['`', ':', '"', '*'];

/// Token type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Term,
    Colon,
    Backtick,
    Quote,
    Star,
    Hash,
    /// Any other printable rune that cannot start a term
    Symbol,
    /// Raw text between a pair of quotes or backticks
    Phrase,
    Eof,
    Error,
}

/// A lexed token. `pos` is the byte offset where the token starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub pos: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, pos: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }
}

/// An input rune the lexer cannot make sense of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub rune: char,
    pub pos: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected U+{:04X} at {}", self.rune as u32, self.pos)
    }
}

impl std::error::Error for LexError {}

/// Query lexer. Holds only per-call state.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Produce the next token. Errors do not stop the lexer: the offending
    /// rune is consumed and reported as an `Error` token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;
        let Some(ch) = self.peek_char() else {
            return Token::new(TokenKind::Eof, "", start);
        };

        if ch == '\\' || is_term_start(ch) {
            return self.lex_term();
        }

        self.advance();
        let kind = match ch {
            ':' => TokenKind::Colon,
            '`' => TokenKind::Backtick,
            '"' => TokenKind::Quote,
            '*' => TokenKind::Star,
            '#' => TokenKind::Hash,
            c if is_graphic(c) => TokenKind::Symbol,
            c => {
                let err = LexError { rune: c, pos: start };
                return Token::new(TokenKind::Error, err.to_string(), start);
            }
        };
        Token::new(kind, ch.to_string(), start)
    }

    /// Scan raw text up to (not including) the next unescaped `delim`.
    ///
    /// Backslash escapes apply as in terms. If the input ends first, the
    /// text read so far is returned and the following `next_token` is `Eof`.
    pub fn phrase(&mut self, delim: char) -> Token {
        let start = self.pos;
        let mut text = String::new();

        while let Some(ch) = self.peek_char() {
            if ch == delim {
                break;
            }
            self.advance();
            if ch == '\\' {
                if let Some(escaped) = self.peek_char() {
                    self.advance();
                    text.push(escaped);
                }
                continue;
            }
            text.push(ch);
        }

        Token::new(TokenKind::Phrase, text, start)
    }

    fn lex_term(&mut self) -> Token {
        let start = self.pos;
        let mut text = String::new();

        while let Some(ch) = self.peek_char() {
            if ch == '\\' {
                self.advance();
                if let Some(escaped) = self.peek_char() {
                    self.advance();
                    text.push(escaped);
                }
                continue;
            }

            let at_start = self.pos == start;
            let accepted = if at_start {
                is_term_start(ch)
            } else {
                is_term_continue(ch)
            };
            if !accepted {
                break;
            }
            self.advance();
            text.push(ch);
        }

        Token::new(TokenKind::Term, text, start)
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.pos += ch.len_utf8();
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields tokens up to, but not including, `Eof`.
    fn next(&mut self) -> Option<Token> {
        let token = self.next_token();
        (token.kind != TokenKind::Eof).then_some(token)
    }
}

fn is_term_start(ch: char) -> bool {
    is_term_continue(ch) && !is_punctuation(ch)
}

fn is_term_continue(ch: char) -> bool {
    is_graphic(ch) && !ch.is_whitespace() && !SPECIAL_CHARS.contains(&ch)
}

fn is_graphic(ch: char) -> bool {
    !ch.is_control() && !is_unassigned_format(ch)
}

/// Format and private-use code points that render as nothing useful.
fn is_unassigned_format(ch: char) -> bool {
    matches!(ch,
        '\u{200B}'..='\u{200F}'
        | '\u{2028}'..='\u{202E}'
        | '\u{2060}'..='\u{206F}'
        | '\u{FEFF}'
        | '\u{FFF9}'..='\u{FFFB}'
        | '\u{E000}'..='\u{F8FF}'
    )
}

/// Unicode punctuation (general category P*). ASCII symbols such as `+`, `$`
/// or `~` are category S and may start a term.
fn is_punctuation(ch: char) -> bool {
    if ch.is_ascii() {
        return ch.is_ascii_punctuation() && !matches!(ch, '$' | '+' | '<' | '=' | '>' | '^' | '`' | '|' | '~');
    }
    matches!(ch,
        '\u{00A1}' | '\u{00A7}' | '\u{00AB}' | '\u{00B6}' | '\u{00B7}' | '\u{00BB}' | '\u{00BF}'
        | '\u{037E}' | '\u{0387}'
        | '\u{055A}'..='\u{055F}'
        | '\u{0589}' | '\u{058A}'
        | '\u{05BE}' | '\u{05C0}' | '\u{05C3}' | '\u{05C6}' | '\u{05F3}' | '\u{05F4}'
        | '\u{060C}' | '\u{060D}' | '\u{061B}' | '\u{061F}'
        | '\u{066A}'..='\u{066D}'
        | '\u{06D4}'
        | '\u{0964}' | '\u{0965}' | '\u{0970}'
        | '\u{0E4F}' | '\u{0E5A}' | '\u{0E5B}'
        | '\u{2010}'..='\u{2027}'
        | '\u{2030}'..='\u{2043}'
        | '\u{2045}'..='\u{2051}'
        | '\u{2053}'..='\u{205E}'
        | '\u{207D}' | '\u{207E}' | '\u{208D}' | '\u{208E}'
        | '\u{2308}'..='\u{230B}'
        | '\u{2329}' | '\u{232A}'
        | '\u{2768}'..='\u{2775}'
        | '\u{27C5}' | '\u{27C6}'
        | '\u{27E6}'..='\u{27EF}'
        | '\u{2983}'..='\u{2998}'
        | '\u{29D8}'..='\u{29DB}'
        | '\u{29FC}' | '\u{29FD}'
        | '\u{2CF9}'..='\u{2CFC}' | '\u{2CFE}' | '\u{2CFF}'
        | '\u{2E00}'..='\u{2E2E}'
        | '\u{2E30}'..='\u{2E4F}'
        | '\u{3001}'..='\u{3003}'
        | '\u{3008}'..='\u{3011}'
        | '\u{3014}'..='\u{301F}'
        | '\u{3030}' | '\u{303D}' | '\u{30A0}' | '\u{30FB}'
        | '\u{FE10}'..='\u{FE19}'
        | '\u{FE30}'..='\u{FE52}'
        | '\u{FE54}'..='\u{FE61}'
        | '\u{FE63}' | '\u{FE68}' | '\u{FE6A}' | '\u{FE6B}'
        | '\u{FF01}'..='\u{FF03}'
        | '\u{FF05}'..='\u{FF0A}'
        | '\u{FF0C}'..='\u{FF0F}'
        | '\u{FF1A}' | '\u{FF1B}' | '\u{FF1F}' | '\u{FF20}'
        | '\u{FF3B}'..='\u{FF3D}'
        | '\u{FF3F}' | '\u{FF5B}' | '\u{FF5D}'
        | '\u{FF5F}'..='\u{FF65}'
    )
}
