use super::{token::*, Column, Error, ErrorCode};
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// ## Token source
///
/// The parser holds one token of lookahead and asks for the next one
/// on demand. Text is loaded one statement (or one file) at a time.
pub trait TokenSource {
    /// Replaces any remaining input with `text`.
    fn load(&mut self, text: &str);
    fn next_token(&mut self) -> Result<Token>;
    /// Character range of the token most recently returned.
    fn column(&self) -> Column;
    /// Drops the rest of the input so the next token is `Eof`.
    fn discard(&mut self);
}

/// True when `text` stops inside a string or block comment, so more
/// lines are needed before it can be parsed.
pub fn ends_inside_literal(lex: &mut dyn TokenSource, text: &str) -> bool {
    lex.load(text);
    let mut stuck = None;
    loop {
        match lex.next_token() {
            Ok(Token::Eof) => return false,
            Ok(_) => stuck = None,
            Err(e) => match e.code() {
                ErrorCode::NoStringEnd | ErrorCode::NoCommentEnd => return true,
                _ if stuck == Some(lex.column()) => return false,
                _ => stuck = Some(lex.column()),
            },
        }
    }
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('A'..='F').contains(&c)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r' || c == '\x0b' || c == '\x0c'
}

#[derive(Debug, Default)]
struct Cursor {
    chars: Vec<char>,
    pos: usize,
    start: usize,
}

impl Cursor {
    fn load(&mut self, text: &str) {
        self.chars = text.chars().collect();
        self.pos = 0;
        self.start = 0;
    }
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }
    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
    fn mark(&mut self) {
        self.start = self.pos;
    }
    fn column(&self) -> Column {
        self.start..self.pos
    }
    fn discard(&mut self) {
        self.pos = self.chars.len();
        self.start = self.pos;
    }
}

trait Tokenizers {
    fn cursor(&mut self) -> &mut Cursor;

    fn number(&mut self) -> Token {
        let cur = self.cursor();
        let mut s = String::new();
        let mut decimal = false;
        loop {
            match cur.peek() {
                Some(c) if is_digit(c) => s.push(c),
                Some('.') if !decimal => {
                    decimal = true;
                    s.push('.');
                }
                Some('\\') if cur.peek_nth(1) == Some('\n') => {
                    cur.bump();
                }
                _ => break,
            }
            cur.bump();
        }
        Token::Number(s)
    }

    fn line_comment(&mut self) {
        let cur = self.cursor();
        while let Some(c) = cur.peek() {
            if c == '\n' {
                break;
            }
            cur.bump();
        }
    }

    fn identifier(&mut self) -> String {
        let cur = self.cursor();
        let mut s = String::new();
        while let Some(c) = cur.peek() {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                s.push(c);
                cur.bump();
            } else {
                break;
            }
        }
        s
    }
}

/// ## dc lexer
#[derive(Debug, Default)]
pub struct DcLexer {
    cur: Cursor,
    extended_registers: bool,
    register_next: bool,
}

impl Tokenizers for DcLexer {
    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cur
    }
}

impl DcLexer {
    pub fn new(extended_registers: bool) -> DcLexer {
        DcLexer {
            extended_registers,
            ..DcLexer::default()
        }
    }

    fn register(&mut self) -> Result<Token> {
        self.cur.mark();
        let c = match self.cur.peek() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };
        if c.is_whitespace() {
            if !self.extended_registers {
                self.cur.bump();
                return Err(error!(BadToken, ..&self.cur.column(); "BAD REGISTER"));
            }
            while let Some(c) = self.cur.peek() {
                if !c.is_whitespace() {
                    break;
                }
                self.cur.bump();
            }
            self.cur.mark();
            let s = self.identifier();
            if !Name::is_bc_identifier(&s) {
                return Err(error!(BadToken, ..&self.cur.column(); "BAD REGISTER"));
            }
            return Ok(Token::Name(Name::new(&s, &self.cur.column())?));
        }
        self.cur.bump();
        Ok(Token::Name(Name::new(
            c.encode_utf8(&mut [0; 4]),
            &self.cur.column(),
        )?))
    }

    fn string(&mut self) -> Result<Token> {
        self.cur.bump();
        let mut s = String::new();
        let mut depth = 1;
        loop {
            let c = match self.cur.bump() {
                Some(c) => c,
                None => return Err(error!(NoStringEnd, ..&self.cur.column())),
            };
            if c == '[' {
                depth += 1;
            } else if c == ']' {
                depth -= 1;
                if depth == 0 {
                    return Ok(Token::Str(s));
                }
            }
            s.push(c);
        }
    }
}

impl TokenSource for DcLexer {
    fn load(&mut self, text: &str) {
        self.cur.load(text);
        self.register_next = false;
    }

    fn next_token(&mut self) -> Result<Token> {
        if self.register_next {
            self.register_next = false;
            return self.register();
        }
        loop {
            while let Some(c) = self.cur.peek() {
                if !is_blank(c) && c != '\n' {
                    break;
                }
                self.cur.bump();
            }
            self.cur.mark();
            let c = match self.cur.peek() {
                Some(c) => c,
                None => return Ok(Token::Eof),
            };
            if c == '#' {
                self.line_comment();
                continue;
            }
            if c == '[' {
                return self.string();
            }
            if is_digit(c) || c == '.' {
                return Ok(self.number());
            }
            self.cur.bump();
            let command = if c == '!' {
                match self.cur.bump().and_then(Command::negated) {
                    Some(command) => command,
                    None => return Err(error!(BadCharacter, ..&self.cur.column())),
                }
            } else {
                match Command::from_char(c) {
                    Some(command) => command,
                    None => return Err(error!(BadCharacter, ..&self.cur.column())),
                }
            };
            self.register_next = command.takes_register();
            return Ok(Token::Command(command));
        }
    }

    fn column(&self) -> Column {
        self.cur.column()
    }

    fn discard(&mut self) {
        self.cur.discard();
        self.register_next = false;
    }
}

/// ## bc lexer
#[derive(Debug, Default)]
pub struct BcLexer {
    cur: Cursor,
}

impl Tokenizers for BcLexer {
    fn cursor(&mut self) -> &mut Cursor {
        &mut self.cur
    }
}

impl BcLexer {
    pub fn new() -> BcLexer {
        BcLexer::default()
    }

    fn string(&mut self) -> Result<Token> {
        self.cur.bump();
        let mut s = String::new();
        loop {
            match self.cur.bump() {
                Some('"') => return Ok(Token::Str(s)),
                Some(c) => s.push(c),
                None => return Err(error!(NoStringEnd, ..&self.cur.column())),
            }
        }
    }

    fn block_comment(&mut self) -> Result<()> {
        self.cur.bump();
        self.cur.bump();
        loop {
            match self.cur.bump() {
                Some('*') if self.cur.peek() == Some('/') => {
                    self.cur.bump();
                    return Ok(());
                }
                Some(_) => continue,
                None => return Err(error!(NoCommentEnd, ..&self.cur.column())),
            }
        }
    }

    fn operator(&mut self, c: char) -> Result<Token> {
        use Operator::*;
        let cur = &mut self.cur;
        let op = match c {
            '+' if cur.eat('+') => Increment,
            '+' if cur.eat('=') => AssignPlus,
            '+' => Plus,
            '-' if cur.eat('-') => Decrement,
            '-' if cur.eat('=') => AssignMinus,
            '-' => Minus,
            '*' if cur.eat('=') => AssignMultiply,
            '*' => Multiply,
            '/' if cur.eat('=') => AssignDivide,
            '/' => Divide,
            '%' if cur.eat('=') => AssignModulus,
            '%' => Modulus,
            '^' if cur.eat('=') => AssignPower,
            '^' => Power,
            '=' if cur.eat('=') => Equal,
            '=' => Assign,
            '!' if cur.eat('=') => NotEqual,
            '!' => Not,
            '<' if cur.eat('=') => LessEqual,
            '<' => Less,
            '>' if cur.eat('=') => GreaterEqual,
            '>' => Greater,
            '&' if cur.eat('&') => And,
            '|' if cur.eat('|') => Or,
            _ => return Err(error!(BadCharacter, ..&cur.column())),
        };
        Ok(Token::Operator(op))
    }
}

impl TokenSource for BcLexer {
    fn load(&mut self, text: &str) {
        self.cur.load(text);
    }

    fn next_token(&mut self) -> Result<Token> {
        loop {
            loop {
                match self.cur.peek() {
                    Some(c) if is_blank(c) => {}
                    Some('\\') if self.cur.peek_nth(1) == Some('\n') => {
                        self.cur.bump();
                    }
                    _ => break,
                }
                self.cur.bump();
            }
            self.cur.mark();
            let c = match self.cur.peek() {
                Some(c) => c,
                None => return Ok(Token::Eof),
            };
            if c == '#' {
                self.line_comment();
                continue;
            }
            if c == '/' && self.cur.peek_nth(1) == Some('*') {
                self.block_comment()?;
                continue;
            }
            if is_digit(c) {
                return Ok(self.number());
            }
            if c == '.' {
                if self.cur.peek_nth(1).map_or(false, |c| c.is_ascii_digit()) {
                    return Ok(self.number());
                }
                self.cur.bump();
                return Ok(Token::Word(Word::Last));
            }
            if c.is_ascii_lowercase() {
                let s = self.identifier();
                if let Some(word) = Word::from_string(&s) {
                    return Ok(Token::Word(word));
                }
                return Ok(Token::Name(Name::new(&s, &self.cur.column())?));
            }
            if c == '"' {
                return self.string();
            }
            self.cur.bump();
            return Ok(match c {
                '\n' => Token::Newline,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                _ => return self.operator(c),
            });
        }
    }

    fn column(&self) -> Column {
        self.cur.column()
    }

    fn discard(&mut self) {
        self.cur.discard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    fn tokens<T: TokenSource>(lexer: &mut T, s: &str) -> Vec<Token> {
        lexer.load(s);
        let mut v = vec![];
        loop {
            match lexer.next_token().unwrap() {
                Token::Eof => return v,
                t => v.push(t),
            }
        }
    }

    fn name(s: &str) -> Token {
        Token::Name(Name::new(s, &(0..0)).unwrap())
    }

    #[test]
    fn test_dc_register_follows_command() {
        let v = tokens(&mut DcLexer::new(false), "1 sa la p");
        assert_eq!(
            v,
            vec![
                Token::Number("1".to_string()),
                Token::Command(Command::Store),
                name("a"),
                Token::Command(Command::Load),
                name("a"),
                Token::Command(Command::Print),
            ]
        );
    }

    #[test]
    fn test_dc_register_can_be_any_char() {
        let v = tokens(&mut DcLexer::new(false), "s+l+");
        assert_eq!(v[1], name("+"));
        assert_eq!(v[3], name("+"));
    }

    #[test]
    fn test_dc_extended_register() {
        let v = tokens(&mut DcLexer::new(true), "s  total lx");
        assert_eq!(v[1], name("total"));
        assert_eq!(v[3], name("x"));
        let mut lexer = DcLexer::new(false);
        lexer.load("s a");
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap_err().code(), ErrorCode::BadToken);
    }

    #[test]
    fn test_dc_nested_string() {
        let v = tokens(&mut DcLexer::new(false), "[a[b]c]x");
        assert_eq!(v[0], Token::Str("a[b]c".to_string()));
        let mut lexer = DcLexer::new(false);
        lexer.load("[open");
        assert_eq!(
            lexer.next_token().unwrap_err().code(),
            ErrorCode::NoStringEnd
        );
    }

    #[test]
    fn test_dc_negated_compare() {
        let v = tokens(&mut DcLexer::new(false), "!<a !=b");
        assert_eq!(v[0], Token::Command(Command::NotLess));
        assert_eq!(v[2], Token::Command(Command::NotEqual));
    }

    #[test]
    fn test_dc_comment_and_hex() {
        let v = tokens(&mut DcLexer::new(false), "FF.8 # comment p\n_1");
        assert_eq!(v[0], Token::Number("FF.8".to_string()));
        assert_eq!(v[1], Token::Command(Command::Negate));
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_bc_operators() {
        let v = tokens(&mut BcLexer::new(), "a+=b++<=c&&!d");
        assert_eq!(v[1], Token::Operator(Operator::AssignPlus));
        assert_eq!(v[3], Token::Operator(Operator::Increment));
        assert_eq!(v[4], Token::Operator(Operator::LessEqual));
        assert_eq!(v[6], Token::Operator(Operator::And));
        assert_eq!(v[7], Token::Operator(Operator::Not));
    }

    #[test]
    fn test_bc_words_and_comments() {
        let v = tokens(&mut BcLexer::new(), "define f(x) /* c\n */ { # c\n}");
        assert_eq!(v[0], Token::Word(Word::Define));
        assert_eq!(v[1], name("f"));
        assert_eq!(v[5], Token::LBrace);
        assert_eq!(v[6], Token::Newline);
        assert_eq!(v[7], Token::RBrace);
    }

    #[test]
    fn test_bc_dot_is_last() {
        let v = tokens(&mut BcLexer::new(), ". .5 1.\\\n5");
        assert_eq!(v[0], Token::Word(Word::Last));
        assert_eq!(v[1], Token::Number(".5".to_string()));
        assert_eq!(v[2], Token::Number("1.5".to_string()));
    }

    #[test]
    fn test_bc_columns() {
        let mut lexer = BcLexer::new();
        lexer.load("  abc + 1");
        lexer.next_token().unwrap();
        assert_eq!(lexer.column(), 2..5);
        lexer.next_token().unwrap();
        assert_eq!(lexer.column(), 6..7);
    }

    #[test]
    fn test_ends_inside_literal() {
        let mut dc = DcLexer::new(false);
        assert!(ends_inside_literal(&mut dc, "1 [2"));
        assert!(ends_inside_literal(&mut dc, "[a [b]\nc"));
        assert!(!ends_inside_literal(&mut dc, "[1\np]sa"));
        assert!(!ends_inside_literal(&mut dc, "s["));
        assert!(!ends_inside_literal(&mut dc, "@ 1"));
        let mut bc = BcLexer::new();
        assert!(ends_inside_literal(&mut bc, "/* header"));
        assert!(ends_inside_literal(&mut bc, "x = 1; \"hi"));
        assert!(!ends_inside_literal(&mut bc, "/* a\n b */ 1"));
        assert!(!ends_inside_literal(&mut bc, "# [ \" /*"));
    }

    #[test]
    fn test_discard() {
        let mut lexer = BcLexer::new();
        lexer.load("1 + 2");
        lexer.next_token().unwrap();
        lexer.discard();
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}
