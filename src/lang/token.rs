pub use super::ident::Name;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Eof,
    Newline,
    Number(String),
    Str(String),
    Name(Name),
    Command(Command),
    Operator(Operator),
    Word(Word),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        *self == Token::Eof
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Token::*;
        match self {
            Eof => write!(f, "end of input"),
            Newline => write!(f, "newline"),
            Number(s) => write!(f, "{}", s),
            Str(s) => write!(f, "\"{}\"", s),
            Name(s) => write!(f, "{}", s),
            Command(s) => write!(f, "{}", s),
            Operator(s) => write!(f, "{}", s),
            Word(s) => write!(f, "{}", s),
            LParen => write!(f, "("),
            RParen => write!(f, ")"),
            LBracket => write!(f, "["),
            RBracket => write!(f, "]"),
            LBrace => write!(f, "{{"),
            RBrace => write!(f, "}}"),
            Comma => write!(f, ","),
            Semicolon => write!(f, ";"),
        }
    }
}

/// ## dc commands
///
/// Every dc command is a single character, except the negated
/// comparisons which are `!` followed by the comparison.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Command {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,
    Power,
    Divmod,
    Modexp,
    Sqrt,
    Print,
    PrintPop,
    PrintStream,
    PrintStack,
    Clear,
    Duplicate,
    Swap,
    Pop,
    StackLen,
    Length,
    ScaleFunc,
    Asciify,
    Execute,
    Quit,
    NQuit,
    Ibase,
    Obase,
    Scale,
    Negate,
    Read,
    Store,
    StorePush,
    Load,
    LoadPop,
    ArrayStore,
    ArrayLoad,
    StoreIbase,
    StoreObase,
    StoreScale,
    Equal,
    Less,
    Greater,
    NotEqual,
    NotLess,
    NotGreater,
    Else,
}

impl Command {
    pub fn from_char(c: char) -> Option<Command> {
        use Command::*;
        Some(match c {
            '+' => Plus,
            '-' => Minus,
            '*' => Multiply,
            '/' => Divide,
            '%' => Modulus,
            '^' => Power,
            '~' => Divmod,
            '|' => Modexp,
            'v' => Sqrt,
            'p' => Print,
            'n' => PrintPop,
            'P' => PrintStream,
            'f' => PrintStack,
            'c' => Clear,
            'd' => Duplicate,
            'r' => Swap,
            'R' => Pop,
            'z' => StackLen,
            'Z' => Length,
            'X' => ScaleFunc,
            'a' => Asciify,
            'x' => Execute,
            'q' => Quit,
            'Q' => NQuit,
            'I' => Ibase,
            'O' => Obase,
            'K' => Scale,
            '_' => Negate,
            '?' => Read,
            's' => Store,
            'S' => StorePush,
            'l' => Load,
            'L' => LoadPop,
            ':' => ArrayStore,
            ';' => ArrayLoad,
            'i' => StoreIbase,
            'o' => StoreObase,
            'k' => StoreScale,
            '=' => Equal,
            '<' => Less,
            '>' => Greater,
            'e' => Else,
            _ => return None,
        })
    }

    /// The negated comparisons `!=`, `!<`, and `!>`.
    pub fn negated(c: char) -> Option<Command> {
        match c {
            '=' => Some(Command::NotEqual),
            '<' => Some(Command::NotLess),
            '>' => Some(Command::NotGreater),
            _ => None,
        }
    }

    /// Commands whose next token is a register name.
    pub fn takes_register(&self) -> bool {
        use Command::*;
        matches!(
            self,
            Store
                | StorePush
                | Load
                | LoadPop
                | ArrayStore
                | ArrayLoad
                | Equal
                | Less
                | Greater
                | NotEqual
                | NotLess
                | NotGreater
                | Else
        )
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Command::*;
        let s = match self {
            Plus => "+",
            Minus => "-",
            Multiply => "*",
            Divide => "/",
            Modulus => "%",
            Power => "^",
            Divmod => "~",
            Modexp => "|",
            Sqrt => "v",
            Print => "p",
            PrintPop => "n",
            PrintStream => "P",
            PrintStack => "f",
            Clear => "c",
            Duplicate => "d",
            Swap => "r",
            Pop => "R",
            StackLen => "z",
            Length => "Z",
            ScaleFunc => "X",
            Asciify => "a",
            Execute => "x",
            Quit => "q",
            NQuit => "Q",
            Ibase => "I",
            Obase => "O",
            Scale => "K",
            Negate => "_",
            Read => "?",
            Store => "s",
            StorePush => "S",
            Load => "l",
            LoadPop => "L",
            ArrayStore => ":",
            ArrayLoad => ";",
            StoreIbase => "i",
            StoreObase => "o",
            StoreScale => "k",
            Equal => "=",
            Less => "<",
            Greater => ">",
            NotEqual => "!=",
            NotLess => "!<",
            NotGreater => "!>",
            Else => "e",
        };
        write!(f, "{}", s)
    }
}

/// ## bc operators
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    Increment,
    Decrement,
    Power,
    Multiply,
    Divide,
    Modulus,
    Plus,
    Minus,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    And,
    Or,
    Assign,
    AssignPower,
    AssignMultiply,
    AssignDivide,
    AssignModulus,
    AssignPlus,
    AssignMinus,
}

impl Operator {
    pub fn is_assignment(&self) -> bool {
        use Operator::*;
        matches!(
            self,
            Assign
                | AssignPower
                | AssignMultiply
                | AssignDivide
                | AssignModulus
                | AssignPlus
                | AssignMinus
        )
    }

    pub fn is_relational(&self) -> bool {
        use Operator::*;
        matches!(
            self,
            Equal | NotEqual | Less | LessEqual | Greater | GreaterEqual
        )
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Operator::*;
        let s = match self {
            Increment => "++",
            Decrement => "--",
            Power => "^",
            Multiply => "*",
            Divide => "/",
            Modulus => "%",
            Plus => "+",
            Minus => "-",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Not => "!",
            And => "&&",
            Or => "||",
            Assign => "=",
            AssignPower => "^=",
            AssignMultiply => "*=",
            AssignDivide => "/=",
            AssignModulus => "%=",
            AssignPlus => "+=",
            AssignMinus => "-=",
        };
        write!(f, "{}", s)
    }
}

/// ## bc keywords
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Word {
    Auto,
    Break,
    Continue,
    Define,
    Else,
    For,
    Halt,
    Ibase,
    If,
    Last,
    Length,
    Obase,
    Print,
    Quit,
    Read,
    Return,
    Scale,
    Sqrt,
    While,
}

impl Word {
    pub fn from_string(s: &str) -> Option<Word> {
        use Word::*;
        Some(match s {
            "auto" => Auto,
            "break" => Break,
            "continue" => Continue,
            "define" => Define,
            "else" => Else,
            "for" => For,
            "halt" => Halt,
            "ibase" => Ibase,
            "if" => If,
            "last" => Last,
            "length" => Length,
            "obase" => Obase,
            "print" => Print,
            "quit" => Quit,
            "read" => Read,
            "return" => Return,
            "scale" => Scale,
            "sqrt" => Sqrt,
            "while" => While,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Word::*;
        let s = match self {
            Auto => "auto",
            Break => "break",
            Continue => "continue",
            Define => "define",
            Else => "else",
            For => "for",
            Halt => "halt",
            Ibase => "ibase",
            If => "if",
            Last => "last",
            Length => "length",
            Obase => "obase",
            Print => "print",
            Quit => "quit",
            Read => "read",
            Return => "return",
            Scale => "scale",
            Sqrt => "sqrt",
            While => "while",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string() {
        assert_eq!(Word::from_string("while"), Some(Word::While));
        assert_eq!(Word::from_string("pickles"), None);
        for word in &[Word::Auto, Word::Define, Word::Sqrt, Word::Last] {
            assert_eq!(Word::from_string(&word.to_string()), Some(*word));
        }
    }

    #[test]
    fn test_command_chars() {
        assert_eq!(Command::from_char('s'), Some(Command::Store));
        assert_eq!(Command::negated('<'), Some(Command::NotLess));
        assert_eq!(Command::from_char('!'), None);
        assert!(Command::Else.takes_register());
        assert!(!Command::Print.takes_register());
    }
}
