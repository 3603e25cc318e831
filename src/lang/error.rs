use super::{Column, LineNumber};

#[derive(Clone, PartialEq)]
pub struct Error {
    code: ErrorCode,
    line_number: LineNumber,
    column: Column,
    message: &'static str,
}

#[doc(hidden)]
#[macro_export]
macro_rules! error {
    ($err:ident) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
    };
    ($err:ident, ..$col:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).in_column($col)
    };
    ($err:ident; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err).message($msg)
    };
    ($err:ident, ..$col:expr; $msg:expr) => {
        $crate::lang::Error::new($crate::lang::ErrorCode::$err)
            .in_column($col)
            .message($msg)
    };
}

impl Error {
    pub fn new(code: ErrorCode) -> Error {
        Error {
            code,
            line_number: None,
            column: 0..0,
            message: "",
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn line_number(&self) -> LineNumber {
        self.line_number
    }

    pub fn column(&self) -> Column {
        self.column.clone()
    }

    pub fn detail(&self) -> &'static str {
        self.message
    }

    /// Only running out of memory ends a session; every other error
    /// is recovered from by resetting the parser.
    pub fn is_fatal(&self) -> bool {
        self.code == ErrorCode::OutOfMemory
    }

    pub fn is_end_of_input(&self) -> bool {
        self.code == ErrorCode::EndOfInput
    }

    pub fn in_line_number(&self, line: LineNumber) -> Error {
        if self.line_number.is_some() {
            return self.clone();
        }
        Error {
            line_number: line,
            ..self.clone()
        }
    }

    /// Sets the line number of an error found in text of several
    /// lines, making the column relative to the line that starts at
    /// character `line_start`.
    pub fn at_line(&self, line: LineNumber, line_start: usize) -> Error {
        if self.line_number.is_some() {
            return self.clone();
        }
        let column = if self.column == (0..0) {
            0..0
        } else {
            self.column.start.saturating_sub(line_start)..self.column.end.saturating_sub(line_start)
        };
        Error {
            line_number: line,
            column,
            ..self.clone()
        }
    }

    pub fn in_column(&self, column: &Column) -> Error {
        if self.column != (0..0) {
            return self.clone();
        }
        Error {
            column: column.clone(),
            ..self.clone()
        }
    }

    pub fn message(&self, message: &'static str) -> Error {
        debug_assert_eq!(self.message.len(), 0);
        Error {
            message,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadToken,
    BadExpression,
    RecursiveRead,
    OutOfMemory,
    NotExecutable,
    EndOfInput,
    BadCharacter,
    NoStringEnd,
    NoCommentEnd,
    DuplicateLocal,
    NotPosix,
    Interrupted,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ErrorCode::*;
        let s = match self {
            BadToken => "bad token",
            BadExpression => "bad expression",
            RecursiveRead => "read() call inside of a read() call",
            OutOfMemory => "out of memory",
            NotExecutable => "file is not executable",
            EndOfInput => "end of input",
            BadCharacter => "bad character",
            NoStringEnd => "string end could not be found",
            NoCommentEnd => "comment end could not be found",
            DuplicateLocal => "function parameter or auto variable declared twice",
            NotPosix => "not allowed by POSIX bc",
            Interrupted => "interrupted",
        };
        write!(f, "{}", s)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {{ {} }}", self.to_string())
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let kind = match self.code {
            ErrorCode::BadCharacter | ErrorCode::NoStringEnd | ErrorCode::NoCommentEnd => "Lex",
            ErrorCode::RecursiveRead => "Runtime",
            ErrorCode::OutOfMemory => "Fatal",
            ErrorCode::Interrupted => "Signal",
            ErrorCode::NotPosix => "POSIX",
            ErrorCode::NotExecutable | ErrorCode::EndOfInput => "Input",
            _ => "Parse",
        };
        write!(f, "{} error: {}", kind, self.code)?;
        if let Some(line_number) = self.line_number {
            write!(f, " on line {}", line_number)?;
        }
        if (0..0) != self.column {
            write!(f, " ({}..{})", self.column.start, self.column.end)?;
        }
        if !self.message.is_empty() {
            write!(f, "; {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
