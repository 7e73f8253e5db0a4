//! Source positions attached to statements and operands

use std::fmt;

/// Line/column of a statement. `-1/-1` marks a statement with no source origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineColPosition {
    pub line: i32,
    pub col: i32,
}

impl LineColPosition {
    pub const DEFAULT: LineColPosition = LineColPosition { line: -1, col: -1 };

    pub fn new(line: i32, col: i32) -> Self {
        Self { line, col }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

impl Default for LineColPosition {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for LineColPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Full span of an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FullPosition {
    pub first_line: i32,
    pub first_col: i32,
    pub last_line: i32,
    pub last_col: i32,
}

impl FullPosition {
    pub const DEFAULT: FullPosition = FullPosition {
        first_line: -1,
        first_col: -1,
        last_line: -1,
        last_col: -1,
    };

    pub fn new(first_line: i32, first_col: i32, last_line: i32, last_col: i32) -> Self {
        Self {
            first_line,
            first_col,
            last_line,
            last_col,
        }
    }

    pub fn start(&self) -> LineColPosition {
        LineColPosition::new(self.first_line, self.first_col)
    }
}

impl Default for FullPosition {
    fn default() -> Self {
        Self::DEFAULT
    }
}
