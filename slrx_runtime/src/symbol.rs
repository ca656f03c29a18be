use core::fmt;

/// The four kinds of grammar symbol.  `Start` and `EndOfFile` are synthetic: they are added by
/// the table builder and are never written by a grammar author.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
    Start,
    EndOfFile,
}

/// A grammar symbol.  Symbols are compared by kind first, then by value; the numeric value of a
/// symbol means nothing to this crate beyond equality.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub value: u32,
}

impl Symbol {
    pub const START: Symbol = Symbol {
        kind: SymbolKind::Start,
        value: 0,
    };

    pub const EOF: Symbol = Symbol {
        kind: SymbolKind::EndOfFile,
        value: 0,
    };

    pub const fn terminal(value: u32) -> Symbol {
        Symbol {
            kind: SymbolKind::Terminal,
            value,
        }
    }

    pub const fn non_terminal(value: u32) -> Symbol {
        Symbol {
            kind: SymbolKind::NonTerminal,
            value,
        }
    }

    /// True for symbols that come from the token stream, including the end of file marker.
    pub fn is_terminal(self) -> bool {
        matches!(self.kind, SymbolKind::Terminal | SymbolKind::EndOfFile)
    }

    /// True for symbols that are produced by reductions, including the synthetic start symbol.
    pub fn is_non_terminal(self) -> bool {
        matches!(self.kind, SymbolKind::NonTerminal | SymbolKind::Start)
    }

    pub fn is_reserved(self) -> bool {
        matches!(self.kind, SymbolKind::Start | SymbolKind::EndOfFile)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, fmt)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SymbolKind::Terminal => write!(fmt, "T{}", self.value),
            SymbolKind::NonTerminal => write!(fmt, "N{}", self.value),
            SymbolKind::Start => write!(fmt, "$start"),
            SymbolKind::EndOfFile => write!(fmt, "$eof"),
        }
    }
}
