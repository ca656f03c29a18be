// Defines a grammar, as written by its author.  A grammar has these elements:
//
//     * a start symbol, which must be a non-terminal
//     * a list of productions, in the form A := B C ... , where A is a non-terminal and B and C
//       are any combination of terminals and non-terminals
//     * (optional) markers after a non-terminal element, restricting which productions of that
//       non-terminal may appear there
//     * (optional) operator priority levels, lowest precedence first
//
// None of these types are interpreted here; ProductionInfo validates and normalizes them.

use slrx_runtime::Symbol;

/// One element of a production body.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProductionElement {
    Symbol(Symbol),
    /// Qualifies the preceding non-terminal: only the production being declared may appear there.
    ItSelf,
    /// Qualifies the preceding non-terminal: only its productions with this mask may appear there.
    Mask(usize),
}

impl From<Symbol> for ProductionElement {
    fn from(symbol: Symbol) -> Self {
        ProductionElement::Symbol(symbol)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductionBuilder {
    pub head: Symbol,
    pub elements: Vec<ProductionElement>,
    /// Opaque tag handed back on every reduce of this production.
    pub mask: usize,
    pub need_predict: bool,
}

impl ProductionBuilder {
    pub fn new(head: Symbol, elements: Vec<ProductionElement>, mask: usize) -> Self {
        Self {
            head,
            elements,
            mask,
            need_predict: false,
        }
    }

    /// Convenience for a production made only of symbols.
    pub fn of_symbols(head: Symbol, symbols: &[Symbol], mask: usize) -> Self {
        Self::new(head, symbols.iter().map(|&s| s.into()).collect(), mask)
    }

    pub fn with_predict(mut self) -> Self {
        self.need_predict = true;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// One priority level: a set of operator terminals sharing an associativity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpePriority {
    pub symbols: Vec<Symbol>,
    pub associativity: Associativity,
}

impl OpePriority {
    pub fn left(symbols: &[Symbol]) -> Self {
        Self {
            symbols: symbols.to_vec(),
            associativity: Associativity::Left,
        }
    }

    pub fn right(symbols: &[Symbol]) -> Self {
        Self {
            symbols: symbols.to_vec(),
            associativity: Associativity::Right,
        }
    }
}
