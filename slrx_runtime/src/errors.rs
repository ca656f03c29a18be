use crate::Symbol;
use thiserror::Error;

/// The input token stream does not match the grammar.
///
/// `suggestions` holds every terminal symbol that the processor would have accepted in the
/// state it was in when `symbol` was rejected, sorted.  The processor is left unchanged, so
/// the caller may report the error or try another symbol.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unacceptable symbol {symbol} at token {token_index} (expected one of {suggestions:?})")]
pub struct UnaccableSymbol {
    pub symbol: Symbol,
    pub token_index: usize,
    pub suggestions: Vec<Symbol>,
}

/// Identifies which field of the binary table overflowed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutOfRangeKind {
    NodeCount,
    Offset,
    SymbolValue,
    RequireNodeCount,
    ReduceCount,
    ReduceIndex,
    TupleCount,
    ProductionIndex,
    ProductionMask,
    ElementCount,
    ForwardDetect,
    /// The `Kind` word of a require entry.
    RequireKind,
    /// A `NeedPredict` word.
    Flag,
}

/// A count, index or offset did not fit in the table's word type.  Pick a wider `TableWord`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind:?} value {value} does not fit in the table word")]
pub struct OutOfRange {
    pub kind: OutOfRangeKind,
    pub value: usize,
}

/// A buffer handed to `TableWrapper::new` is not a well-formed table.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table is truncated: needed word {0}")]
    Truncated(usize),
    #[error("bad {what} at word {offset}")]
    BadRecord { what: &'static str, offset: usize },
    #[error("byte length {0} is not a multiple of the word size")]
    Misaligned(usize),
}

/// Errors raised while replaying parsing steps against a reducer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StepError<E> {
    #[error("reducer failed: {0}")]
    Reducer(E),
    #[error("reduce of production {production_index} needs {needed} elements, only {available} available")]
    StackUnderflow {
        production_index: usize,
        needed: usize,
        available: usize,
    },
    #[error("parsing finished with {remaining} elements on the stack")]
    Unfinished { remaining: usize },
}
