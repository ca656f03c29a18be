use slrx_runtime::Symbol;
use thiserror::Error;

/// Errors raised while compiling a grammar.  None of them is recoverable: the grammar has to be
/// fixed (or `max_forward_detect` raised) before a table can be built.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error(transparent)]
    WrongProduction(#[from] WrongProduction),
    #[error(transparent)]
    OpePriorityConflict(#[from] OpePriorityConflict),
    #[error(transparent)]
    IllegalSlrxProduction(#[from] IllegalSlrxProduction),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WrongProductionCategory {
    TerminalSymbolAsProductionBegin,
    MaskNotFollowedNonTerminalSymbol,
    /// `Start` or `EndOfFile` written by the grammar author.
    ReservedSymbol,
    StartSymbolIsNotNonTerminal,
    /// A marker that no production can satisfy.
    UndefinedMask,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("wrong production {production_index:?}: {category:?}")]
pub struct WrongProduction {
    pub category: WrongProductionCategory,
    /// Index into the production list, or `None` when the start symbol itself is wrong.
    pub production_index: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("operator {symbol} is declared in priority levels {first_level} and {second_level}")]
pub struct OpePriorityConflict {
    pub symbol: Symbol,
    pub first_level: usize,
    pub second_level: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IllegalSlrxCategory {
    /// Reduces can repeat forever without consuming input.
    EndlessReduce,
    /// Two actions stay indistinguishable for every lookahead.
    ConflictReduce,
    /// The conflict needs more lookahead than allowed.
    MaxForwardDetectNotPassed,
}

/// One of the competing actions of a conflicted node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub enum ConflictAction {
    Shift,
    /// Reduce of the production with this index in the production list.
    Reduce(usize),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error(
    "grammar is not SLRX({max_forward_detect}): {category:?} at node {node}, \
     lookahead {lookahead:?}, actions {actions:?}"
)]
pub struct IllegalSlrxProduction {
    pub category: IllegalSlrxCategory,
    pub max_forward_detect: usize,
    pub node: usize,
    /// Productions with an item in the node's kernel, as indices into the production list.
    pub mapped_productions: Vec<usize>,
    /// The lookahead shared by the competing actions when the search gave up.
    pub lookahead: Vec<Symbol>,
    pub actions: Vec<ConflictAction>,
    /// For `EndlessReduce`: the productions reduced without consuming input, in order, up to
    /// the point where the walk started repeating.  Empty for the other categories.
    pub reduce_path: Vec<usize>,
}
