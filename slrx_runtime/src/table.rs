use crate::Symbol;
use core::fmt::Debug;

/// What a node's decision trie says about the symbol under the cursor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RequireAction<N, L> {
    /// More lookahead is required; continue at the given trie level with the next symbol.
    Descend(L),
    /// Shift the oldest buffered symbol and move to `target`.
    Shift { target: N, need_predict: bool },
    /// Perform the node's reduce with this index.  The buffered symbols are not consumed.
    Reduce(usize),
}

/// Describes one reduce of a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReduceProperty {
    pub head: Symbol,
    /// The index of the production in the list supplied by the grammar author.
    /// Meaningless for the accept reduce.
    pub production_index: usize,
    pub element_count: usize,
    pub mask: usize,
    pub need_predict: bool,
}

impl ReduceProperty {
    /// Reducing the synthetic start production accepts the input.
    pub fn is_accept(&self) -> bool {
        self.head == Symbol::START
    }
}

/// Where a reduce goes, given the state uncovered by popping its elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReduceTarget<N> {
    pub target: N,
    pub need_predict: bool,
}

/// A compiled, immutable parse table.  `Node` identifies an automaton state and `Level`
/// identifies a position inside a node's decision trie.
///
/// Implemented by the in-memory automaton built by the `slrx` crate and by [`crate::TableWrapper`];
/// [`crate::SymbolProcessor`] drives either one the same way.
pub trait ParseTable {
    type Node: Copy + Eq + Debug;
    type Level: Copy + Eq + Debug;

    fn startup_node(&self) -> Self::Node;

    fn root_level(&self, node: Self::Node) -> Self::Level;

    /// The deepest lookahead this node can ask for.
    fn forward_detect(&self, node: Self::Node) -> usize;

    /// The reduce to perform without looking at the input, if this node has one.
    fn reduce_always(&self, node: Self::Node) -> Option<usize>;

    fn require(
        &self,
        node: Self::Node,
        level: Self::Level,
        symbol: Symbol,
    ) -> Option<RequireAction<Self::Node, Self::Level>>;

    /// Every symbol with an entry at this trie level.
    fn require_symbols(&self, node: Self::Node, level: Self::Level) -> Vec<Symbol>;

    fn reduce_property(&self, node: Self::Node, reduce: usize) -> ReduceProperty;

    fn reduce_target(
        &self,
        node: Self::Node,
        reduce: usize,
        last_state: Self::Node,
    ) -> Option<ReduceTarget<Self::Node>>;
}

/// One entry of the trace produced by [`crate::SymbolProcessor`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParsingStep {
    Shift {
        symbol: Symbol,
        token_index: usize,
        need_predict: bool,
    },
    Reduce {
        symbol: Symbol,
        mask: usize,
        production_index: usize,
        element_count: usize,
        need_predict: bool,
    },
    /// Announces a production declared with `need_predict`.  It is placed before the first
    /// step of the production's span; the matching `Reduce` follows later.
    Predict {
        symbol: Symbol,
        mask: usize,
        production_index: usize,
    },
}

impl ParsingStep {
    pub fn is_shift(&self) -> bool {
        matches!(self, ParsingStep::Shift { .. })
    }

    pub fn is_reduce(&self) -> bool {
        matches!(self, ParsingStep::Reduce { .. })
    }

    pub fn symbol(&self) -> Symbol {
        match *self {
            ParsingStep::Shift { symbol, .. }
            | ParsingStep::Reduce { symbol, .. }
            | ParsingStep::Predict { symbol, .. } => symbol,
        }
    }
}
