//! # SLRX -- a bounded-lookahead LR grammar compiler
//!
//! SLRX turns a context-free grammar, written as a list of [`ProductionBuilder`]s, into a
//! deterministic parsing automaton.  It starts from the canonical LR(0) item-set automaton and,
//! wherever a state has more than one possible action, searches breadth-first over the
//! terminals that can follow, up to a configurable depth, until every competing action is told
//! apart.  The result is a small decision trie per conflicted state; states without conflicts
//! need no lookahead at all.
//!
//! Operator priorities and associativity are not resolved by lookahead.  Instead they restrict,
//! per grammar slot, which productions may complete that slot; the LR(0) construction then keeps
//! those productions on separate goto edges.
//!
//! # How to build a table
//!
//! ```rust
//! use slrx::{Lrx, OpePriority, ProductionBuilder};
//! use slrx_runtime::{Symbol, SymbolProcessor};
//!
//! const NUM: Symbol = Symbol::terminal(0);
//! const PLUS: Symbol = Symbol::terminal(1);
//! const EXPR: Symbol = Symbol::non_terminal(0);
//!
//! let productions = vec![
//!     ProductionBuilder::of_symbols(EXPR, &[EXPR, PLUS, EXPR], 1),
//!     ProductionBuilder::of_symbols(EXPR, &[NUM], 0),
//! ];
//! let priorities = vec![OpePriority::left(&[PLUS])];
//! let table = Lrx::create(EXPR, &productions, &priorities, 2).unwrap();
//!
//! let mut processor = SymbolProcessor::new(&table);
//! for (index, &symbol) in [NUM, PLUS, NUM].iter().enumerate() {
//!     processor.consume(symbol, index).unwrap();
//! }
//! processor.end_of_file().unwrap();
//! assert_eq!(processor.steps().len(), 6);
//! ```
//!
//! `Lrx` implements [`slrx_runtime::ParseTable`], so it can drive a
//! [`slrx_runtime::SymbolProcessor`] directly.  For embedding, [`Lrx::to_table`] serializes it
//! into a flat word array, which [`slrx_runtime::TableWrapper`] reads in place, and
//! [`table_to_tokens`] renders that array as a Rust `static` for use from a `build.rs` script.
//!
//! # Logging
//!
//! The builder logs every item set, edge and conflict search through the `log` crate at `debug`
//! level.  The `slrx_log` feature (on by default) also enables the runtime's per-symbol trace.

#![warn(rust_2018_idioms)]
#![allow(clippy::needless_lifetimes)]

mod errors;
mod grammar;
mod lr0;
mod lrx;
mod output;
mod production_info;
mod ramp_table;
mod serialize;
mod tvec;

#[cfg(test)]
mod tests;

macro_rules! int_alias {
    (pub type $name:ident = $int:ty;) => {
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
        pub struct $name(pub $int);

        impl $name {
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl core::ops::Add<$int> for $name {
            type Output = Self;
            fn add(self, rhs: $int) -> $name {
                $name(self.0 + rhs)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, fmt)
            }
        }

        impl core::convert::From<$name> for usize {
            fn from(i: $name) -> usize {
                i.0 as usize
            }
        }

        impl core::convert::From<usize> for $name {
            fn from(i: usize) -> $name {
                $name(i as $int)
            }
        }
    };
}

// A state of the automaton.  State 0 is the startup state.
int_alias! {pub type State = u32;}

// An index into ProductionInfo's production list.  Production 0 is the synthetic
// `$start := UserStart $eof`; the grammar author's production i is Prod(i + 1).
int_alias! {pub type Prod = u32;}

impl Prod {
    pub const ACCEPT: Prod = Prod(0);

    pub fn from_user(index: usize) -> Prod {
        Prod::from(index + 1)
    }

    /// The index in the author's production list, or `None` for the synthetic start production.
    pub fn user_index(self) -> Option<usize> {
        self.index().checked_sub(1)
    }
}

pub use errors::{
    ConflictAction, GrammarError, IllegalSlrxCategory, IllegalSlrxProduction, OpePriorityConflict,
    WrongProduction, WrongProductionCategory,
};
pub use grammar::{Associativity, OpePriority, ProductionBuilder, ProductionElement};
pub use lr0::{Lr0, Lr0Node, Lr0Reduce, ShiftEdge};
pub use lrx::{Lrx, LrxNode, LrxReduce, ReduceTuple};
pub use output::{table_to_source, table_to_tokens};
pub use production_info::{Element, Production, ProductionInfo, SearchElement};
pub use slrx_runtime::{OutOfRange, Symbol, TableBuffer, TableWord};
