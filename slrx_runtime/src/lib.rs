//! Contains the supporting logic needed for applications that drive SLRX-compiled parsers.
//!
//! A grammar is compiled once (by the `slrx` crate) into either an in-memory automaton or a
//! flat binary table.  Both forms implement [`ParseTable`], and this crate provides everything
//! needed to run them:
//!
//! * [`Symbol`], the value type used for terminals and non-terminals everywhere.
//! * [`TableWrapper`], which reads a serialized table in place, from any `&[W]` buffer
//!   (a `static` array generated at build time, a memory-mapped file, ...).
//! * [`SymbolProcessor`], which consumes one terminal symbol at a time and produces a flat
//!   trace of [`ParsingStep`]s.
//! * [`ParsingStepProcessor`], which replays that trace against a [`Reducer`] to build
//!   whatever value the application wants.
//!
//! The runtime never resynchronizes after an error.  When a symbol cannot be accepted,
//! [`SymbolProcessor::consume`] reports an [`UnaccableSymbol`] with the set of symbols that
//! would have been accepted, and leaves the processor exactly as it was before the call.

#![warn(rust_2018_idioms)]

#[cfg(feature = "slrx_log")]
#[macro_export]
macro_rules! slrx_log {
    (
        $($t:tt)*
    ) => {
        ::log::debug!( $($t)* )
    }
}

#[cfg(not(feature = "slrx_log"))]
#[macro_export]
macro_rules! slrx_log {
    (
        $($t:tt)*
    ) => {
        // nothing
    };
}

mod errors;
mod format;
mod processor;
mod step_processor;
mod symbol;
mod table;
mod wrapper;


pub use errors::{OutOfRange, OutOfRangeKind, StepError, TableError, UnaccableSymbol};
pub use format::{cross_type_set, decode_symbol, encode_symbol, layout, TableBuffer, TableWord};
pub use processor::SymbolProcessor;
pub use step_processor::{
    process_steps, Element, FnReducer, NonTerminalElement, ParsingStepProcessor, PredictElement,
    Reducer, TerminalElement,
};
pub use symbol::{Symbol, SymbolKind};
pub use table::{ParseTable, ParsingStep, ReduceProperty, ReduceTarget, RequireAction};
pub use wrapper::{NodeWrapper, ReduceWrapper, RequireLevelWrapper, RequireNodeWrapper, TableWrapper};
