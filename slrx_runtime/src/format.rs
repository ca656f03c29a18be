//! The binary table format.
//!
//! A table is a flat array of unsigned words of one fixed width (`u16`, `u32` or `u64`).  Every
//! cross-reference is a word offset from the start of the array, never a pointer, so a table can
//! be embedded as a `static`, written to disk, or memory-mapped and read in place.
//!
//! ```text
//! header            : NodeCount StartupNodeOffset
//! node              : ZipNode ReduceOffset* (ZipRequireNodeDesc ZipRequireNode*)* (ZipReduceProperty ZipReduceTuple*)*
//! ZipNode           : RequireNodeDescCount ReduceCount ReduceAlways ForwardDetect
//! ZipRequireNodeDesc: RequireNodeCount
//! ZipRequireNode    : Symbol Kind Value
//! ZipReduceProperty : Head ProductionIndex ElementCount Mask NeedPredict TupleCount
//! ZipReduceTuple    : LastStateOffset TargetOffset NeedPredict
//! ```
//!
//! Nodes are stored back to back, the startup node first.  `ReduceAlways` is zero when the node
//! must inspect input, otherwise it is one plus the index of the reduce to perform.  The first
//! `ZipRequireNodeDesc` of a node is its root level; the `Value` of a `Descend` entry is the word
//! offset of the next level.  Entries within a level are sorted by encoded symbol.

use crate::errors::{OutOfRange, OutOfRangeKind, TableError};
use crate::{Symbol, SymbolKind};
use core::fmt::Debug;

/// Word sizes of the fixed records, and the meaning of `ZipRequireNode::Kind`.
pub mod layout {
    pub const HEADER: usize = 2;
    pub const ZIP_NODE: usize = 4;
    pub const ZIP_REQUIRE_NODE_DESC: usize = 1;
    pub const ZIP_REQUIRE_NODE: usize = 3;
    pub const ZIP_REDUCE_PROPERTY: usize = 6;
    pub const ZIP_REDUCE_TUPLE: usize = 3;

    pub const KIND_DESCEND: usize = 0;
    pub const KIND_SHIFT: usize = 1;
    pub const KIND_NEED_PREDICT_SHIFT: usize = 2;
    pub const KIND_REDUCE: usize = 3;
}

/// An unsigned integer type usable as the storage word of a binary table.
pub trait TableWord: Copy + Eq + Default + Debug + 'static {
    /// Size of one word, in bytes.
    const BYTES: usize;

    /// The Rust spelling of the type, used when emitting tables as source code.
    const TYPE_NAME: &'static str;

    fn try_from_usize(value: usize) -> Option<Self>;

    /// Widens the word.  Values that cannot be represented as `usize` saturate, which every
    /// bounds check in the reader then rejects.
    fn to_usize(self) -> usize;

    fn write_le(self, out: &mut Vec<u8>);

    /// `bytes.len()` must equal `Self::BYTES`.
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! table_word {
    ($($int:ty),*) => {
        $(
            impl TableWord for $int {
                const BYTES: usize = core::mem::size_of::<$int>();
                const TYPE_NAME: &'static str = stringify!($int);

                fn try_from_usize(value: usize) -> Option<Self> {
                    <$int>::try_from(value).ok()
                }

                fn to_usize(self) -> usize {
                    usize::try_from(self).unwrap_or(usize::MAX)
                }

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$int>()];
                    raw.copy_from_slice(bytes);
                    <$int>::from_le_bytes(raw)
                }
            }
        )*
    };
}

table_word!(u16, u32, u64);

/// Stores `value` into a word of type `W`, failing instead of truncating.
pub fn cross_type_set<W: TableWord>(kind: OutOfRangeKind, value: usize) -> Result<W, OutOfRange> {
    W::try_from_usize(value).ok_or(OutOfRange { kind, value })
}

/// Packs a symbol as `value << 2 | kind`.
pub fn encode_symbol(symbol: Symbol) -> Result<usize, OutOfRange> {
    let tag = match symbol.kind {
        SymbolKind::Terminal => 0,
        SymbolKind::NonTerminal => 1,
        SymbolKind::Start => 2,
        SymbolKind::EndOfFile => 3,
    };
    usize::try_from(symbol.value)
        .ok()
        .and_then(|v| v.checked_mul(4))
        .map(|v| v | tag)
        .ok_or(OutOfRange {
            kind: OutOfRangeKind::SymbolValue,
            value: symbol.value as usize,
        })
}

pub fn decode_symbol(word: usize) -> Option<Symbol> {
    let kind = match word & 3 {
        0 => SymbolKind::Terminal,
        1 => SymbolKind::NonTerminal,
        2 => SymbolKind::Start,
        _ => SymbolKind::EndOfFile,
    };
    let value = u32::try_from(word >> 2).ok()?;
    Some(Symbol { kind, value })
}

/// An owned binary table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableBuffer<W> {
    words: Vec<W>,
}

impl<W: TableWord> TableBuffer<W> {
    pub fn from_words(words: Vec<W>) -> Self {
        Self { words }
    }

    pub fn words(&self) -> &[W] {
        &self.words
    }

    pub fn into_words(self) -> Vec<W> {
        self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.words.len() * W::BYTES);
        for &w in self.words.iter() {
            w.write_le(&mut out);
        }
        out
    }

    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, TableError> {
        if bytes.len() % W::BYTES != 0 {
            return Err(TableError::Misaligned(bytes.len()));
        }
        let words = bytes.chunks_exact(W::BYTES).map(W::read_le).collect();
        Ok(Self { words })
    }
}
