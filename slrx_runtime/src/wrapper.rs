//! Reads a binary table in place.  See [`crate::format`] for the layout.

use crate::errors::TableError;
use crate::format::{decode_symbol, encode_symbol, layout, TableWord};
use crate::table::{ParseTable, ReduceProperty, ReduceTarget, RequireAction};
use crate::Symbol;

fn word<W: TableWord>(buffer: &[W], index: usize) -> Result<usize, TableError> {
    buffer
        .get(index)
        .map(|w| w.to_usize())
        .ok_or(TableError::Truncated(index))
}

// Returns cursor + 1 + count * record, or Truncated if that overflows.
fn skip_records(cursor: usize, head: usize, count: usize, record: usize) -> Result<usize, TableError> {
    count
        .checked_mul(record)
        .and_then(|n| n.checked_add(head))
        .and_then(|n| n.checked_add(cursor))
        .ok_or(TableError::Truncated(usize::MAX))
}

fn bad(what: &'static str, offset: usize) -> TableError {
    TableError::BadRecord { what, offset }
}

/// A validated view of a binary table.  Construction walks the whole buffer once and checks
/// every record and cross-reference; afterwards the table is read without further checks.
#[derive(Copy, Clone, Debug)]
pub struct TableWrapper<'a, W> {
    buffer: &'a [W],
    node_count: usize,
    startup_node_offset: usize,
}

impl<'a, W: TableWord> TableWrapper<'a, W> {
    pub fn new(buffer: &'a [W]) -> Result<Self, TableError> {
        let node_count = word(buffer, 0)?;
        let startup_node_offset = word(buffer, 1)?;

        let mut node_offsets: Vec<usize> = Vec::new();
        let mut level_offsets: Vec<usize> = Vec::new();
        // (word holding the reference, referenced offset)
        let mut node_refs: Vec<(usize, usize)> = Vec::new();
        let mut level_refs: Vec<(usize, usize)> = Vec::new();

        let mut offset = layout::HEADER;
        for _ in 0..node_count {
            node_offsets.push(offset);
            let level_count = word(buffer, offset)?;
            let reduce_count = word(buffer, offset + 1)?;
            let reduce_always = word(buffer, offset + 2)?;
            word(buffer, offset + 3)?;
            if level_count == 0 {
                return Err(bad("node without a root level", offset));
            }
            if reduce_always > reduce_count {
                return Err(bad("reduce-always index", offset + 2));
            }

            let reduce_table = offset + layout::ZIP_NODE;
            let mut cursor = skip_records(reduce_table, 0, reduce_count, 1)?;

            for _ in 0..level_count {
                level_offsets.push(cursor);
                let entry_count = word(buffer, cursor)?;
                let mut entry = cursor + layout::ZIP_REQUIRE_NODE_DESC;
                for _ in 0..entry_count {
                    if decode_symbol(word(buffer, entry)?).is_none() {
                        return Err(bad("symbol", entry));
                    }
                    let kind = word(buffer, entry + 1)?;
                    let value = word(buffer, entry + 2)?;
                    match kind {
                        layout::KIND_DESCEND => level_refs.push((entry + 2, value)),
                        layout::KIND_SHIFT | layout::KIND_NEED_PREDICT_SHIFT => {
                            node_refs.push((entry + 2, value))
                        }
                        layout::KIND_REDUCE => {
                            if value >= reduce_count {
                                return Err(bad("reduce index", entry + 2));
                            }
                        }
                        _ => return Err(bad("require node kind", entry + 1)),
                    }
                    entry += layout::ZIP_REQUIRE_NODE;
                }
                cursor = skip_records(
                    cursor,
                    layout::ZIP_REQUIRE_NODE_DESC,
                    entry_count,
                    layout::ZIP_REQUIRE_NODE,
                )?;
            }

            for r in 0..reduce_count {
                if word(buffer, reduce_table + r)? != cursor {
                    return Err(bad("reduce offset", reduce_table + r));
                }
                match decode_symbol(word(buffer, cursor)?) {
                    Some(head) if head.is_non_terminal() => {}
                    _ => return Err(bad("reduce head", cursor)),
                }
                if word(buffer, cursor + 4)? > 1 {
                    return Err(bad("predict flag", cursor + 4));
                }
                let tuple_count = word(buffer, cursor + 5)?;
                let mut tuple = cursor + layout::ZIP_REDUCE_PROPERTY;
                for _ in 0..tuple_count {
                    node_refs.push((tuple, word(buffer, tuple)?));
                    node_refs.push((tuple + 1, word(buffer, tuple + 1)?));
                    if word(buffer, tuple + 2)? > 1 {
                        return Err(bad("predict flag", tuple + 2));
                    }
                    tuple += layout::ZIP_REDUCE_TUPLE;
                }
                cursor = skip_records(
                    cursor,
                    layout::ZIP_REDUCE_PROPERTY,
                    tuple_count,
                    layout::ZIP_REDUCE_TUPLE,
                )?;
            }
            offset = cursor;
        }

        // Offsets were recorded in increasing order, so both lists are sorted.
        if node_offsets.binary_search(&startup_node_offset).is_err() {
            return Err(bad("startup node offset", 1));
        }
        for &(at, target) in node_refs.iter() {
            if node_offsets.binary_search(&target).is_err() {
                return Err(bad("node reference", at));
            }
        }
        for &(at, target) in level_refs.iter() {
            if level_offsets.binary_search(&target).is_err() {
                return Err(bad("level reference", at));
            }
        }

        Ok(Self {
            buffer,
            node_count,
            startup_node_offset,
        })
    }

    pub fn buffer(&self) -> &'a [W] {
        self.buffer
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn startup_node(&self) -> NodeWrapper<'a, W> {
        self.node(self.startup_node_offset)
    }

    pub fn node(&self, offset: usize) -> NodeWrapper<'a, W> {
        NodeWrapper {
            buffer: self.buffer,
            offset,
        }
    }

    /// Iterates all nodes in storage order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeWrapper<'a, W>> + 'a {
        let buffer = self.buffer;
        let mut offset = layout::HEADER;
        (0..self.node_count).map(move |_| {
            let node = NodeWrapper { buffer, offset };
            offset = node.end();
            node
        })
    }
}

fn at<W: TableWord>(span: &[W], index: usize) -> usize {
    span[index].to_usize()
}

/// A node record.
#[derive(Copy, Clone, Debug)]
pub struct NodeWrapper<'a, W> {
    buffer: &'a [W],
    offset: usize,
}

impl<'a, W: TableWord> NodeWrapper<'a, W> {
    fn span(&self) -> &'a [W] {
        &self.buffer[self.offset..]
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn require_level_count(&self) -> usize {
        at(self.span(), 0)
    }

    pub fn reduce_count(&self) -> usize {
        at(self.span(), 1)
    }

    pub fn reduce_always(&self) -> Option<usize> {
        at(self.span(), 2).checked_sub(1)
    }

    pub fn forward_detect(&self) -> usize {
        at(self.span(), 3)
    }

    pub fn root_level(&self) -> RequireLevelWrapper<'a, W> {
        RequireLevelWrapper {
            buffer: self.buffer,
            offset: self.offset + layout::ZIP_NODE + self.reduce_count(),
        }
    }

    /// Iterates the node's trie levels, root first.
    pub fn levels(&self) -> impl Iterator<Item = RequireLevelWrapper<'a, W>> + 'a {
        let mut level = self.root_level();
        (0..self.require_level_count()).map(move |_| {
            let current = level;
            level = RequireLevelWrapper {
                buffer: current.buffer,
                offset: current.end(),
            };
            current
        })
    }

    pub fn reduce(&self, index: usize) -> ReduceWrapper<'a, W> {
        assert!(index < self.reduce_count());
        ReduceWrapper {
            buffer: self.buffer,
            offset: at(self.span(), layout::ZIP_NODE + index),
        }
    }

    // First word after this node.
    fn end(&self) -> usize {
        match self.reduce_count().checked_sub(1) {
            Some(last) => self.reduce(last).end(),
            None => self.levels().last().map_or(self.offset, |l| l.end()),
        }
    }
}

/// One level of a node's decision trie.
#[derive(Copy, Clone, Debug)]
pub struct RequireLevelWrapper<'a, W> {
    buffer: &'a [W],
    offset: usize,
}

impl<'a, W: TableWord> RequireLevelWrapper<'a, W> {
    fn span(&self) -> &'a [W] {
        &self.buffer[self.offset..]
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        at(self.span(), 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, index: usize) -> RequireNodeWrapper<'a, W> {
        assert!(index < self.len());
        RequireNodeWrapper {
            span: &self.span()[layout::ZIP_REQUIRE_NODE_DESC + index * layout::ZIP_REQUIRE_NODE..],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = RequireNodeWrapper<'a, W>> + 'a {
        let level = *self;
        (0..level.len()).map(move |i| level.entry(i))
    }

    /// Binary search by encoded symbol.
    pub fn find(&self, symbol: Symbol) -> Option<RequireNodeWrapper<'a, W>> {
        let key = encode_symbol(symbol).ok()?;
        let (mut lo, mut hi) = (0, self.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            let entry = self.entry(mid);
            let k = entry.encoded_symbol();
            if k == key {
                return Some(entry);
            } else if k < key {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        None
    }

    fn end(&self) -> usize {
        self.offset + layout::ZIP_REQUIRE_NODE_DESC + self.len() * layout::ZIP_REQUIRE_NODE
    }
}

/// One entry of a trie level.
#[derive(Copy, Clone, Debug)]
pub struct RequireNodeWrapper<'a, W> {
    span: &'a [W],
}

impl<'a, W: TableWord> RequireNodeWrapper<'a, W> {
    fn encoded_symbol(&self) -> usize {
        at(self.span, 0)
    }

    pub fn symbol(&self) -> Symbol {
        // validated by TableWrapper::new
        decode_symbol(self.encoded_symbol()).unwrap_or(Symbol::EOF)
    }

    pub fn action(&self) -> RequireAction<usize, usize> {
        let value = at(self.span, 2);
        match at(self.span, 1) {
            layout::KIND_DESCEND => RequireAction::Descend(value),
            layout::KIND_SHIFT => RequireAction::Shift {
                target: value,
                need_predict: false,
            },
            layout::KIND_NEED_PREDICT_SHIFT => RequireAction::Shift {
                target: value,
                need_predict: true,
            },
            _ => RequireAction::Reduce(value),
        }
    }
}

/// A reduce record and its tuples.
#[derive(Copy, Clone, Debug)]
pub struct ReduceWrapper<'a, W> {
    buffer: &'a [W],
    offset: usize,
}

impl<'a, W: TableWord> ReduceWrapper<'a, W> {
    fn span(&self) -> &'a [W] {
        &self.buffer[self.offset..]
    }

    pub fn property(&self) -> ReduceProperty {
        let span = self.span();
        ReduceProperty {
            // validated by TableWrapper::new
            head: decode_symbol(at(span, 0)).unwrap_or(Symbol::START),
            production_index: at(span, 1),
            element_count: at(span, 2),
            mask: at(span, 3),
            need_predict: at(span, 4) != 0,
        }
    }

    pub fn tuple_count(&self) -> usize {
        at(self.span(), 5)
    }

    /// Returns `(last_state_offset, target_offset, need_predict)`.
    pub fn tuple(&self, index: usize) -> (usize, usize, bool) {
        assert!(index < self.tuple_count());
        let base = layout::ZIP_REDUCE_PROPERTY + index * layout::ZIP_REDUCE_TUPLE;
        let span = self.span();
        (at(span, base), at(span, base + 1), at(span, base + 2) != 0)
    }

    pub fn find_tuple(&self, last_state: usize) -> Option<ReduceTarget<usize>> {
        (0..self.tuple_count())
            .map(|i| self.tuple(i))
            .find(|&(last, _, _)| last == last_state)
            .map(|(_, target, need_predict)| ReduceTarget {
                target,
                need_predict,
            })
    }

    fn end(&self) -> usize {
        self.offset + layout::ZIP_REDUCE_PROPERTY + self.tuple_count() * layout::ZIP_REDUCE_TUPLE
    }
}

impl<'a, W: TableWord> ParseTable for TableWrapper<'a, W> {
    type Node = usize;
    type Level = usize;

    fn startup_node(&self) -> usize {
        self.startup_node_offset
    }

    fn root_level(&self, node: usize) -> usize {
        self.node(node).root_level().offset()
    }

    fn forward_detect(&self, node: usize) -> usize {
        self.node(node).forward_detect()
    }

    fn reduce_always(&self, node: usize) -> Option<usize> {
        self.node(node).reduce_always()
    }

    fn require(&self, _node: usize, level: usize, symbol: Symbol) -> Option<RequireAction<usize, usize>> {
        let level = RequireLevelWrapper {
            buffer: self.buffer,
            offset: level,
        };
        level.find(symbol).map(|entry| entry.action())
    }

    fn require_symbols(&self, _node: usize, level: usize) -> Vec<Symbol> {
        let level = RequireLevelWrapper {
            buffer: self.buffer,
            offset: level,
        };
        level.iter().map(|entry| entry.symbol()).collect()
    }

    fn reduce_property(&self, node: usize, reduce: usize) -> ReduceProperty {
        self.node(node).reduce(reduce).property()
    }

    fn reduce_target(&self, node: usize, reduce: usize, last_state: usize) -> Option<ReduceTarget<usize>> {
        self.node(node).reduce(reduce).find_tuple(last_state)
    }
}
