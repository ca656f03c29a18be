//! Writes an `Lrx` into the flat word layout that `slrx_runtime::TableWrapper` reads.

use crate::lrx::{Lrx, LrxNode};
use crate::State;
use log::debug;
use slrx_runtime::{
    cross_type_set, encode_symbol, layout, OutOfRange, OutOfRangeKind, RequireAction, Symbol,
    TableBuffer, TableWord,
};
use std::collections::BTreeMap;

// Word offsets of one node's records, computed before anything is written.
struct NodeLayout {
    offset: usize,
    levels: Vec<usize>,
    reduces: Vec<usize>,
    end: usize,
}

fn level_space(level: &BTreeMap<Symbol, RequireAction<State, usize>>) -> usize {
    layout::ZIP_REQUIRE_NODE_DESC + level.len() * layout::ZIP_REQUIRE_NODE
}

fn calculate_require_space(node: &LrxNode, offset: usize) -> NodeLayout {
    let mut cursor = offset + layout::ZIP_NODE + node.reduces.len();
    let mut levels = Vec::with_capacity(node.levels.len());
    for level in node.levels.iter() {
        levels.push(cursor);
        cursor += level_space(level);
    }
    let mut reduces = Vec::with_capacity(node.reduces.len());
    for reduce in node.reduces.iter() {
        reduces.push(cursor);
        cursor += layout::ZIP_REDUCE_PROPERTY + reduce.tuples.len() * layout::ZIP_REDUCE_TUPLE;
    }
    NodeLayout {
        offset,
        levels,
        reduces,
        end: cursor,
    }
}

struct Writer<W> {
    words: Vec<W>,
}

impl<W: TableWord> Writer<W> {
    fn put(&mut self, kind: OutOfRangeKind, value: usize) -> Result<(), OutOfRange> {
        self.words.push(cross_type_set(kind, value)?);
        Ok(())
    }

    fn put_symbol(&mut self, symbol: Symbol) -> Result<(), OutOfRange> {
        let encoded = encode_symbol(symbol)?;
        self.put(OutOfRangeKind::SymbolValue, encoded)
    }

    fn put_flag(&mut self, flag: bool) -> Result<(), OutOfRange> {
        self.put(OutOfRangeKind::Flag, usize::from(flag))
    }
}

impl Lrx {
    /// Serializes the automaton.  Fails if any count, index or offset does not fit in `W`.
    pub fn to_table<W: TableWord>(&self) -> Result<TableBuffer<W>, OutOfRange> {
        let nodes = self.nodes.as_slice();

        let mut layouts: Vec<NodeLayout> = Vec::with_capacity(nodes.len());
        let mut offset = layout::HEADER;
        for node in nodes.iter() {
            let node_layout = calculate_require_space(node, offset);
            offset = node_layout.end;
            layouts.push(node_layout);
        }
        let total = offset;
        debug!("table needs {} words of {} bytes", total, W::BYTES);

        let node_offset = |state: State| layouts[state.index()].offset;

        let mut w = Writer::<W> {
            words: Vec::with_capacity(total),
        };
        w.put(OutOfRangeKind::NodeCount, nodes.len())?;
        w.put(OutOfRangeKind::Offset, layout::HEADER)?;

        for (node, node_layout) in nodes.iter().zip(layouts.iter()) {
            debug_assert_eq!(w.words.len(), node_layout.offset);

            w.put(OutOfRangeKind::RequireNodeCount, node.levels.len())?;
            w.put(OutOfRangeKind::ReduceCount, node.reduces.len())?;
            w.put(
                OutOfRangeKind::ReduceIndex,
                node.reduce_always.map_or(0, |r| r + 1),
            )?;
            w.put(OutOfRangeKind::ForwardDetect, node.forward_detect)?;
            for &reduce_offset in node_layout.reduces.iter() {
                w.put(OutOfRangeKind::Offset, reduce_offset)?;
            }

            for level in node.levels.iter() {
                w.put(OutOfRangeKind::RequireNodeCount, level.len())?;

                // Entries are looked up by binary search over the encoded symbol.
                let mut entries: Vec<(usize, &RequireAction<State, usize>)> = Vec::with_capacity(level.len());
                for (&symbol, action) in level.iter() {
                    entries.push((encode_symbol(symbol)?, action));
                }
                entries.sort_by_key(|&(encoded, _)| encoded);

                for (encoded, action) in entries {
                    w.put(OutOfRangeKind::SymbolValue, encoded)?;
                    let (kind, value) = match *action {
                        RequireAction::Descend(level) => {
                            (layout::KIND_DESCEND, node_layout.levels[level])
                        }
                        RequireAction::Shift {
                            target,
                            need_predict: false,
                        } => (layout::KIND_SHIFT, node_offset(target)),
                        RequireAction::Shift {
                            target,
                            need_predict: true,
                        } => (layout::KIND_NEED_PREDICT_SHIFT, node_offset(target)),
                        RequireAction::Reduce(reduce) => (layout::KIND_REDUCE, reduce),
                    };
                    w.put(OutOfRangeKind::RequireKind, kind)?;
                    w.put(OutOfRangeKind::Offset, value)?;
                }
            }

            for reduce in node.reduces.iter() {
                let property = &reduce.property;
                w.put_symbol(property.head)?;
                w.put(OutOfRangeKind::ProductionIndex, property.production_index)?;
                w.put(OutOfRangeKind::ElementCount, property.element_count)?;
                w.put(OutOfRangeKind::ProductionMask, property.mask)?;
                w.put_flag(property.need_predict)?;
                w.put(OutOfRangeKind::TupleCount, reduce.tuples.len())?;
                for tuple in reduce.tuples.iter() {
                    w.put(OutOfRangeKind::Offset, node_offset(tuple.last_state))?;
                    w.put(OutOfRangeKind::Offset, node_offset(tuple.target))?;
                    w.put_flag(tuple.need_predict)?;
                }
            }
        }

        debug_assert_eq!(w.words.len(), total);
        Ok(TableBuffer::from_words(w.words))
    }
}
