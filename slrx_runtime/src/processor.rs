//! Drives a parse table one terminal symbol at a time.

use crate::errors::UnaccableSymbol;
use crate::table::{ParseTable, ParsingStep, ReduceProperty, ReduceTarget, RequireAction};
use crate::Symbol;
use std::collections::VecDeque;

#[derive(Copy, Clone, Debug)]
struct StackEntry<N> {
    node: N,
    /// Index in the step list where the steps of this element begin.
    step_offset: usize,
    /// Pushed by an edge flagged `need_predict`: a reduce of a predicted production may still follow.
    provisional: bool,
}

#[derive(Copy, Clone, Debug)]
struct Cursor<L> {
    level: L,
    /// Number of buffered symbols already used as lookahead to reach `level`.
    depth: usize,
}

impl<L> Cursor<L> {
    fn root<T: ParseTable<Level = L>>(table: &T, node: T::Node) -> Self {
        Cursor {
            level: table.root_level(node),
            depth: 0,
        }
    }
}

// Only read by `slrx_log!`.
#[allow(dead_code)]
#[derive(Copy, Clone, Debug)]
enum Stall {
    Rejected { depth: usize },
    MissingTarget { reduce: usize },
    AfterAccept,
}

/// The state stack as seen by [`drive`].  The recorder mutates the real stack and emits steps;
/// the overlay answers "would this symbol be accepted" without touching anything.
trait MachineStack<N: Copy> {
    fn depth(&self) -> usize;
    fn node_at(&self, index: usize) -> N;
    fn shift(&mut self, symbol: Symbol, token_index: usize, target: N, need_predict: bool);
    fn reduce(&mut self, property: &ReduceProperty, target: ReduceTarget<N>);
    fn accept(&mut self);
    fn is_accepted(&self) -> bool;

    fn top(&self) -> N {
        self.node_at(self.depth() - 1)
    }
}

struct Recorder<'a, N> {
    stack: &'a mut Vec<StackEntry<N>>,
    steps: &'a mut Vec<ParsingStep>,
    accepted: &'a mut bool,
}

impl<'a, N: Copy> MachineStack<N> for Recorder<'a, N> {
    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn node_at(&self, index: usize) -> N {
        self.stack[index].node
    }

    fn shift(&mut self, symbol: Symbol, token_index: usize, target: N, need_predict: bool) {
        let step_offset = self.steps.len();
        if symbol != Symbol::EOF {
            self.steps.push(ParsingStep::Shift {
                symbol,
                token_index,
                need_predict,
            });
        }
        self.stack.push(StackEntry {
            node: target,
            step_offset,
            provisional: need_predict,
        });
    }

    fn reduce(&mut self, property: &ReduceProperty, target: ReduceTarget<N>) {
        let start = self.stack.len() - property.element_count;
        let span_start = self
            .stack
            .get(start)
            .map_or(self.steps.len(), |entry| entry.step_offset);
        self.stack.truncate(start);
        if property.need_predict {
            // An enclosing production reduced later inserts at the same offset, ahead of this one.
            self.steps.insert(
                span_start,
                ParsingStep::Predict {
                    symbol: property.head,
                    mask: property.mask,
                    production_index: property.production_index,
                },
            );
        }
        self.steps.push(ParsingStep::Reduce {
            symbol: property.head,
            mask: property.mask,
            production_index: property.production_index,
            element_count: property.element_count,
            need_predict: property.need_predict,
        });
        self.stack.push(StackEntry {
            node: target.target,
            step_offset: span_start,
            provisional: target.need_predict,
        });
    }

    fn accept(&mut self) {
        *self.accepted = true;
    }

    fn is_accepted(&self) -> bool {
        *self.accepted
    }
}

/// A copy-on-write view of the state stack: the first `keep` entries of `base`, then `extra`.
struct Overlay<'a, N> {
    base: &'a [StackEntry<N>],
    keep: usize,
    extra: Vec<N>,
    accepted: bool,
}

impl<'a, N: Copy> Overlay<'a, N> {
    fn new(base: &'a [StackEntry<N>], accepted: bool) -> Self {
        Overlay {
            base,
            keep: base.len(),
            extra: Vec::new(),
            accepted,
        }
    }
}

impl<'a, N: Copy> MachineStack<N> for Overlay<'a, N> {
    fn depth(&self) -> usize {
        self.keep + self.extra.len()
    }

    fn node_at(&self, index: usize) -> N {
        if index < self.keep {
            self.base[index].node
        } else {
            self.extra[index - self.keep]
        }
    }

    fn shift(&mut self, _symbol: Symbol, _token_index: usize, target: N, _need_predict: bool) {
        self.extra.push(target);
    }

    fn reduce(&mut self, property: &ReduceProperty, target: ReduceTarget<N>) {
        for _ in 0..property.element_count {
            if self.extra.pop().is_none() {
                self.keep -= 1;
            }
        }
        self.extra.push(target.target);
    }

    fn accept(&mut self) {
        self.accepted = true;
    }

    fn is_accepted(&self) -> bool {
        self.accepted
    }
}

/// Runs the automaton until it needs another symbol, accepts, or stalls.
fn drive<T, M>(
    table: &T,
    machine: &mut M,
    cache: &mut VecDeque<(Symbol, usize)>,
    cursor: &mut Cursor<T::Level>,
) -> Result<(), Stall>
where
    T: ParseTable,
    M: MachineStack<T::Node>,
{
    loop {
        if machine.is_accepted() {
            return if cache.is_empty() {
                Ok(())
            } else {
                Err(Stall::AfterAccept)
            };
        }

        let top = machine.top();
        let always = if cursor.depth == 0 {
            table.reduce_always(top)
        } else {
            None
        };
        let action = match always {
            Some(reduce) => RequireAction::Reduce(reduce),
            None => {
                let symbol = match cache.get(cursor.depth) {
                    Some(&(symbol, _)) => symbol,
                    None => return Ok(()),
                };
                match table.require(top, cursor.level, symbol) {
                    Some(action) => action,
                    None => {
                        return Err(Stall::Rejected {
                            depth: cursor.depth,
                        })
                    }
                }
            }
        };

        match action {
            RequireAction::Descend(level) => {
                *cursor = Cursor {
                    level,
                    depth: cursor.depth + 1,
                };
                debug_assert!(cursor.depth < table.forward_detect(top));
                continue;
            }
            RequireAction::Shift {
                target,
                need_predict,
            } => {
                let (symbol, token_index) = match cache.pop_front() {
                    Some(front) => front,
                    None => return Err(Stall::Rejected { depth: 0 }),
                };
                slrx_log!("shift {} -> {:?}", symbol, target);
                machine.shift(symbol, token_index, target, need_predict);
            }
            RequireAction::Reduce(reduce) => {
                let property = table.reduce_property(top, reduce);
                if property.is_accept() {
                    slrx_log!("accept");
                    machine.accept();
                    continue;
                }
                let depth = machine.depth();
                if depth <= property.element_count {
                    return Err(Stall::MissingTarget { reduce });
                }
                let last_state = machine.node_at(depth - 1 - property.element_count);
                let target = match table.reduce_target(top, reduce, last_state) {
                    Some(target) => target,
                    None => return Err(Stall::MissingTarget { reduce }),
                };
                slrx_log!(
                    "reduce {} (production {}) -> {:?}",
                    property.head,
                    property.production_index,
                    target.target
                );
                machine.reduce(&property, target);
            }
        }
        *cursor = Cursor::root(table, machine.top());
    }
}

/// Feeds terminal symbols into a [`ParseTable`] and records the resulting [`ParsingStep`]s.
///
/// Each call to [`consume`](Self::consume) either accepts the symbol, possibly buffering it as
/// lookahead, or rejects it and leaves the processor exactly as it was.  The table is only
/// borrowed, so any number of processors may share one table.
pub struct SymbolProcessor<'t, T: ParseTable> {
    table: &'t T,
    state_stack: Vec<StackEntry<T::Node>>,
    cursor: Cursor<T::Level>,
    cache_symbols: VecDeque<(Symbol, usize)>,
    steps: Vec<ParsingStep>,
    accepted: bool,
    next_token_index: usize,
}

impl<'t, T: ParseTable> SymbolProcessor<'t, T> {
    pub fn new(table: &'t T) -> Self {
        let startup = table.startup_node();
        let mut processor = SymbolProcessor {
            table,
            state_stack: Vec::new(),
            cursor: Cursor::root(table, startup),
            cache_symbols: VecDeque::new(),
            steps: Vec::new(),
            accepted: false,
            next_token_index: 0,
        };
        processor.clear();
        processor
    }

    /// Resets the processor to the state it had right after [`new`](Self::new).
    pub fn clear(&mut self) {
        let startup = self.table.startup_node();
        self.state_stack.clear();
        self.state_stack.push(StackEntry {
            node: startup,
            step_offset: 0,
            provisional: false,
        });
        self.cursor = Cursor::root(self.table, startup);
        self.cache_symbols.clear();
        self.steps.clear();
        self.accepted = false;
        self.next_token_index = 0;
        // The startup node may reduce an empty production before any input arrives.
        if let Err(_stall) = self.run() {
            slrx_log!("startup node stalled: {:?}", _stall);
        }
    }

    pub fn table(&self) -> &'t T {
        self.table
    }

    fn run(&mut self) -> Result<(), Stall> {
        let mut recorder = Recorder {
            stack: &mut self.state_stack,
            steps: &mut self.steps,
            accepted: &mut self.accepted,
        };
        drive(
            self.table,
            &mut recorder,
            &mut self.cache_symbols,
            &mut self.cursor,
        )
    }

    /// Runs `symbol` against a scratch copy of the machine.
    fn would_accept(&self, symbol: Symbol) -> bool {
        let mut cache = self.cache_symbols.clone();
        cache.push_back((symbol, self.next_token_index));
        let mut cursor = self.cursor;
        let mut overlay = Overlay::new(&self.state_stack, self.accepted);
        drive(self.table, &mut overlay, &mut cache, &mut cursor).is_ok()
    }

    pub fn consume(&mut self, symbol: Symbol, token_index: usize) -> Result<(), UnaccableSymbol> {
        if !self.would_accept(symbol) {
            slrx_log!("rejected {} at token {}", symbol, token_index);
            return Err(UnaccableSymbol {
                symbol,
                token_index,
                suggestions: self.expected_symbols(),
            });
        }
        // The current node never buffers more symbols than its lookahead depth.
        let top = self.state_stack[self.state_stack.len() - 1].node;
        self.cache_symbols.reserve(self.table.forward_detect(top));
        self.cache_symbols.push_back((symbol, token_index));
        self.next_token_index = token_index.saturating_add(1);
        match self.run() {
            Ok(()) => Ok(()),
            Err(_stall) => {
                slrx_log!("stalled after dry run succeeded: {:?}", _stall);
                Err(UnaccableSymbol {
                    symbol,
                    token_index,
                    suggestions: Vec::new(),
                })
            }
        }
    }

    /// Feeds the end of input.  Succeeds only if the input forms a complete sentence.
    pub fn end_of_file(&mut self) -> Result<(), UnaccableSymbol> {
        let token_index = self.next_token_index;
        self.consume(Symbol::EOF, token_index)?;
        if self.accepted {
            Ok(())
        } else {
            Err(UnaccableSymbol {
                symbol: Symbol::EOF,
                token_index,
                suggestions: self.expected_symbols(),
            })
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Every terminal symbol (including `$eof`) that [`consume`](Self::consume) would accept
    /// right now, sorted.
    pub fn expected_symbols(&self) -> Vec<Symbol> {
        if self.accepted {
            return Vec::new();
        }
        let top = self.state_stack[self.state_stack.len() - 1].node;
        let mut symbols: Vec<Symbol> = self
            .table
            .require_symbols(top, self.cursor.level)
            .into_iter()
            .filter(|&symbol| self.would_accept(symbol))
            .collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    pub fn steps(&self) -> &[ParsingStep] {
        &self.steps
    }

    /// Removes and returns the steps that can no longer change.  Steps at or after the start of
    /// an element pushed on a predicted path are kept, because a `Predict` step may still be
    /// inserted there.
    pub fn clear_steps(&mut self) -> Vec<ParsingStep> {
        let settled = self
            .state_stack
            .iter()
            .find(|entry| entry.provisional)
            .map_or(self.steps.len(), |entry| entry.step_offset);
        let drained: Vec<ParsingStep> = self.steps.drain(..settled).collect();
        for entry in self.state_stack.iter_mut() {
            entry.step_offset = entry.step_offset.saturating_sub(settled);
        }
        drained
    }

    pub fn into_steps(self) -> Vec<ParsingStep> {
        self.steps
    }
}
