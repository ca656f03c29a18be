use crate::production_info::{ProductionInfo, SearchElement};
use crate::ramp_table::RampTable;
use crate::tvec::TVec;
use crate::{Prod, State};
use log::{debug, warn};
use slrx_runtime::Symbol;
use std::collections::{BTreeMap, BTreeSet};

// State -> [SearchElement], the kernel of each state
type CoreTable = RampTable<SearchElement>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShiftEdge {
    pub symbol: Symbol,
    pub target: State,
    /// Non-terminal edges only: which completed productions take this edge.  Empty when every
    /// candidate production takes it.  Sorted.
    pub productions: Vec<Prod>,
    /// `productions` lists the candidates that do not take this edge, because that list is
    /// the shorter one.
    pub reverse_storage: bool,
}

impl ShiftEdge {
    /// Whether a completed `production` (one of the candidates of the source state) takes
    /// this edge.
    pub fn accepts(&self, production: Prod) -> bool {
        self.productions.is_empty()
            || (self.productions.binary_search(&production).is_ok() != self.reverse_storage)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lr0Reduce {
    pub production: Prod,
    /// `(last_state, target)`: after popping the production's elements, `last_state` is on top
    /// and the head symbol leads to `target`.  Sorted.
    pub tuples: Vec<(State, State)>,
}

#[derive(Clone, Debug)]
pub struct Lr0Node {
    /// The closure of the kernel, sorted.
    pub items: Vec<SearchElement>,
    /// Sorted by symbol.  A non-terminal may have several edges, split by completed production.
    pub shifts: Vec<ShiftEdge>,
    pub reduces: Vec<Lr0Reduce>,
}

impl Lr0Node {
    pub fn terminal_shifts(&self) -> impl Iterator<Item = &ShiftEdge> {
        self.shifts.iter().filter(|e| e.symbol.is_terminal())
    }

    pub fn has_terminal_shift(&self) -> bool {
        self.terminal_shifts().next().is_some()
    }
}

pub struct Lr0 {
    cores: CoreTable,
    pub accessing_symbol: TVec<State, Symbol>,
    pub nodes: TVec<State, Lr0Node>,
}

impl Lr0 {
    pub fn compute(info: &ProductionInfo) -> Lr0 {
        let mut states = CoreTable::new();
        let mut accessing_symbol: TVec<State, Symbol> = TVec::new();
        let mut nodes: TVec<State, Lr0Node> = TVec::new();

        // The startup state is the closure of `$start := . UserStart $eof`.
        states.push_entry(core::iter::once(SearchElement::new(Prod::ACCEPT, 0)));
        accessing_symbol.push(Symbol::START);

        // Key item -> states whose kernel starts with it.
        let mut state_set: BTreeMap<SearchElement, Vec<State>> = BTreeMap::new();

        // this_state walks the states table, which find_or_create_state() extends as new
        // kernels are discovered.
        let mut this_state: usize = 0;

        while this_state < states.num_keys() {
            debug!("computing closure for state s{}:", this_state);
            print_core(info, State::from(this_state), states.values(this_state));

            let items: Vec<SearchElement> = info
                .expand_search_elements(states.values(this_state).iter().copied())
                .into_iter()
                .collect();

            let reduces: Vec<Lr0Reduce> = items
                .iter()
                .filter(|&&item| info.is_complete(item))
                .map(|item| Lr0Reduce {
                    production: item.production,
                    tuples: Vec::new(),
                })
                .collect();

            let mut shift_items: BTreeMap<Symbol, Vec<SearchElement>> = BTreeMap::new();
            for &item in items.iter() {
                if let Some(symbol) = info.next_symbol(item) {
                    shift_items.entry(symbol).or_default().push(item);
                }
            }

            let mut shifts: Vec<ShiftEdge> = Vec::new();
            for (&symbol, symbol_items) in shift_items.iter() {
                if symbol.is_terminal() {
                    let kernel: Vec<SearchElement> =
                        symbol_items.iter().map(|item| item.advance()).collect();
                    let target = find_or_create_state(
                        info,
                        &kernel,
                        &mut state_set,
                        &mut states,
                        &mut accessing_symbol,
                        symbol,
                    );
                    shifts.push(ShiftEdge {
                        symbol,
                        target,
                        productions: Vec::new(),
                        reverse_storage: false,
                    });
                    continue;
                }

                // The goto on a non-terminal depends on which production completed it: each
                // item only advances over the productions its element accepts.
                let candidates: Vec<Prod> = items
                    .iter()
                    .filter(|item| {
                        item.element == 0 && info.production(item.production).head == symbol
                    })
                    .map(|item| item.production)
                    .collect();
                let mut groups: BTreeMap<Vec<SearchElement>, Vec<Prod>> = BTreeMap::new();
                for &candidate in candidates.iter() {
                    let kernel: Vec<SearchElement> = symbol_items
                        .iter()
                        .filter(|item| info.accepts(item.production, item.element, candidate))
                        .map(|item| item.advance())
                        .collect();
                    if !kernel.is_empty() {
                        groups.entry(kernel).or_default().push(candidate);
                    }
                }
                for (kernel, group) in groups.iter() {
                    let target = find_or_create_state(
                        info,
                        kernel,
                        &mut state_set,
                        &mut states,
                        &mut accessing_symbol,
                        symbol,
                    );
                    let (productions, reverse_storage) = if group.len() == candidates.len() {
                        (Vec::new(), false)
                    } else {
                        let excluded: Vec<Prod> = candidates
                            .iter()
                            .copied()
                            .filter(|c| !group.contains(c))
                            .collect();
                        if excluded.len() < group.len() {
                            (excluded, true)
                        } else {
                            (group.clone(), false)
                        }
                    };
                    debug!(
                        "    s{} --{}--> s{} for {:?} (reverse={})",
                        this_state, symbol, target, productions, reverse_storage
                    );
                    shifts.push(ShiftEdge {
                        symbol,
                        target,
                        productions,
                        reverse_storage,
                    });
                }
            }

            nodes.push(Lr0Node {
                items,
                shifts,
                reduces,
            });
            this_state += 1;
        }

        let mut lr0 = Lr0 {
            cores: states,
            accessing_symbol,
            nodes,
        };
        lr0.compute_reduce_tuples(info);
        lr0.report_unused_productions(info);
        lr0
    }

    pub fn num_states(&self) -> usize {
        self.cores.num_keys()
    }

    pub fn kernel(&self, state: State) -> &[SearchElement] {
        self.cores.values(state)
    }

    pub fn node(&self, state: State) -> &Lr0Node {
        &self.nodes[state]
    }

    /// Every edge leaving `state` on `symbol`.
    pub fn edges(&self, state: State, symbol: Symbol) -> impl Iterator<Item = &ShiftEdge> {
        self.nodes[state]
            .shifts
            .iter()
            .filter(move |e| e.symbol == symbol)
    }

    pub fn shift(&self, state: State, symbol: Symbol) -> Option<State> {
        self.edges(state, symbol).next().map(|e| e.target)
    }

    /// The edge taken from `state` after reducing `production`.
    pub fn goto(&self, state: State, symbol: Symbol, production: Prod) -> Option<State> {
        self.edges(state, symbol)
            .find(|e| e.accepts(production))
            .map(|e| e.target)
    }

    /// The states reachable from `from` by following the first `count` elements of
    /// `production`, staying on edges that carry the production's items.
    pub fn states_after(
        &self,
        info: &ProductionInfo,
        from: State,
        production: Prod,
        count: usize,
    ) -> BTreeSet<State> {
        let mut current: BTreeSet<State> = BTreeSet::new();
        current.insert(from);
        for k in 0..count {
            let symbol = info.production(production).elements[k].symbol;
            let wanted = SearchElement::new(production, k + 1);
            let mut next: BTreeSet<State> = BTreeSet::new();
            for &state in current.iter() {
                for edge in self.edges(state, symbol) {
                    if self.kernel(edge.target).binary_search(&wanted).is_ok() {
                        next.insert(edge.target);
                    }
                }
            }
            current = next;
        }
        current
    }

    // For every state b that starts a production q, walk q from b and record (b, goto) on the
    // reduce of q in each state where the walk ends.
    fn compute_reduce_tuples(&mut self, info: &ProductionInfo) {
        let mut found: Vec<(State, Prod, State, State)> = Vec::new();
        for b in 0..self.num_states() {
            let b = State::from(b);
            for item in self.nodes[b].items.iter() {
                if item.element != 0 || item.production == Prod::ACCEPT {
                    continue;
                }
                let production = item.production;
                let head = info.production(production).head;
                let target = match self.goto(b, head, production) {
                    Some(target) => target,
                    None => continue,
                };
                let len = info.production(production).elements.len();
                for end in self.states_after(info, b, production, len) {
                    found.push((end, production, b, target));
                }
            }
        }

        for (end, production, last_state, target) in found {
            if let Some(reduce) = self.nodes[end]
                .reduces
                .iter_mut()
                .find(|r| r.production == production)
            {
                reduce.tuples.push((last_state, target));
            }
        }
        for node in self.nodes.iter_mut() {
            for reduce in node.reduces.iter_mut() {
                reduce.tuples.sort();
                reduce.tuples.dedup();
            }
        }
    }

    fn report_unused_productions(&self, info: &ProductionInfo) {
        let mut used = vec![false; info.num_productions()];
        for node in self.nodes.iter() {
            for reduce in node.reduces.iter() {
                used[reduce.production.index()] = true;
            }
        }
        for (index, &is_used) in used.iter().enumerate().skip(1) {
            if !is_used {
                warn!(
                    "production is never reduced: {}",
                    info.production_to_str(Prod::from(index))
                );
            }
        }
    }

    /// Renders a state's items, edges and reduces, one per line.
    pub fn describe_node(&self, info: &ProductionInfo, state: State) -> String {
        let node = &self.nodes[state];
        let mut s = format!("s{} (via {})\n", state, self.accessing_symbol[state]);
        for &item in node.items.iter() {
            s.push_str(&format!("    {}\n", info.item_to_str(item)));
        }
        for edge in node.shifts.iter() {
            if edge.productions.is_empty() {
                s.push_str(&format!("    {} -> s{}\n", edge.symbol, edge.target));
            } else {
                s.push_str(&format!(
                    "    {} -> s{} {} {:?}\n",
                    edge.symbol,
                    edge.target,
                    if edge.reverse_storage { "except" } else { "for" },
                    edge.productions
                ));
            }
        }
        for reduce in node.reduces.iter() {
            s.push_str(&format!(
                "    reduce {} from {:?}\n",
                info.production_to_str(reduce.production),
                reduce.tuples
            ));
        }
        s
    }
}

// Gets the state for a particular kernel.  If no such state exists yet, then a new state will
// be created, and the worklist in compute() will get to it.
fn find_or_create_state(
    info: &ProductionInfo,
    kernel: &[SearchElement],
    state_set: &mut BTreeMap<SearchElement, Vec<State>>,
    states: &mut CoreTable,
    accessing_symbol: &mut TVec<State, Symbol>,
    symbol: Symbol,
) -> State {
    let key_item = kernel[0];
    let this_state_set = state_set.entry(key_item).or_default();

    // Search for an existing core that has the same items.
    for &state in this_state_set.iter() {
        if kernel == states.values(state) {
            return state;
        }
    }

    let new_state: State = states.num_keys().into();
    states.push_entry(kernel.iter().copied());
    accessing_symbol.push(symbol);
    this_state_set.push(new_state);

    debug!("    created state s{}:", new_state);
    print_core(info, new_state, kernel);

    new_state
}

fn print_core(info: &ProductionInfo, state: State, items: &[SearchElement]) {
    debug!("    s{}", state);
    for &item in items.iter() {
        debug!("        {}", info.item_to_str(item));
    }
}
