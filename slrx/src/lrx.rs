//! Bounded-lookahead conflict resolution.
//!
//! A state of the LR(0) automaton is conflicted when it has two or more reduces, or shifts and a
//! reduce.  For such a state we simulate every competing action on a partially known parser
//! stack, collect the terminals each one can shift next, and split the actions by that symbol.
//! A symbol reached by only one action decides it; a symbol reached by several actions needs
//! another level of lookahead.  The result is a decision trie per state, which the runtime walks
//! as tokens arrive.
//!
//! Only the states on top of the stack are known during the simulation.  When a reduce pops
//! below them, the search branches over every state that the reduce's tuples say could be there,
//! so the set of symbols found for an action may be larger than what a real parse could see.
//! That can only make the trie deeper, never wrong.

use crate::errors::{ConflictAction, GrammarError, IllegalSlrxCategory, IllegalSlrxProduction};
use crate::grammar::{OpePriority, ProductionBuilder};
use crate::lr0::Lr0;
use crate::production_info::ProductionInfo;
use crate::tvec::TVec;
use crate::{Prod, State};
use log::debug;
use slrx_runtime::{ParseTable, ReduceProperty, ReduceTarget, RequireAction, Symbol};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReduceTuple {
    pub last_state: State,
    pub target: State,
    pub need_predict: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LrxReduce {
    pub production: Prod,
    pub property: ReduceProperty,
    pub tuples: Vec<ReduceTuple>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LrxNode {
    /// The decision trie, root level first.  `Descend` values index this list.
    pub levels: Vec<BTreeMap<Symbol, RequireAction<State, usize>>>,
    pub reduces: Vec<LrxReduce>,
    pub reduce_always: Option<usize>,
    pub forward_detect: usize,
}

/// A compiled grammar.
pub struct Lrx {
    pub info: ProductionInfo,
    pub lr0: Lr0,
    pub nodes: TVec<State, LrxNode>,
    pub max_forward_detect: usize,
}

impl Lrx {
    /// Compiles a grammar.  `max_forward_detect` bounds the number of lookahead symbols any
    /// state may use to pick its action; zero accepts only conflict-free LR(0) automata.
    pub fn create(
        start: Symbol,
        productions: &[ProductionBuilder],
        priorities: &[OpePriority],
        max_forward_detect: usize,
    ) -> Result<Lrx, GrammarError> {
        let info = ProductionInfo::new(start, productions, priorities)?;
        let lr0 = Lr0::compute(&info);
        let predict = Predict::compute(&info, &lr0);

        let mut nodes: TVec<State, LrxNode> = TVec::new();
        for state in 0..lr0.num_states() {
            let state = State::from(state);
            nodes.push(build_node(&info, &lr0, &predict, state, max_forward_detect)?);
        }

        Ok(Lrx {
            info,
            lr0,
            nodes,
            max_forward_detect,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, state: State) -> &LrxNode {
        &self.nodes[state]
    }

    /// The LR(0) view of a state, followed by its decision trie.
    pub fn describe_node(&self, state: State) -> String {
        let mut s = self.lr0.describe_node(&self.info, state);
        let node = &self.nodes[state];
        if let Some(reduce) = node.reduce_always {
            s.push_str(&format!("    always reduce #{}\n", reduce));
        }
        for (index, level) in node.levels.iter().enumerate() {
            for (symbol, action) in level.iter() {
                s.push_str(&format!("    [{}] {} => {:?}\n", index, symbol, action));
            }
        }
        s
    }
}

impl ParseTable for Lrx {
    type Node = State;
    type Level = usize;

    fn startup_node(&self) -> State {
        State(0)
    }

    fn root_level(&self, _node: State) -> usize {
        0
    }

    fn forward_detect(&self, node: State) -> usize {
        self.nodes[node].forward_detect
    }

    fn reduce_always(&self, node: State) -> Option<usize> {
        self.nodes[node].reduce_always
    }

    fn require(&self, node: State, level: usize, symbol: Symbol) -> Option<RequireAction<State, usize>> {
        self.nodes[node].levels[level].get(&symbol).copied()
    }

    fn require_symbols(&self, node: State, level: usize) -> Vec<Symbol> {
        self.nodes[node].levels[level].keys().copied().collect()
    }

    fn reduce_property(&self, node: State, reduce: usize) -> ReduceProperty {
        self.nodes[node].reduces[reduce].property
    }

    fn reduce_target(&self, node: State, reduce: usize, last_state: State) -> Option<ReduceTarget<State>> {
        self.nodes[node].reduces[reduce]
            .tuples
            .iter()
            .find(|t| t.last_state == last_state)
            .map(|t| ReduceTarget {
                target: t.target,
                need_predict: t.need_predict,
            })
    }
}

// Nodes from which a reduce of a production declared with need_predict can be reached.  Every
// terminal shift and reduce tuple entering such a node carries the predict flag.
struct Predict {
    marked: TVec<State, bool>,
}

impl Predict {
    fn compute(info: &ProductionInfo, lr0: &Lr0) -> Predict {
        let mut marked: TVec<State, bool> = TVec::new();
        let mut sources: TVec<State, Vec<State>> = TVec::new();
        let mut queue: Vec<State> = Vec::new();
        for state in 0..lr0.num_states() {
            let state = State::from(state);
            let seed = lr0
                .node(state)
                .reduces
                .iter()
                .any(|reduce| info.production(reduce.production).need_predict);
            if seed {
                queue.push(state);
            }
            marked.push(seed);
            sources.push(Vec::new());
        }

        for state in 0..lr0.num_states() {
            let state = State::from(state);
            let node = lr0.node(state);
            for edge in node.terminal_shifts() {
                sources[edge.target].push(state);
            }
            for reduce in node.reduces.iter() {
                for &(_, target) in reduce.tuples.iter() {
                    sources[target].push(state);
                }
            }
        }

        while let Some(state) = queue.pop() {
            for &source in sources[state].iter() {
                if !marked[source] {
                    marked[source] = true;
                    queue.push(source);
                }
            }
        }

        debug!(
            "predict nodes: {:?}",
            marked
                .iter()
                .enumerate()
                .filter(|&(_, &m)| m)
                .map(|(state, _)| state)
                .collect::<Vec<usize>>()
        );
        Predict { marked }
    }

    fn flags(&self, target: State) -> bool {
        self.marked[target]
    }
}

fn build_node(
    info: &ProductionInfo,
    lr0: &Lr0,
    predict: &Predict,
    state: State,
    max_forward_detect: usize,
) -> Result<LrxNode, IllegalSlrxProduction> {
    let lr0_node = lr0.node(state);

    let reduces: Vec<LrxReduce> = lr0_node
        .reduces
        .iter()
        .map(|reduce| {
            let production = info.production(reduce.production);
            LrxReduce {
                production: reduce.production,
                property: ReduceProperty {
                    head: production.head,
                    production_index: reduce.production.user_index().unwrap_or(0),
                    element_count: production.elements.len(),
                    mask: production.mask,
                    need_predict: production.need_predict,
                },
                tuples: reduce
                    .tuples
                    .iter()
                    .map(|&(last_state, target)| ReduceTuple {
                        last_state,
                        target,
                        need_predict: predict.flags(target),
                    })
                    .collect(),
            }
        })
        .collect();

    let has_shift = lr0_node.has_terminal_shift();

    if reduces.len() == 1 && !has_shift {
        return Ok(LrxNode {
            levels: vec![BTreeMap::new()],
            reduces,
            reduce_always: Some(0),
            forward_detect: 0,
        });
    }

    if reduces.is_empty() {
        let root: BTreeMap<Symbol, RequireAction<State, usize>> = lr0_node
            .terminal_shifts()
            .map(|edge| {
                (
                    edge.symbol,
                    RequireAction::Shift {
                        target: edge.target,
                        need_predict: predict.flags(edge.target),
                    },
                )
            })
            .collect();
        let forward_detect = if root.is_empty() { 0 } else { 1 };
        return Ok(LrxNode {
            levels: vec![root],
            reduces,
            reduce_always: None,
            forward_detect,
        });
    }

    debug!(
        "s{} is conflicted: {} reduces, shifts: {}",
        state,
        reduces.len(),
        has_shift
    );
    let mut search = Search {
        info,
        lr0,
        predict,
        node: state,
        max_forward_detect,
        levels: vec![BTreeMap::new()],
        deepest: 0,
    };
    search.run()?;
    Ok(LrxNode {
        levels: search.levels,
        reduces,
        reduce_always: None,
        forward_detect: search.deepest,
    })
}

// One competing action of the conflicted state.  Reduce holds the index into the state's reduces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
enum Action {
    Shift,
    Reduce(usize),
}

// A simulated stack.  stack[0] sits at depth `base`; only its relative value matters.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Config {
    base: isize,
    stack: Vec<State>,
}

impl Config {
    fn top(&self) -> State {
        self.stack[self.stack.len() - 1]
    }

    fn pushed(&self, state: State) -> Config {
        let mut stack = self.stack.clone();
        stack.push(state);
        Config {
            base: self.base,
            stack,
        }
    }
}

// (action, next terminal, stack after shifting it)
type Options = BTreeSet<(Action, Symbol, Vec<State>)>;

// The reduce chain being followed by `Search::visit`.
struct Walk {
    // Configurations the chain has passed through, oldest first.
    trail: Vec<Config>,
    // Productions reduced along the chain, including the one that started it.
    reduced: Vec<Prod>,
    explored: BTreeSet<Vec<State>>,
}

struct Search<'a> {
    info: &'a ProductionInfo,
    lr0: &'a Lr0,
    predict: &'a Predict,
    node: State,
    max_forward_detect: usize,
    levels: Vec<BTreeMap<Symbol, RequireAction<State, usize>>>,
    deepest: usize,
}

impl<'a> Search<'a> {
    fn run(&mut self) -> Result<(), IllegalSlrxProduction> {
        let lr0_node = self.lr0.node(self.node);
        if self.max_forward_detect == 0 {
            let mut actions: BTreeSet<Action> = (0..lr0_node.reduces.len()).map(Action::Reduce).collect();
            if lr0_node.has_terminal_shift() {
                actions.insert(Action::Shift);
            }
            return Err(self.error(
                IllegalSlrxCategory::MaxForwardDetectNotPassed,
                &[],
                &actions,
            ));
        }

        let start = Config {
            base: 0,
            stack: vec![self.node],
        };
        let mut options = Options::new();
        for edge in lr0_node.terminal_shifts() {
            options.insert((Action::Shift, edge.symbol, start.pushed(edge.target).stack));
        }
        for (index, reduce) in lr0_node.reduces.iter().enumerate() {
            if reduce.production == Prod::ACCEPT {
                continue;
            }
            let action = Action::Reduce(index);
            for next in self.reduce_config(&start, reduce.production) {
                self.advance(next, action, Some(reduce.production), &[], &mut options)?;
            }
        }
        self.split(0, &[], options)
    }

    // Applies a reduce of `production` to the top of `config`.  Several results are possible
    // when the reduce pops below the known part of the stack.
    fn reduce_config(&self, config: &Config, production: Prod) -> Vec<Config> {
        let top = config.top();
        let tuples = match self
            .lr0
            .node(top)
            .reduces
            .iter()
            .find(|r| r.production == production)
        {
            Some(reduce) => &reduce.tuples,
            None => return Vec::new(),
        };
        let count = self.info.production(production).elements.len();
        let len = config.stack.len();

        if count < len {
            let last_state = config.stack[len - 1 - count];
            return tuples
                .iter()
                .filter(|&&(last, _)| last == last_state)
                .map(|&(_, target)| {
                    let mut stack = config.stack[..len - count].to_vec();
                    stack.push(target);
                    Config {
                        base: config.base,
                        stack,
                    }
                })
                .collect();
        }

        // The state uncovered by the reduce is unknown: it is any `last_state` from which the
        // production's first `walked` elements lead to the known bottom of the stack.
        let walked = count - len + 1;
        tuples
            .iter()
            .filter(|&&(last, _)| {
                self.lr0
                    .states_after(self.info, last, production, walked)
                    .contains(&config.stack[0])
            })
            .map(|&(last, target)| Config {
                base: config.base + len as isize - 1 - count as isize,
                stack: vec![last, target],
            })
            .collect()
    }

    // Follows every reduce reachable from `config` without consuming input, and records each
    // terminal shift found on the way.  `via` is the reduce that produced `config`, if any.
    fn advance(
        &self,
        config: Config,
        action: Action,
        via: Option<Prod>,
        lookahead: &[Symbol],
        options: &mut Options,
    ) -> Result<(), IllegalSlrxProduction> {
        let fresh_from = config.stack.len();
        let mut walk = Walk {
            trail: Vec::new(),
            reduced: via.into_iter().collect(),
            explored: BTreeSet::new(),
        };
        self.visit(config, fresh_from, action, lookahead, &mut walk, options)
    }

    fn visit(
        &self,
        config: Config,
        fresh_from: usize,
        action: Action,
        lookahead: &[Symbol],
        walk: &mut Walk,
        options: &mut Options,
    ) -> Result<(), IllegalSlrxProduction> {
        let top = config.top();
        let len = config.stack.len();

        // Reductions that come back to the same stack without going deeper, or that stack a
        // state on top of itself, can repeat forever.
        let repeats = walk
            .trail
            .iter()
            .any(|c| c.stack == config.stack && config.base >= c.base);
        let grows = config
            .stack
            .get(fresh_from..len - 1)
            .map_or(false, |pushed| pushed.contains(&top));
        if repeats || grows {
            debug!(
                "s{}: endless reduce reaching {:?} from {:?}",
                self.node, config.stack, walk.trail
            );
            let mut actions = BTreeSet::new();
            actions.insert(action);
            let mut e = self.error(IllegalSlrxCategory::EndlessReduce, lookahead, &actions);
            e.reduce_path = walk
                .reduced
                .iter()
                .filter_map(|production| production.user_index())
                .collect();
            return Err(e);
        }
        if !walk.explored.insert(config.stack.clone()) {
            return Ok(());
        }

        let lr0_node = self.lr0.node(top);
        for edge in lr0_node.terminal_shifts() {
            options.insert((action, edge.symbol, config.pushed(edge.target).stack));
        }

        for reduce in lr0_node.reduces.iter() {
            if reduce.production == Prod::ACCEPT {
                continue;
            }
            let count = self.info.production(reduce.production).elements.len();
            let next_fresh = if count < len {
                fresh_from.min(len - count)
            } else {
                1
            };
            for next in self.reduce_config(&config, reduce.production) {
                walk.trail.push(config.clone());
                walk.reduced.push(reduce.production);
                let result = self.visit(next, next_fresh, action, lookahead, walk, options);
                walk.reduced.pop();
                walk.trail.pop();
                result?;
            }
        }
        Ok(())
    }

    // Groups the options by their next symbol and fills one trie level.
    fn split(
        &mut self,
        level: usize,
        lookahead: &[Symbol],
        options: Options,
    ) -> Result<(), IllegalSlrxProduction> {
        let mut groups: BTreeMap<Symbol, Vec<(Action, Vec<State>)>> = BTreeMap::new();
        for (action, symbol, stack) in options {
            groups.entry(symbol).or_default().push((action, stack));
        }

        for (symbol, group) in groups {
            let mut path = lookahead.to_vec();
            path.push(symbol);
            let actions: BTreeSet<Action> = group.iter().map(|(action, _)| *action).collect();

            if actions.len() == 1 {
                if let Some(&action) = actions.iter().next() {
                    self.record(level, &path, action);
                }
                continue;
            }

            if symbol == Symbol::EOF {
                return Err(self.error(IllegalSlrxCategory::ConflictReduce, &path, &actions));
            }
            for (i, (a, stack_a)) in group.iter().enumerate() {
                for (b, stack_b) in group[i + 1..].iter() {
                    if a != b && stack_a == stack_b {
                        return Err(self.error(IllegalSlrxCategory::ConflictReduce, &path, &actions));
                    }
                }
            }
            if path.len() >= self.max_forward_detect {
                return Err(self.error(
                    IllegalSlrxCategory::MaxForwardDetectNotPassed,
                    &path,
                    &actions,
                ));
            }

            let next_level = self.levels.len();
            self.levels.push(BTreeMap::new());
            self.levels[level].insert(symbol, RequireAction::Descend(next_level));
            self.deepest = self.deepest.max(path.len() + 1);
            debug!("s{} {:?} => descend to level {}", self.node, path, next_level);

            let mut next_options = Options::new();
            for (action, stack) in group {
                let config = Config { base: 0, stack };
                self.advance(config, action, None, &path, &mut next_options)?;
            }
            self.split(next_level, &path, next_options)?;
        }
        Ok(())
    }

    fn record(&mut self, level: usize, path: &[Symbol], action: Action) {
        let require = match action {
            Action::Reduce(index) => RequireAction::Reduce(index),
            Action::Shift => {
                let first = path[0];
                match self.lr0.shift(self.node, first) {
                    Some(target) => RequireAction::Shift {
                        target,
                        need_predict: self.predict.flags(target),
                    },
                    None => return,
                }
            }
        };
        debug!("s{} {:?} => {:?}", self.node, path, require);
        self.levels[level].insert(path[path.len() - 1], require);
        self.deepest = self.deepest.max(path.len());
    }

    fn error(
        &self,
        category: IllegalSlrxCategory,
        lookahead: &[Symbol],
        actions: &BTreeSet<Action>,
    ) -> IllegalSlrxProduction {
        let lr0_node = self.lr0.node(self.node);
        let mut mapped_productions: Vec<usize> = self
            .lr0
            .kernel(self.node)
            .iter()
            .filter_map(|item| item.production.user_index())
            .collect();
        mapped_productions.dedup();
        IllegalSlrxProduction {
            category,
            max_forward_detect: self.max_forward_detect,
            node: self.node.index(),
            mapped_productions,
            lookahead: lookahead.to_vec(),
            reduce_path: Vec::new(),
            actions: actions
                .iter()
                .map(|action| match *action {
                    Action::Shift => ConflictAction::Shift,
                    Action::Reduce(index) => ConflictAction::Reduce(
                        lr0_node.reduces[index]
                            .production
                            .user_index()
                            .unwrap_or(0),
                    ),
                })
                .collect(),
        }
    }
}
