use super::*;
use slrx_runtime::{ParseTable, ParsingStep, RequireAction, SymbolProcessor};

#[static_init::dynamic]
static INIT_LOGGER: () = {
    env_logger::builder().default_format_timestamp(false).init();
};

const NUM: Symbol = Symbol::terminal(0);
const PLUS: Symbol = Symbol::terminal(1);
const MINUS: Symbol = Symbol::terminal(2);
const TIMES: Symbol = Symbol::terminal(3);
const DIVIDE: Symbol = Symbol::terminal(4);
const LPAREN: Symbol = Symbol::terminal(5);
const RPAREN: Symbol = Symbol::terminal(6);
const E: Symbol = Symbol::non_terminal(0);

fn calc_productions() -> Vec<ProductionBuilder> {
    vec![
        ProductionBuilder::of_symbols(E, &[E, PLUS, E], 0),
        ProductionBuilder::of_symbols(E, &[E, MINUS, E], 0),
        ProductionBuilder::of_symbols(E, &[E, TIMES, E], 0),
        ProductionBuilder::of_symbols(E, &[E, DIVIDE, E], 0),
        ProductionBuilder::of_symbols(E, &[LPAREN, E, RPAREN], 0),
        ProductionBuilder::of_symbols(E, &[NUM], 0),
    ]
}

fn calc_priorities() -> Vec<OpePriority> {
    vec![
        OpePriority::left(&[PLUS, MINUS]),
        OpePriority::left(&[TIMES, DIVIDE]),
    ]
}

fn calc() -> Lrx {
    match Lrx::create(E, &calc_productions(), &calc_priorities(), 1) {
        Ok(lrx) => lrx,
        Err(e) => panic!("calculator grammar rejected: {}", e),
    }
}

fn prods(user: &[usize]) -> Option<Vec<Prod>> {
    Some(user.iter().map(|&i| Prod::from_user(i)).collect())
}

#[test]
fn priorities_become_operand_filters() {
    let info = ProductionInfo::new(E, &calc_productions(), &calc_priorities()).unwrap();
    assert_eq!(info.num_productions(), 7);
    assert_eq!(info.production(Prod::ACCEPT).head, Symbol::START);

    let plus = Prod::from_user(0);
    let times = Prod::from_user(2);
    let parens = Prod::from_user(4);

    // A left-associative operator takes anything on its left, and only tighter operators or
    // atoms on its right.
    assert_eq!(info.acceptable_productions(plus, 0), None);
    assert_eq!(info.acceptable_productions(plus, 2).map(|l| l.to_vec()), prods(&[2, 3, 4, 5]));
    assert_eq!(info.acceptable_productions(times, 0).map(|l| l.to_vec()), prods(&[2, 3, 4, 5]));
    assert_eq!(info.acceptable_productions(times, 2).map(|l| l.to_vec()), prods(&[4, 5]));
    assert_eq!(info.acceptable_productions(parens, 1), None);
}

#[test]
fn right_associativity() {
    const POW: Symbol = Symbol::terminal(7);
    let productions = vec![
        ProductionBuilder::of_symbols(E, &[E, POW, E], 0),
        ProductionBuilder::of_symbols(E, &[NUM], 0),
    ];
    let info = ProductionInfo::new(E, &productions, &[OpePriority::right(&[POW])]).unwrap();
    let pow = Prod::from_user(0);
    assert_eq!(info.acceptable_productions(pow, 0).map(|l| l.to_vec()), prods(&[1]));
    assert_eq!(info.acceptable_productions(pow, 2), None);
}

#[test]
fn markers() {
    const A: Symbol = Symbol::terminal(0);
    const B: Symbol = Symbol::terminal(1);
    const S: Symbol = Symbol::non_terminal(0);
    const X: Symbol = Symbol::non_terminal(1);
    let productions = vec![
        ProductionBuilder::new(S, vec![X.into(), ProductionElement::Mask(1)], 0),
        ProductionBuilder::of_symbols(X, &[A], 1),
        ProductionBuilder::of_symbols(X, &[B], 2),
        ProductionBuilder::new(X, vec![X.into(), ProductionElement::ItSelf, A.into()], 1),
    ];
    let info = ProductionInfo::new(S, &productions, &[]).unwrap();
    assert_eq!(info.acceptable_productions(Prod::from_user(0), 0).map(|l| l.to_vec()), prods(&[1, 3]));
    assert_eq!(info.acceptable_productions(Prod::from_user(3), 0).map(|l| l.to_vec()), prods(&[3]));

    let items = info.expand_search_elements(core::iter::once(SearchElement::new(Prod::ACCEPT, 0)));
    let starts: Vec<Prod> = items.iter().map(|item| item.production).collect();
    assert_eq!(starts, vec![Prod(0), Prod(1), Prod(2), Prod(4)]);
}

#[test]
fn goto_edges_split_by_production() {
    let lrx = calc();
    let startup = State(0);
    assert_eq!(lrx.lr0.edges(startup, E).count(), 2);

    let after_sum = lrx.lr0.goto(startup, E, Prod::from_user(0));
    let after_atom = lrx.lr0.goto(startup, E, Prod::from_user(5));
    assert!(after_sum.is_some());
    assert!(after_atom.is_some());
    assert_ne!(after_sum, after_atom);
    assert_eq!(lrx.lr0.goto(startup, E, Prod::from_user(1)), after_sum);
    assert_eq!(lrx.lr0.goto(startup, E, Prod::from_user(2)), after_atom);

    for edge in lrx.lr0.edges(startup, E) {
        // Each edge stores the shorter of its two production lists.
        assert!(edge.productions.len() <= 2);
    }
}

#[test]
fn calculator_needs_one_symbol() {
    let lrx = calc();
    let deepest = lrx.nodes.iter().map(|node| node.forward_detect).max();
    assert_eq!(deepest, Some(1));

    // Every node without input-driven choices reduces unconditionally.
    for node in lrx.nodes.iter() {
        if node.reduce_always.is_some() {
            assert_eq!(node.reduces.len(), 1);
            assert!(node.levels[0].is_empty());
        }
        assert!(!node.levels.is_empty());
    }
}

#[test]
fn conflicted_node_trie() {
    let lrx = calc();
    let startup = State(0);
    let after_sum = lrx.lr0.goto(startup, E, Prod::from_user(0)).unwrap();
    let plus_state = lrx.lr0.shift(after_sum, PLUS).unwrap();
    let num_state = lrx.lr0.shift(plus_state, NUM).unwrap();
    let conflicted = lrx.lr0.goto(plus_state, E, Prod::from_user(5)).unwrap();
    assert_eq!(lrx.reduce_always(num_state), Some(0));

    let node = lrx.node(conflicted);
    assert_eq!(node.reduce_always, None);
    assert_eq!(node.forward_detect, 1);
    assert_eq!(node.reduces.len(), 1);
    assert_eq!(node.reduces[0].production, Prod::from_user(0));

    let root = lrx.root_level(conflicted);
    for &symbol in [PLUS, MINUS, RPAREN, Symbol::EOF].iter() {
        assert_eq!(lrx.require(conflicted, root, symbol), Some(RequireAction::Reduce(0)));
    }
    for &symbol in [TIMES, DIVIDE].iter() {
        match lrx.require(conflicted, root, symbol) {
            Some(RequireAction::Shift { need_predict, .. }) => assert!(!need_predict),
            other => panic!("expected a shift on {}, got {:?}", symbol, other),
        }
    }
    assert_eq!(lrx.require(conflicted, root, NUM), None);
    println!("{}", lrx.describe_node(conflicted));
}

#[test]
fn two_symbols_of_lookahead() {
    const A: Symbol = Symbol::terminal(0);
    const X: Symbol = Symbol::terminal(1);
    const Y: Symbol = Symbol::terminal(2);
    const Z: Symbol = Symbol::terminal(3);
    const S: Symbol = Symbol::non_terminal(0);
    const NA: Symbol = Symbol::non_terminal(1);
    const NB: Symbol = Symbol::non_terminal(2);
    let productions = vec![
        ProductionBuilder::of_symbols(S, &[NA, X, Y], 0),
        ProductionBuilder::of_symbols(S, &[NB, X, Z], 0),
        ProductionBuilder::of_symbols(NA, &[A], 0),
        ProductionBuilder::of_symbols(NB, &[A], 0),
    ];
    let lrx = Lrx::create(S, &productions, &[], 2).unwrap();
    let after_a = lrx.lr0.shift(State(0), A).unwrap();
    let node = lrx.node(after_a);
    assert_eq!(node.forward_detect, 2);
    assert_eq!(node.levels.len(), 2);
    assert_eq!(node.levels[0].get(&X), Some(&RequireAction::Descend(1)));
    assert_eq!(node.levels[1].get(&Y), Some(&RequireAction::Reduce(0)));
    assert_eq!(node.levels[1].get(&Z), Some(&RequireAction::Reduce(1)));
}

#[test]
fn predict_flags_follow_the_production() {
    const A: Symbol = Symbol::terminal(0);
    const B: Symbol = Symbol::terminal(1);
    const C: Symbol = Symbol::terminal(2);
    const S: Symbol = Symbol::non_terminal(0);
    const NA: Symbol = Symbol::non_terminal(1);
    let productions = vec![
        ProductionBuilder::of_symbols(S, &[NA, B], 0),
        ProductionBuilder::of_symbols(NA, &[A, C], 3).with_predict(),
    ];
    let lrx = Lrx::create(S, &productions, &[], 1).unwrap();
    let startup = lrx.startup_node();
    match lrx.require(startup, 0, A) {
        Some(RequireAction::Shift { need_predict, .. }) => assert!(need_predict),
        other => panic!("expected a shift, got {:?}", other),
    }
    let after_na = lrx.lr0.goto(startup, NA, Prod::from_user(1)).unwrap();
    match lrx.require(after_na, 0, B) {
        Some(RequireAction::Shift { need_predict, .. }) => assert!(!need_predict),
        other => panic!("expected a shift, got {:?}", other),
    }

    let mut processor = SymbolProcessor::new(&lrx);
    processor.consume(A, 0).unwrap();
    // The predicted element is still open, so nothing is settled yet.
    assert!(processor.clear_steps().is_empty());
    processor.consume(C, 1).unwrap();
    let settled = processor.clear_steps();
    assert_eq!(
        settled[0],
        ParsingStep::Predict {
            symbol: NA,
            mask: 3,
            production_index: 1,
        }
    );
    assert_eq!(settled.len(), 4);
    assert!(settled[3].is_reduce());
    processor.consume(B, 2).unwrap();
    processor.end_of_file().unwrap();
    assert_eq!(processor.steps().len(), 2);
}

#[test]
fn serialized_layout() {
    let lrx = calc();
    let table = lrx.to_table::<u16>().unwrap();
    let words = table.words();
    assert_eq!(words[0] as usize, lrx.num_nodes());
    assert_eq!(words[1] as usize, slrx_runtime::layout::HEADER);

    let wrapper = slrx_runtime::TableWrapper::new(words).unwrap();
    assert_eq!(wrapper.node_count(), lrx.num_nodes());
    for (state, node) in wrapper.nodes().enumerate() {
        let state = State::from(state);
        assert_eq!(node.reduce_count(), lrx.node(state).reduces.len());
        assert_eq!(node.forward_detect(), lrx.node(state).forward_detect);
        assert_eq!(node.reduce_always(), lrx.node(state).reduce_always);
    }
}

#[test]
fn predict_flags_reach_back_to_the_start() {
    const X: Symbol = Symbol::terminal(0);
    const A: Symbol = Symbol::terminal(1);
    const C: Symbol = Symbol::terminal(2);
    const S: Symbol = Symbol::non_terminal(0);
    const NX: Symbol = Symbol::non_terminal(1);
    const NA: Symbol = Symbol::non_terminal(2);
    // S := NX NA, NX := x, NA := a c
    let productions = vec![
        ProductionBuilder::of_symbols(S, &[NX, NA], 0),
        ProductionBuilder::of_symbols(NX, &[X], 0),
        ProductionBuilder::of_symbols(NA, &[A, C], 0).with_predict(),
    ];
    let lrx = Lrx::create(S, &productions, &[], 1).unwrap();
    let startup = lrx.startup_node();

    // Every edge leading towards the predicted reduce is flagged, including the ones before it.
    match lrx.require(startup, 0, X) {
        Some(RequireAction::Shift { need_predict, .. }) => assert!(need_predict),
        other => panic!("expected a shift, got {:?}", other),
    }
    let after_x = lrx.lr0.shift(startup, X).unwrap();
    let reduce_x = &lrx.node(after_x).reduces[0];
    assert_eq!(reduce_x.tuples.len(), 1);
    assert!(reduce_x.tuples[0].need_predict);

    let after_nx = reduce_x.tuples[0].target;
    let after_a = lrx.lr0.shift(after_nx, A).unwrap();
    let after_c = lrx.lr0.shift(after_a, C).unwrap();
    let reduce_na = &lrx.node(after_c).reduces[0];
    assert_eq!(reduce_na.production, Prod::from_user(2));
    assert!(!reduce_na.tuples[0].need_predict);

    let mut processor = SymbolProcessor::new(&lrx);
    processor.consume(X, 0).unwrap();
    assert!(processor.clear_steps().is_empty());
    processor.consume(A, 1).unwrap();
    assert!(processor.clear_steps().is_empty());
    processor.consume(C, 2).unwrap();
    let settled = processor.clear_steps();
    let symbols: Vec<Symbol> = settled.iter().map(|s| s.symbol()).collect();
    assert_eq!(symbols, vec![X, NX, NA, A, C, NA, S]);
    assert_eq!(
        settled[0],
        ParsingStep::Shift {
            symbol: X,
            token_index: 0,
            need_predict: true,
        }
    );
    processor.end_of_file().unwrap();
    assert!(processor.steps().is_empty());
}
