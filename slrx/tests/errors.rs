use slrx::{
    ConflictAction, GrammarError, IllegalSlrxCategory, IllegalSlrxProduction, Lrx, OpePriority,
    OpePriorityConflict, ProductionBuilder, ProductionElement, WrongProduction,
    WrongProductionCategory,
};
use slrx_runtime::{Symbol, SymbolProcessor};

const A: Symbol = Symbol::terminal(0);
const X: Symbol = Symbol::terminal(1);
const Y: Symbol = Symbol::terminal(2);
const Z: Symbol = Symbol::terminal(3);
const S: Symbol = Symbol::non_terminal(0);
const NA: Symbol = Symbol::non_terminal(1);
const NB: Symbol = Symbol::non_terminal(2);

fn create(productions: &[ProductionBuilder], max_forward_detect: usize) -> Result<Lrx, GrammarError> {
    Lrx::create(S, productions, &[], max_forward_detect)
}

fn illegal(result: Result<Lrx, GrammarError>) -> IllegalSlrxProduction {
    match result {
        Err(GrammarError::IllegalSlrxProduction(e)) => e,
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("grammar was accepted"),
    }
}

fn wrong(result: Result<Lrx, GrammarError>) -> WrongProduction {
    match result {
        Err(GrammarError::WrongProduction(e)) => e,
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("grammar was accepted"),
    }
}

// S := NA x y | NB x z, NA := a, NB := a.  Telling the two reduces apart takes two symbols.
fn two_lookahead() -> Vec<ProductionBuilder> {
    vec![
        ProductionBuilder::of_symbols(S, &[NA, X, Y], 0),
        ProductionBuilder::of_symbols(S, &[NB, X, Z], 0),
        ProductionBuilder::of_symbols(NA, &[A], 0),
        ProductionBuilder::of_symbols(NB, &[A], 0),
    ]
}

#[test]
fn lookahead_limit() {
    let e = illegal(create(&two_lookahead(), 1));
    assert_eq!(e.category, IllegalSlrxCategory::MaxForwardDetectNotPassed);
    assert_eq!(e.max_forward_detect, 1);
    assert_eq!(e.lookahead, vec![X]);
    assert_eq!(e.actions, vec![ConflictAction::Reduce(2), ConflictAction::Reduce(3)]);
    assert_eq!(e.mapped_productions, vec![2, 3]);

    let e = illegal(create(&two_lookahead(), 0));
    assert_eq!(e.category, IllegalSlrxCategory::MaxForwardDetectNotPassed);
    assert!(e.lookahead.is_empty());
}

#[test]
fn lookahead_of_two() {
    let table = create(&two_lookahead(), 2).unwrap();
    let mut processor = SymbolProcessor::new(&table);
    processor.consume(A, 0).unwrap();
    processor.consume(X, 1).unwrap();
    // Both reduces are still possible.
    assert!(processor.steps()[1..].is_empty());
    assert_eq!(processor.expected_symbols(), vec![Y, Z]);

    processor.consume(Z, 2).unwrap();
    processor.end_of_file().unwrap();
    let heads: Vec<Symbol> = processor.steps().iter().map(|s| s.symbol()).collect();
    assert_eq!(heads, vec![A, NB, X, Z, S]);
}

#[test]
fn conflict_free_grammar_needs_no_lookahead() {
    let productions = vec![ProductionBuilder::of_symbols(S, &[A, X], 0)];
    let table = create(&productions, 0).unwrap();
    let mut processor = SymbolProcessor::new(&table);
    processor.consume(A, 0).unwrap();
    processor.consume(X, 1).unwrap();
    processor.end_of_file().unwrap();
}

#[test]
fn ambiguous_grammar() {
    let productions = vec![
        ProductionBuilder::of_symbols(S, &[NA], 0),
        ProductionBuilder::of_symbols(S, &[NB], 0),
        ProductionBuilder::of_symbols(NA, &[A], 0),
        ProductionBuilder::of_symbols(NB, &[A], 0),
    ];
    let e = illegal(create(&productions, 3));
    assert_eq!(e.category, IllegalSlrxCategory::ConflictReduce);
    assert_eq!(e.lookahead, vec![Symbol::EOF]);
    assert_eq!(e.actions, vec![ConflictAction::Reduce(2), ConflictAction::Reduce(3)]);
}

#[test]
fn endless_reduce() {
    // S := <empty> | S S derives the empty string in unboundedly many ways.
    let productions = vec![
        ProductionBuilder::of_symbols(S, &[], 0),
        ProductionBuilder::of_symbols(S, &[S, S], 0),
    ];
    let e = illegal(create(&productions, 2));
    assert_eq!(e.category, IllegalSlrxCategory::EndlessReduce);
    assert_eq!(e.actions, vec![ConflictAction::Reduce(0)]);
    // The empty production keeps stacking new S's on top of each other.
    assert_eq!(e.reduce_path, vec![0, 0, 0]);

    let e = illegal(create(&two_lookahead(), 1));
    assert!(e.reduce_path.is_empty());
}

#[test]
fn empty_input() {
    // L := L a | <empty>
    let productions = vec![
        ProductionBuilder::of_symbols(S, &[S, A], 0),
        ProductionBuilder::of_symbols(S, &[], 0),
    ];
    let table = create(&productions, 1).unwrap();
    let mut processor = SymbolProcessor::new(&table);
    processor.end_of_file().unwrap();
    assert_eq!(processor.steps().len(), 1);
    assert!(processor.steps()[0].is_reduce());

    processor.clear();
    for index in 0..3 {
        processor.consume(A, index).unwrap();
    }
    processor.end_of_file().unwrap();
    assert_eq!(processor.steps().len(), 7);
}

#[test]
fn wrong_productions() {
    let e = wrong(Lrx::create(A, &[ProductionBuilder::of_symbols(S, &[A], 0)], &[], 1));
    assert_eq!(e.category, WrongProductionCategory::StartSymbolIsNotNonTerminal);
    assert_eq!(e.production_index, None);

    let e = wrong(create(
        &[
            ProductionBuilder::of_symbols(S, &[A], 0),
            ProductionBuilder::of_symbols(X, &[A], 0),
        ],
        1,
    ));
    assert_eq!(e.category, WrongProductionCategory::TerminalSymbolAsProductionBegin);
    assert_eq!(e.production_index, Some(1));

    let e = wrong(create(
        &[ProductionBuilder::new(
            S,
            vec![A.into(), ProductionElement::Mask(1)],
            0,
        )],
        1,
    ));
    assert_eq!(e.category, WrongProductionCategory::MaskNotFollowedNonTerminalSymbol);

    let e = wrong(create(&[ProductionBuilder::new(S, vec![ProductionElement::ItSelf], 0)], 1));
    assert_eq!(e.category, WrongProductionCategory::MaskNotFollowedNonTerminalSymbol);

    let e = wrong(create(&[ProductionBuilder::of_symbols(S, &[A, Symbol::EOF], 0)], 1));
    assert_eq!(e.category, WrongProductionCategory::ReservedSymbol);

    let e = wrong(create(
        &[
            ProductionBuilder::new(S, vec![NA.into(), ProductionElement::Mask(9)], 0),
            ProductionBuilder::of_symbols(NA, &[A], 1),
        ],
        1,
    ));
    assert_eq!(e.category, WrongProductionCategory::UndefinedMask);
    assert_eq!(e.production_index, Some(0));
}

#[test]
fn priority_declared_twice() {
    let productions = vec![
        ProductionBuilder::of_symbols(S, &[S, X, S], 0),
        ProductionBuilder::of_symbols(S, &[A], 0),
    ];
    let priorities = vec![OpePriority::left(&[X]), OpePriority::right(&[Y, X])];
    match Lrx::create(S, &productions, &priorities, 1) {
        Err(GrammarError::OpePriorityConflict(e)) => assert_eq!(
            e,
            OpePriorityConflict {
                symbol: X,
                first_level: 0,
                second_level: 1,
            }
        ),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("grammar was accepted"),
    }
}

#[test]
fn error_messages() {
    let e = illegal(create(&two_lookahead(), 1));
    let message = e.to_string();
    assert!(message.contains("SLRX(1)"), "{}", message);
    assert!(message.contains("MaxForwardDetectNotPassed"), "{}", message);
}

#[test]
fn juxtaposition() {
    // E := E E | a
    let productions = vec![
        ProductionBuilder::of_symbols(S, &[S, S], 0),
        ProductionBuilder::of_symbols(S, &[A], 1),
    ];
    let e = illegal(create(&productions, 0));
    assert_eq!(e.category, IllegalSlrxCategory::MaxForwardDetectNotPassed);
    assert!(e.lookahead.is_empty());
    assert_eq!(e.actions, vec![ConflictAction::Shift, ConflictAction::Reduce(0)]);

    // Restricting the right operand to `a` leaves a single way to group the input.
    let productions = vec![
        ProductionBuilder::new(S, vec![S.into(), S.into(), ProductionElement::Mask(1)], 0),
        ProductionBuilder::of_symbols(S, &[A], 1),
    ];
    let table = create(&productions, 1).unwrap();
    let mut processor = SymbolProcessor::new(&table);
    for index in 0..3 {
        processor.consume(A, index).unwrap();
    }
    processor.end_of_file().unwrap();
    // a, a, (a a), a, ((a a) a)
    let reduces: Vec<usize> = processor
        .steps()
        .iter()
        .filter_map(|step| match *step {
            slrx_runtime::ParsingStep::Reduce {
                production_index, ..
            } => Some(production_index),
            _ => None,
        })
        .collect();
    assert_eq!(reduces, vec![1, 1, 0, 1, 0]);
}
