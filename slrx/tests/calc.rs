use slrx::{Lrx, OpePriority, ProductionBuilder};
use slrx_runtime::{
    process_steps, FnReducer, NonTerminalElement, ParseTable, ParsingStep, StepError, Symbol,
    SymbolProcessor, TerminalElement,
};

const NUM: Symbol = Symbol::terminal(0);
const PLUS: Symbol = Symbol::terminal(1);
const MINUS: Symbol = Symbol::terminal(2);
const TIMES: Symbol = Symbol::terminal(3);
const DIVIDE: Symbol = Symbol::terminal(4);
const LPAREN: Symbol = Symbol::terminal(5);
const RPAREN: Symbol = Symbol::terminal(6);
const EXPR: Symbol = Symbol::non_terminal(0);

fn calculator() -> Lrx {
    let productions = vec![
        ProductionBuilder::of_symbols(EXPR, &[EXPR, PLUS, EXPR], 0),
        ProductionBuilder::of_symbols(EXPR, &[EXPR, MINUS, EXPR], 0),
        ProductionBuilder::of_symbols(EXPR, &[EXPR, TIMES, EXPR], 0),
        ProductionBuilder::of_symbols(EXPR, &[EXPR, DIVIDE, EXPR], 0),
        ProductionBuilder::of_symbols(EXPR, &[LPAREN, EXPR, RPAREN], 0),
        ProductionBuilder::of_symbols(EXPR, &[NUM], 0),
    ];
    let priorities = vec![
        OpePriority::left(&[PLUS, MINUS]),
        OpePriority::left(&[TIMES, DIVIDE]),
    ];
    Lrx::create(EXPR, &productions, &priorities, 1).unwrap()
}

fn lex(text: &str) -> Vec<(Symbol, i64)> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let symbol = match c {
            ' ' => continue,
            '+' => PLUS,
            '-' => MINUS,
            '*' => TIMES,
            '/' => DIVIDE,
            '(' => LPAREN,
            ')' => RPAREN,
            '0'..='9' => {
                let mut value = c as i64 - '0' as i64;
                while let Some(&d) = chars.peek() {
                    match d.to_digit(10) {
                        Some(digit) => value = value * 10 + digit as i64,
                        None => break,
                    }
                    chars.next();
                }
                tokens.push((NUM, value));
                continue;
            }
            _ => panic!("unexpected character {:?}", c),
        };
        tokens.push((symbol, 0));
    }
    tokens
}

fn parse<T: ParseTable>(table: &T, tokens: &[(Symbol, i64)]) -> Vec<ParsingStep> {
    let mut processor = SymbolProcessor::new(table);
    for (index, &(symbol, _)) in tokens.iter().enumerate() {
        if let Err(e) = processor.consume(symbol, index) {
            panic!("{}", e);
        }
    }
    processor.end_of_file().unwrap();
    assert!(processor.is_accepted());
    processor.into_steps()
}

fn evaluate(text: &str) -> Result<i64, StepError<String>> {
    let tokens = lex(text);
    let steps = parse(&calculator(), &tokens);
    let mut reducer = FnReducer::new(
        |t: TerminalElement| -> Result<i64, String> { Ok(tokens[t.token_index].1) },
        |n: NonTerminalElement<i64>| {
            let c: Vec<i64> = n.children.iter().map(|e| e.value).collect();
            match n.production_index {
                0 => Ok(c[0] + c[2]),
                1 => Ok(c[0] - c[2]),
                2 => Ok(c[0] * c[2]),
                3 if c[2] == 0 => Err(format!("division by zero at token {}", n.tokens.start)),
                3 => Ok(c[0] / c[2]),
                4 => Ok(c[1]),
                _ => Ok(c[0]),
            }
        },
    );
    process_steps(&steps, &mut reducer)
}

#[test]
fn arithmetic() {
    assert_eq!(evaluate("1+2*3-4/(1+1)"), Ok(5));
    assert_eq!(evaluate("42"), Ok(42));
    assert_eq!(evaluate("(((7)))"), Ok(7));
    assert_eq!(evaluate("2*(3+4)*5"), Ok(70));
}

#[test]
fn left_associativity() {
    assert_eq!(evaluate("10-3+2"), Ok(9));
    assert_eq!(evaluate("100/10/5"), Ok(2));
    assert_eq!(evaluate("1-1-1"), Ok(-1));
}

#[test]
fn reducer_errors_propagate() {
    assert_eq!(
        evaluate("1/(2-2)"),
        Err(StepError::Reducer("division by zero at token 0".to_string()))
    );
}

#[test]
fn step_sequence() {
    let tokens = lex("1+2");
    let steps = parse(&calculator(), &tokens);
    let kinds: Vec<(bool, Symbol)> = steps.iter().map(|s| (s.is_shift(), s.symbol())).collect();
    assert_eq!(
        kinds,
        vec![
            (true, NUM),
            (false, EXPR),
            (true, PLUS),
            (true, NUM),
            (false, EXPR),
            (false, EXPR),
        ]
    );
    match steps[5] {
        ParsingStep::Reduce {
            production_index,
            element_count,
            ..
        } => {
            assert_eq!(production_index, 0);
            assert_eq!(element_count, 3);
        }
        other => panic!("expected a reduce, got {:?}", other),
    }
}

#[test]
fn suggestions() {
    let table = calculator();
    let mut processor = SymbolProcessor::new(&table);
    assert_eq!(processor.expected_symbols(), vec![NUM, LPAREN]);

    processor.consume(NUM, 0).unwrap();
    assert_eq!(
        processor.expected_symbols(),
        vec![PLUS, MINUS, TIMES, DIVIDE, Symbol::EOF]
    );

    processor.consume(PLUS, 1).unwrap();
    assert_eq!(processor.expected_symbols(), vec![NUM, LPAREN]);

    processor.consume(NUM, 2).unwrap();
    // `)` is in the reduce's lookahead set, but nothing here could shift it.
    assert_eq!(
        processor.expected_symbols(),
        vec![PLUS, MINUS, TIMES, DIVIDE, Symbol::EOF]
    );

    let err = processor.consume(RPAREN, 3).unwrap_err();
    assert_eq!(err.symbol, RPAREN);
    assert_eq!(err.token_index, 3);
    assert_eq!(err.suggestions, vec![PLUS, MINUS, TIMES, DIVIDE, Symbol::EOF]);

    // The rejected symbol left no trace.
    processor.consume(TIMES, 3).unwrap();
    processor.consume(NUM, 4).unwrap();
    processor.end_of_file().unwrap();
    assert_eq!(processor.steps().len(), 10);
}

#[test]
fn premature_end_of_file() {
    let table = calculator();
    let mut processor = SymbolProcessor::new(&table);
    processor.consume(LPAREN, 0).unwrap();
    processor.consume(NUM, 1).unwrap();
    let err = processor.end_of_file().unwrap_err();
    assert_eq!(err.symbol, Symbol::EOF);
    assert_eq!(err.token_index, 2);
    assert!(err.suggestions.contains(&RPAREN));
    assert!(!processor.is_accepted());
}

#[test]
fn clear_restarts() {
    let table = calculator();
    let mut processor = SymbolProcessor::new(&table);
    processor.consume(NUM, 0).unwrap();
    processor.consume(PLUS, 1).unwrap();
    processor.clear();
    assert!(processor.steps().is_empty());
    assert_eq!(processor.expected_symbols(), vec![NUM, LPAREN]);
    processor.consume(NUM, 0).unwrap();
    processor.end_of_file().unwrap();
    assert_eq!(processor.steps().len(), 2);
}

#[test]
fn reset_replays_identically() {
    let table = calculator();
    let tokens = lex("(1+2)*3-4");
    let fresh = parse(&table, &tokens);

    let mut processor = SymbolProcessor::new(&table);
    processor.consume(NUM, 0).unwrap();
    processor.consume(TIMES, 1).unwrap();
    processor.clear();
    for (index, &(symbol, _)) in tokens.iter().enumerate() {
        processor.consume(symbol, index).unwrap();
    }
    processor.end_of_file().unwrap();
    assert_eq!(processor.steps(), &fresh[..]);
}

#[test]
fn shared_table() {
    let table = calculator();
    let mut first = SymbolProcessor::new(&table);
    let mut second = SymbolProcessor::new(&table);
    first.consume(NUM, 0).unwrap();
    second.consume(LPAREN, 0).unwrap();
    first.end_of_file().unwrap();
    assert!(second.end_of_file().is_err());
}
