// Evaluates an arithmetic expression given on the command line, e.g.
//
//     cargo run --example calc -- "1 + 2 * (3 - 4)"
//
// The grammar is compiled, serialized and read back through TableWrapper, the way an embedded
// table would be used.  Steps are replayed as soon as they settle.

use slrx::{Lrx, OpePriority, ProductionBuilder};
use slrx_runtime::{
    FnReducer, NonTerminalElement, ParsingStepProcessor, Symbol, SymbolProcessor,
    TerminalElement, TableWrapper,
};

const NUM: Symbol = Symbol::terminal(0);
const PLUS: Symbol = Symbol::terminal(1);
const MINUS: Symbol = Symbol::terminal(2);
const TIMES: Symbol = Symbol::terminal(3);
const DIVIDE: Symbol = Symbol::terminal(4);
const LPAREN: Symbol = Symbol::terminal(5);
const RPAREN: Symbol = Symbol::terminal(6);
const EXPR: Symbol = Symbol::non_terminal(0);

fn lex(text: &str) -> Result<Vec<(Symbol, i64)>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        let symbol = match c {
            c if c.is_whitespace() => continue,
            '+' => PLUS,
            '-' => MINUS,
            '*' => TIMES,
            '/' => DIVIDE,
            '(' => LPAREN,
            ')' => RPAREN,
            c if c.is_ascii_digit() => {
                let mut value = i64::from(c as u8 - b'0');
                while let Some(&(_, d)) = chars.peek() {
                    match d.to_digit(10) {
                        Some(digit) => value = value * 10 + i64::from(digit),
                        None => break,
                    }
                    chars.next();
                }
                tokens.push((NUM, value));
                continue;
            }
            _ => return Err(format!("unexpected character {:?} at {}", c, at)),
        };
        tokens.push((symbol, 0));
    }
    Ok(tokens)
}

fn main() {
    env_logger::builder().default_format_timestamp(false).init();

    let text: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let text = if text.is_empty() {
        "(42 + 24) / 2".to_string()
    } else {
        text
    };

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
    let lrx = match Lrx::create(EXPR, &productions, &priorities, 1) {
        Ok(lrx) => lrx,
        Err(e) => {
            eprintln!("grammar error: {}", e);
            std::process::exit(1);
        }
    };
    let table = match lrx.to_table::<u16>() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!("table: {} nodes, {} words", lrx.num_nodes(), table.len());
    let wrapper = match TableWrapper::new(table.words()) {
        Ok(wrapper) => wrapper,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let tokens = match lex(&text) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

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

    let mut processor = SymbolProcessor::new(&wrapper);
    let mut replay = ParsingStepProcessor::new();
    for (index, &(symbol, _)) in tokens.iter().enumerate() {
        if let Err(e) = processor.consume(symbol, index) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        if let Err(e) = replay.consume(&processor.clear_steps(), &mut reducer) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
    if let Err(e) = processor.end_of_file() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
    let result = replay
        .consume(&processor.clear_steps(), &mut reducer)
        .and_then(|()| replay.finish());
    match result {
        Ok(value) => println!("{} = {}", text, value),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
