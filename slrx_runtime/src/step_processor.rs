//! Replays a step list against a user reducer.

use crate::errors::StepError;
use crate::table::ParsingStep;
use crate::Symbol;
use core::marker::PhantomData;
use core::ops::Range;

/// A shifted terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TerminalElement {
    pub symbol: Symbol,
    pub token_index: usize,
}

/// A completed element on the replay stack: a terminal or a reduced non-terminal, together with
/// the value the reducer produced for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Element<V> {
    pub symbol: Symbol,
    /// The tokens covered by this element.  Empty for an element that derived nothing.
    pub tokens: Range<usize>,
    pub value: V,
}

/// A reduced production, handed to [`Reducer::non_terminal`].
#[derive(Clone, Debug, PartialEq)]
pub struct NonTerminalElement<V> {
    pub symbol: Symbol,
    pub mask: usize,
    pub production_index: usize,
    pub tokens: Range<usize>,
    pub children: Vec<Element<V>>,
}

/// Announces that a production declared with `need_predict` starts here.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PredictElement {
    pub symbol: Symbol,
    pub mask: usize,
    pub production_index: usize,
    /// The first token of the production, unless it derives nothing.
    pub token_index: usize,
}

/// Builds application values out of parsing steps.
pub trait Reducer {
    type Value;
    type Error;

    fn terminal(&mut self, element: TerminalElement) -> Result<Self::Value, Self::Error>;

    fn non_terminal(
        &mut self,
        element: NonTerminalElement<Self::Value>,
    ) -> Result<Self::Value, Self::Error>;

    fn predict(&mut self, _element: PredictElement) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// A [`Reducer`] made of two closures.
pub struct FnReducer<V, E, T, N> {
    terminal: T,
    non_terminal: N,
    _marker: PhantomData<fn() -> (V, E)>,
}

impl<V, E, T, N> FnReducer<V, E, T, N>
where
    T: FnMut(TerminalElement) -> Result<V, E>,
    N: FnMut(NonTerminalElement<V>) -> Result<V, E>,
{
    pub fn new(terminal: T, non_terminal: N) -> Self {
        FnReducer {
            terminal,
            non_terminal,
            _marker: PhantomData,
        }
    }
}

impl<V, E, T, N> Reducer for FnReducer<V, E, T, N>
where
    T: FnMut(TerminalElement) -> Result<V, E>,
    N: FnMut(NonTerminalElement<V>) -> Result<V, E>,
{
    type Value = V;
    type Error = E;

    fn terminal(&mut self, element: TerminalElement) -> Result<V, E> {
        (self.terminal)(element)
    }

    fn non_terminal(&mut self, element: NonTerminalElement<V>) -> Result<V, E> {
        (self.non_terminal)(element)
    }
}

/// Keeps the stack of completed elements between batches of steps, so a caller can feed the
/// output of `SymbolProcessor::clear_steps` as it becomes available.
#[derive(Debug)]
pub struct ParsingStepProcessor<V> {
    stack: Vec<Element<V>>,
    next_token: usize,
}

impl<V> Default for ParsingStepProcessor<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ParsingStepProcessor<V> {
    pub fn new() -> Self {
        ParsingStepProcessor {
            stack: Vec::new(),
            next_token: 0,
        }
    }

    pub fn stack(&self) -> &[Element<V>] {
        &self.stack
    }

    pub fn consume<R>(&mut self, steps: &[ParsingStep], reducer: &mut R) -> Result<(), StepError<R::Error>>
    where
        R: Reducer<Value = V>,
    {
        for step in steps.iter() {
            match *step {
                ParsingStep::Shift {
                    symbol,
                    token_index,
                    ..
                } => {
                    let value = reducer
                        .terminal(TerminalElement {
                            symbol,
                            token_index,
                        })
                        .map_err(StepError::Reducer)?;
                    let end = token_index.saturating_add(1);
                    self.next_token = end;
                    self.stack.push(Element {
                        symbol,
                        tokens: token_index..end,
                        value,
                    });
                }
                ParsingStep::Reduce {
                    symbol,
                    mask,
                    production_index,
                    element_count,
                    ..
                } => {
                    let available = self.stack.len();
                    if available < element_count {
                        return Err(StepError::StackUnderflow {
                            production_index,
                            needed: element_count,
                            available,
                        });
                    }
                    let children = self.stack.split_off(available - element_count);
                    let tokens = match (children.first(), children.last()) {
                        (Some(first), Some(last)) => first.tokens.start..last.tokens.end,
                        _ => self.next_token..self.next_token,
                    };
                    let value = reducer
                        .non_terminal(NonTerminalElement {
                            symbol,
                            mask,
                            production_index,
                            tokens: tokens.clone(),
                            children,
                        })
                        .map_err(StepError::Reducer)?;
                    self.stack.push(Element {
                        symbol,
                        tokens,
                        value,
                    });
                }
                ParsingStep::Predict {
                    symbol,
                    mask,
                    production_index,
                } => {
                    reducer
                        .predict(PredictElement {
                            symbol,
                            mask,
                            production_index,
                            token_index: self.next_token,
                        })
                        .map_err(StepError::Reducer)?;
                }
            }
        }
        Ok(())
    }

    /// Ends the replay.  Exactly one element must remain; its value is the parse result.
    pub fn finish<E>(mut self) -> Result<V, StepError<E>> {
        if self.stack.len() != 1 {
            return Err(StepError::Unfinished {
                remaining: self.stack.len(),
            });
        }
        match self.stack.pop() {
            Some(element) => Ok(element.value),
            None => Err(StepError::Unfinished { remaining: 0 }),
        }
    }
}

/// Replays a complete step list and returns the value of the start symbol.
pub fn process_steps<R: Reducer>(
    steps: &[ParsingStep],
    reducer: &mut R,
) -> Result<R::Value, StepError<R::Error>> {
    let mut processor = ParsingStepProcessor::new();
    processor.consume(steps, reducer)?;
    processor.finish()
}
