//! Normalizes the author's productions.
//!
//! Every element of every production ends up with an optional list of acceptable productions:
//! when present, only those productions of the element's symbol may complete that slot.  This is
//! how both explicit markers and operator priorities reach the LR(0) construction.

use crate::errors::{GrammarError, OpePriorityConflict, WrongProduction, WrongProductionCategory};
use crate::grammar::{Associativity, OpePriority, ProductionBuilder, ProductionElement};
use crate::ramp_table::{RampTable, RampTableBuilder};
use crate::tvec::TVec;
use crate::Prod;
use log::debug;
use slrx_runtime::{Symbol, SymbolKind};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub symbol: Symbol,
    /// Sorted.  `None` accepts every production of `symbol`.
    pub acceptable: Option<Vec<Prod>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Production {
    pub head: Symbol,
    pub mask: usize,
    pub need_predict: bool,
    pub elements: Vec<Element>,
}

/// An LR(0) item: a production and the position of the dot in it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct SearchElement {
    pub production: Prod,
    pub element: usize,
}

impl SearchElement {
    pub fn new(production: Prod, element: usize) -> Self {
        Self {
            production,
            element,
        }
    }

    pub fn advance(self) -> Self {
        Self {
            production: self.production,
            element: self.element + 1,
        }
    }
}

pub struct ProductionInfo {
    pub productions: TVec<Prod, Production>,
    // Sorted list of the non-terminals that head at least one production.
    vars: Vec<Symbol>,
    // var index -> [Prod]
    derives: RampTable<Prod>,
}

fn wrong(category: WrongProductionCategory, index: usize) -> GrammarError {
    WrongProduction {
        category,
        production_index: Some(index),
    }
    .into()
}

// Priority level of an operator production, and its operand slots.
struct OperatorShape {
    level: Option<usize>,
    left_operand: bool,
    right_operand: bool,
}

impl ProductionInfo {
    pub fn new(
        start: Symbol,
        builders: &[ProductionBuilder],
        priorities: &[OpePriority],
    ) -> Result<Self, GrammarError> {
        if start.kind != SymbolKind::NonTerminal {
            return Err(WrongProduction {
                category: WrongProductionCategory::StartSymbolIsNotNonTerminal,
                production_index: None,
            }
            .into());
        }

        // Check the shape of each production, and split off the markers.  Markers stay attached
        // to the non-terminal element they follow.
        let mut bodies: Vec<Vec<(Symbol, Vec<ProductionElement>)>> = Vec::with_capacity(builders.len());
        for (i, builder) in builders.iter().enumerate() {
            match builder.head.kind {
                SymbolKind::NonTerminal => {}
                SymbolKind::Terminal => {
                    return Err(wrong(WrongProductionCategory::TerminalSymbolAsProductionBegin, i))
                }
                SymbolKind::Start | SymbolKind::EndOfFile => {
                    return Err(wrong(WrongProductionCategory::ReservedSymbol, i))
                }
            }
            let mut body: Vec<(Symbol, Vec<ProductionElement>)> = Vec::new();
            for &element in builder.elements.iter() {
                match element {
                    ProductionElement::Symbol(symbol) => {
                        if symbol.is_reserved() {
                            return Err(wrong(WrongProductionCategory::ReservedSymbol, i));
                        }
                        body.push((symbol, Vec::new()));
                    }
                    ProductionElement::ItSelf | ProductionElement::Mask(_) => match body.last_mut() {
                        Some((symbol, markers)) if symbol.kind == SymbolKind::NonTerminal => {
                            markers.push(element)
                        }
                        _ => {
                            return Err(wrong(
                                WrongProductionCategory::MaskNotFollowedNonTerminalSymbol,
                                i,
                            ))
                        }
                    },
                }
            }
            bodies.push(body);
        }

        let levels = priority_levels(priorities)?;

        let shapes: Vec<OperatorShape> = builders
            .iter()
            .zip(bodies.iter())
            .map(|(builder, body)| {
                let len = body.len();
                OperatorShape {
                    level: body.iter().find_map(|(symbol, _)| levels.get(symbol).copied()),
                    left_operand: len >= 2 && body[0].0 == builder.head,
                    right_operand: len >= 2 && body[len - 1].0 == builder.head,
                }
            })
            .collect();

        let mut productions: TVec<Prod, Production> = TVec::new();
        productions.push(Production {
            head: Symbol::START,
            mask: 0,
            need_predict: false,
            elements: vec![
                Element {
                    symbol: start,
                    acceptable: None,
                },
                Element {
                    symbol: Symbol::EOF,
                    acceptable: None,
                },
            ],
        });

        for (i, (builder, body)) in builders.iter().zip(bodies.iter()).enumerate() {
            let mut elements = Vec::with_capacity(body.len());
            for (position, (symbol, markers)) in body.iter().enumerate() {
                let acceptable = if !markers.is_empty() {
                    let mut set: BTreeSet<Prod> = BTreeSet::new();
                    for marker in markers.iter() {
                        let matched: Vec<Prod> = match *marker {
                            ProductionElement::ItSelf if *symbol == builder.head => {
                                vec![Prod::from_user(i)]
                            }
                            ProductionElement::Mask(mask) => builders
                                .iter()
                                .enumerate()
                                .filter(|(_, other)| other.head == *symbol && other.mask == mask)
                                .map(|(j, _)| Prod::from_user(j))
                                .collect(),
                            _ => Vec::new(),
                        };
                        if matched.is_empty() {
                            return Err(wrong(WrongProductionCategory::UndefinedMask, i));
                        }
                        set.extend(matched);
                    }
                    Some(set.into_iter().collect())
                } else {
                    operand_filter(i, position, body.len(), builder, priorities, &shapes, builders)
                };
                elements.push(Element {
                    symbol: *symbol,
                    acceptable,
                });
            }
            productions.push(Production {
                head: builder.head,
                mask: builder.mask,
                need_predict: builder.need_predict,
                elements,
            });
        }

        let mut vars: Vec<Symbol> = productions.iter().map(|p| p.head).collect();
        vars.sort();
        vars.dedup();

        let mut d = RampTableBuilder::<Prod>::with_capacity(vars.len(), productions.len());
        for &var in vars.iter() {
            d.start_key();
            for (index, production) in productions.iter().enumerate() {
                if production.head == var {
                    d.push_value(Prod::from(index));
                }
            }
        }

        let info = Self {
            productions,
            vars,
            derives: d.finish(),
        };
        info.print_productions();
        Ok(info)
    }

    pub fn production(&self, production: Prod) -> &Production {
        &self.productions[production]
    }

    pub fn num_productions(&self) -> usize {
        self.productions.len()
    }

    /// All productions whose head is `symbol`.
    pub fn derives(&self, symbol: Symbol) -> &[Prod] {
        match self.vars.binary_search(&symbol) {
            Ok(var) => self.derives.values(var),
            Err(_) => &[],
        }
    }

    /// The symbol after the dot, or `None` if the item is complete.
    pub fn next_symbol(&self, item: SearchElement) -> Option<Symbol> {
        self.productions[item.production]
            .elements
            .get(item.element)
            .map(|e| e.symbol)
    }

    pub fn is_complete(&self, item: SearchElement) -> bool {
        item.element >= self.productions[item.production].elements.len()
    }

    /// The productions allowed to complete one element.  `None` means unconstrained.
    pub fn acceptable_productions(&self, production: Prod, element: usize) -> Option<&[Prod]> {
        self.productions[production].elements[element]
            .acceptable
            .as_deref()
    }

    pub fn accepts(&self, production: Prod, element: usize, candidate: Prod) -> bool {
        match self.acceptable_productions(production, element) {
            None => true,
            Some(list) => list.binary_search(&candidate).is_ok(),
        }
    }

    /// Closes a set of items: for every item whose next symbol is a non-terminal, adds the
    /// initial item of each production of that symbol the item accepts.
    pub fn expand_search_elements(
        &self,
        seeds: impl IntoIterator<Item = SearchElement>,
    ) -> BTreeSet<SearchElement> {
        let mut items: BTreeSet<SearchElement> = BTreeSet::new();
        let mut work: Vec<SearchElement> = Vec::new();
        for seed in seeds {
            if items.insert(seed) {
                work.push(seed);
            }
        }
        while let Some(item) = work.pop() {
            let symbol = match self.next_symbol(item) {
                Some(symbol) if symbol.is_non_terminal() => symbol,
                _ => continue,
            };
            for &candidate in self.derives(symbol) {
                if self.accepts(item.production, item.element, candidate) {
                    let new_item = SearchElement::new(candidate, 0);
                    if items.insert(new_item) {
                        work.push(new_item);
                    }
                }
            }
        }
        items
    }

    pub fn production_to_str(&self, production: Prod) -> String {
        let p = &self.productions[production];
        let mut s = format!("(p{}) {} :=", production, p.head);
        for e in p.elements.iter() {
            s.push_str(&format!(" {}", e.symbol));
        }
        s
    }

    pub fn item_to_str(&self, item: SearchElement) -> String {
        let p = &self.productions[item.production];
        let mut s = format!("{} :=", p.head);
        for (i, e) in p.elements.iter().enumerate() {
            if i == item.element {
                s.push_str(" .");
            }
            s.push_str(&format!(" {}", e.symbol));
        }
        if item.element == p.elements.len() {
            s.push_str(" .");
        }
        s
    }

    fn print_productions(&self) {
        debug!("PRODUCTIONS:");
        for index in 0..self.num_productions() {
            let production = Prod::from(index);
            debug!("    {}", self.production_to_str(production));
            for (i, e) in self.productions[production].elements.iter().enumerate() {
                if let Some(list) = &e.acceptable {
                    debug!("        element {} accepts {:?}", i, list);
                }
            }
        }
    }
}

// Maps each operator terminal to its level.
fn priority_levels(priorities: &[OpePriority]) -> Result<BTreeMap<Symbol, usize>, GrammarError> {
    let mut levels: BTreeMap<Symbol, usize> = BTreeMap::new();
    for (level, priority) in priorities.iter().enumerate() {
        for &symbol in priority.symbols.iter() {
            if let Some(&first_level) = levels.get(&symbol) {
                if first_level != level {
                    return Err(OpePriorityConflict {
                        symbol,
                        first_level,
                        second_level: level,
                    }
                    .into());
                }
            }
            levels.insert(symbol, level);
        }
    }
    Ok(levels)
}

// The priority-derived filter for one element of production `index`, or None if the element
// is not an operand slot of an operator production.
fn operand_filter(
    index: usize,
    position: usize,
    len: usize,
    builder: &ProductionBuilder,
    priorities: &[OpePriority],
    shapes: &[OperatorShape],
    builders: &[ProductionBuilder],
) -> Option<Vec<Prod>> {
    let shape = &shapes[index];
    let level = shape.level?;
    let associativity = priorities[level].associativity;
    let is_left = shape.left_operand && position == 0;
    let is_right = shape.right_operand && position == len - 1;
    if !is_left && !is_right {
        return None;
    }

    let mut accepted: Vec<Prod> = Vec::new();
    let mut rejected_any = false;
    for (j, other) in builders.iter().enumerate() {
        if other.head != builder.head {
            continue;
        }
        let other_shape = &shapes[j];
        let rejected = match other_shape.level {
            None => false,
            Some(other_level) => {
                let left_reject = is_left
                    && other_shape.right_operand
                    && (other_level < level
                        || (other_level == level && associativity == Associativity::Right));
                let right_reject = is_right
                    && other_shape.left_operand
                    && (other_level < level
                        || (other_level == level && associativity == Associativity::Left));
                left_reject || right_reject
            }
        };
        if rejected {
            rejected_any = true;
        } else {
            accepted.push(Prod::from_user(j));
        }
    }
    if rejected_any {
        Some(accepted)
    } else {
        None
    }
}
