//! Per-pass resource budget.
//!
//! Unmarshalling is a plain recursive descent, so a hostile document can nest
//! deep enough to exhaust the stack, or fan out into millions of nodes and
//! back-references. The enforcer here is consulted on every node the
//! context converts and stops the pass as soon as a limit is crossed.

use serde::{Deserialize, Serialize};

/// Limits checked while converting one document.
///
/// Example: parse with a tighter depth limit.
///
/// ```rust
/// use graph_unmarshal::{Mapper, Options};
///
/// let options = graph_unmarshal::options! {
///     budget: Some(graph_unmarshal::budget! {
///         max_depth: 16,
///     }),
/// };
///
/// let mapper = Mapper::with_options(options);
/// let value = mapper.from_str("<int>42</int>").unwrap().unwrap();
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Budget {
    /// Maximum nesting depth of converted nodes.
    ///
    /// Default: 200
    pub max_depth: usize,
    /// Maximum number of nodes converted in one pass (references included).
    ///
    /// Default: 1,000,000
    pub max_nodes: usize,
    /// Maximum number of back-references resolved in one pass.
    ///
    /// Default: 250,000
    pub max_references: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_depth: 200,        // several stack frames per level
            max_nodes: 1_000_000,  // plenty for normal documents
            max_references: 250_000,
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetBreach {
    /// Nesting exceeded [`Budget::max_depth`].
    Depth {
        /// Depth reached when the breach occurred.
        depth: usize,
    },
    /// Converted nodes exceeded [`Budget::max_nodes`].
    Nodes {
        /// Nodes seen at the moment of the breach.
        nodes: usize,
    },
    /// Resolved references exceeded [`Budget::max_references`].
    References {
        /// References resolved at the moment of the breach.
        references: usize,
    },
}

/// Counters of one pass (even if no breach).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BudgetReport {
    /// Total nodes converted.
    pub nodes: usize,
    /// Total back-references resolved.
    pub references: usize,
    /// Deepest nesting reached.
    pub max_depth: usize,
}

/// Stateful helper that enforces a [`Budget`] during one pass.
///
/// Without a budget only the report is maintained.
#[derive(Debug)]
pub(crate) struct BudgetEnforcer {
    budget: Option<Budget>,
    report: BudgetReport,
    depth: usize,
}

impl BudgetEnforcer {
    pub(crate) fn new(budget: Option<Budget>) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
        }
    }

    /// Called when a node starts converting.
    pub(crate) fn enter(&mut self) -> Result<(), BudgetBreach> {
        self.depth += 1;
        self.report.nodes += 1;
        if self.depth > self.report.max_depth {
            self.report.max_depth = self.depth;
        }
        if let Some(budget) = &self.budget {
            if self.depth > budget.max_depth {
                return Err(BudgetBreach::Depth { depth: self.depth });
            }
            if self.report.nodes > budget.max_nodes {
                return Err(BudgetBreach::Nodes {
                    nodes: self.report.nodes,
                });
            }
        }
        Ok(())
    }

    /// Called when a node finished converting, successfully or not.
    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn observe_reference(&mut self) -> Result<(), BudgetBreach> {
        self.report.references += 1;
        match &self.budget {
            Some(budget) if self.report.references > budget.max_references => {
                Err(BudgetBreach::References {
                    references: self.report.references,
                })
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn report(&self) -> &BudgetReport {
        &self.report
    }
}
