use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub type Balance = Decimal;

/// Full picture of the ledger at one transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub accounts: BTreeMap<String, Balance>,
    pub budget: BudgetNode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetNode {
    pub name: String,

    /// Funds held by this node alone, children excluded
    pub balance: Balance,

    /// Sibling names are unique
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BudgetNode>,
}

/// Difference between two states, holding only what changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub accounts: BTreeMap<String, Balance>,
    pub budget: Option<BudgetDelta>,
}

/// Mirrors the shape of a budget tree, pruned to the subtrees that changed.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetDelta {
    pub name: String,
    pub amount: Balance,
    pub children: Vec<BudgetDelta>,
}

impl State {
    /// Computes `self - earlier`. Accounts whose balance did not move are left out, an account
    /// missing on one side counts as zero there.
    pub fn subtract(&self, earlier: &State) -> Delta {
        let mut accounts = BTreeMap::new();

        for (name, balance) in &self.accounts {
            let before = earlier.accounts.get(name).copied().unwrap_or_default();
            let amount = *balance - before;
            if !amount.is_zero() {
                accounts.insert(name.clone(), amount);
            }
        }

        for (name, before) in &earlier.accounts {
            if !self.accounts.contains_key(name) && !before.is_zero() {
                accounts.insert(name.clone(), -*before);
            }
        }

        Delta {
            accounts,
            budget: BudgetDelta::between(Some(&self.budget), Some(&earlier.budget)),
        }
    }
}

impl BudgetNode {
    pub fn new(name: impl Into<String>, balance: Balance) -> Self {
        Self {
            name: name.into(),
            balance,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: BudgetNode) -> Self {
        self.children.push(child);
        self
    }

    /// First name that appears twice among the children of any node in this subtree.
    pub fn duplicate_name(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        for child in &self.children {
            if !seen.insert(child.name.as_str()) {
                return Some(&child.name);
            }
        }
        self.children.iter().find_map(BudgetNode::duplicate_name)
    }
}

impl BudgetDelta {
    /// Diffs two versions of the same budget node, either of which may be absent. Returns `None`
    /// when nothing in the subtree moved.
    fn between(later: Option<&BudgetNode>, earlier: Option<&BudgetNode>) -> Option<Self> {
        let name = later.or(earlier)?.name.clone();
        let amount = later.map(|node| node.balance).unwrap_or_default()
            - earlier.map(|node| node.balance).unwrap_or_default();

        let mut pairs: IndexMap<&str, (Option<&BudgetNode>, Option<&BudgetNode>)> =
            IndexMap::new();
        for child in later.into_iter().flat_map(|node| &node.children) {
            pairs.entry(child.name.as_str()).or_default().0 = Some(child);
        }
        for child in earlier.into_iter().flat_map(|node| &node.children) {
            pairs.entry(child.name.as_str()).or_default().1 = Some(child);
        }

        let children: Vec<BudgetDelta> = pairs
            .into_values()
            .filter_map(|(later, earlier)| Self::between(later, earlier))
            .collect();

        if amount.is_zero() && children.is_empty() {
            return None;
        }

        Some(Self {
            name,
            amount,
            children,
        })
    }

    /// Number of nodes in this subtree, itself included.
    pub(crate) fn len(&self) -> usize {
        1 + self.children.iter().map(BudgetDelta::len).sum::<usize>()
    }

    /// Pre-order walk yielding each node with its slash-joined path from the root. A `/` or `\`
    /// inside a name is escaped with a backslash.
    pub fn paths(&self) -> Vec<(String, Balance)> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<(String, Balance)>) {
        let name = self.name.replace('\\', "\\\\").replace('/', "\\/");
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };
        out.push((path.clone(), self.amount));
        for child in &self.children {
            child.collect_paths(&path, out);
        }
    }
}

impl Delta {
    /// Number of report rows this delta expands into.
    pub fn row_count(&self) -> usize {
        self.accounts.len() + self.budget.as_ref().map_or(0, BudgetDelta::len)
    }
}
