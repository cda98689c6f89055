//! Grouping and totalling liabilities by debtor.
//!
//! Debtors have no identity beyond the exact, case-sensitive name string, so
//! "Juan" and "juan" are two groups and two different people typed as "Juan"
//! are one.

use crate::liability::Liability;
use crate::types::Peso;

/// Sum of the amounts that are still owed.
#[must_use]
pub fn outstanding_total<'a, I>(items: I) -> Peso
where
    I: IntoIterator<Item = &'a Liability>,
{
    items
        .into_iter()
        .filter(|item| item.is_outstanding())
        .map(|item| item.amount)
        .sum()
}

/// Sum of the amounts already settled.
#[must_use]
pub fn paid_total<'a, I>(items: I) -> Peso
where
    I: IntoIterator<Item = &'a Liability>,
{
    items
        .into_iter()
        .filter(|item| !item.is_outstanding())
        .map(|item| item.amount)
        .sum()
}

/// All liabilities recorded under one debtor name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebtorGroup {
    pub debtor: String,
    /// In fetch order.
    pub items: Vec<Liability>,
}

impl DebtorGroup {
    #[must_use]
    pub fn outstanding_total(&self) -> Peso {
        outstanding_total(&self.items)
    }

    #[must_use]
    pub fn paid_total(&self) -> Peso {
        paid_total(&self.items)
    }

    /// True once every item in the group has been paid.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.items.iter().all(|item| !item.is_outstanding())
    }
}

/// Liabilities partitioned by debtor, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebtorGroups(Vec<DebtorGroup>);

impl DebtorGroups {
    /// Look up a group by exact debtor name.
    #[must_use]
    pub fn get(&self, debtor: &str) -> Option<&DebtorGroup> {
        self.0.iter().find(|group| group.debtor == debtor)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DebtorGroup> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outstanding balance across every debtor.
    #[must_use]
    pub fn outstanding_total(&self) -> Peso {
        self.0.iter().map(DebtorGroup::outstanding_total).sum()
    }
}

impl IntoIterator for DebtorGroups {
    type Item = DebtorGroup;
    type IntoIter = std::vec::IntoIter<DebtorGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DebtorGroups {
    type Item = &'a DebtorGroup;
    type IntoIter = std::slice::Iter<'a, DebtorGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Partition `liabilities` by debtor name.
///
/// Every input item lands in exactly one group, and each group keeps its
/// items in input order.
#[must_use]
pub fn group_by_debtor(liabilities: Vec<Liability>) -> DebtorGroups {
    let mut groups: Vec<DebtorGroup> = Vec::new();
    for item in liabilities {
        match groups.iter_mut().find(|g| g.debtor == item.debtor_name) {
            Some(group) => group.items.push(item),
            None => groups.push(DebtorGroup {
                debtor: item.debtor_name.clone(),
                items: vec![item],
            }),
        }
    }
    DebtorGroups(groups)
}

/// Keep liabilities whose debtor name contains `query`, ignoring case.
///
/// A blank query keeps everything.
#[must_use]
pub fn filter_by_debtor(liabilities: Vec<Liability>, query: &str) -> Vec<Liability> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return liabilities;
    }
    liabilities
        .into_iter()
        .filter(|item| item.debtor_name.to_lowercase().contains(&needle))
        .collect()
}
