//! Spending totals for a period.
//!
//! Nothing here touches the database: the summary is a pure function of the
//! user's transactions, categories and the selected period.

use crate::{
    category::Category,
    dashboard::period::Period,
    html::percent_used,
    transaction::{Transaction, TransactionKind},
};

/// How much was spent in one category during a period.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary<'a> {
    pub category: &'a Category,
    /// The sum of the category's expenses in the period.
    pub spent: i64,
    /// The category's monthly budget scaled to the period.
    pub budget: i64,
}

impl CategorySummary<'_> {
    /// Whether more than the budget has been spent. A budget of zero is never exceeded.
    pub fn is_over_budget(&self) -> bool {
        self.budget > 0 && self.spent > self.budget
    }

    /// Percentage of the budget used, clamped to the range 0..=100.
    pub fn percent_used(&self) -> f64 {
        percent_used(self.spent, self.budget)
    }
}

/// Totals for a period across all categories.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary<'a> {
    /// The sum of every expense in the period, including those in deleted categories.
    pub total_spent: i64,
    /// The sum of the category budgets scaled to the period.
    pub total_budget: i64,
    /// `total_budget - total_spent`, negative when over budget.
    pub remaining: i64,
    /// One entry per category, in category order.
    pub categories: Vec<CategorySummary<'a>>,
}

impl PeriodSummary<'_> {
    /// Whether more than the total budget has been spent.
    pub fn is_over_budget(&self) -> bool {
        self.total_budget > 0 && self.total_spent > self.total_budget
    }
}

/// Total the expenses in `period` overall and per category.
///
/// Income is ignored. Budgets are monthly, so they are multiplied by twelve for yearly periods.
pub fn summarize<'a>(
    transactions: &[Transaction],
    categories: &'a [Category],
    period: Period,
) -> PeriodSummary<'a> {
    let expenses: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| {
            transaction.kind == TransactionKind::Expense && period.contains(transaction.date)
        })
        .collect();

    let multiplier = period.budget_multiplier();

    let categories: Vec<CategorySummary> = categories
        .iter()
        .map(|category| CategorySummary {
            category,
            spent: expenses
                .iter()
                .filter(|transaction| transaction.category_id == category.id)
                .fold(0, |total: i64, transaction| {
                    total.saturating_add(transaction.amount)
                }),
            budget: category.budget.saturating_mul(multiplier),
        })
        .collect();

    let total_spent = expenses
        .iter()
        .fold(0, |total: i64, transaction| total.saturating_add(transaction.amount));
    let total_budget = categories
        .iter()
        .fold(0, |total: i64, summary| total.saturating_add(summary.budget));

    PeriodSummary {
        total_spent,
        total_budget,
        remaining: total_budget.saturating_sub(total_spent),
        categories,
    }
}
