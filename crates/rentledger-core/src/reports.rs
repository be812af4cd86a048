//! Report structures for API responses

use rentledger_period::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::models::TaxSummary;

/// Totals over the stored summaries of one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualReport {
    pub year: i32,
    pub currency: String,
    /// Months that have a summary, latest first
    pub months: Vec<Month>,
    pub total_revenue: Decimal,
    pub total_utilities: Decimal,
    pub net_income: Decimal,
    pub tax_amount: Decimal,
}

impl AnnualReport {
    /// Sum the summaries belonging to `year`; sums are checked like the monthly ones
    pub fn from_summaries(year: i32, currency: &str, summaries: &[TaxSummary]) -> CoreResult<Self> {
        let overflow = || CoreError::ArithmeticOverflow {
            operation: format!("annual totals for {}", year),
        };
        let mut report = AnnualReport {
            year,
            currency: currency.to_string(),
            months: Vec::with_capacity(summaries.len()),
            total_revenue: Decimal::ZERO,
            total_utilities: Decimal::ZERO,
            net_income: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
        };
        for summary in summaries.iter().filter(|s| s.period.year == year) {
            let figures = &summary.figures;
            report.months.push(summary.period.month);
            report.total_revenue = report.total_revenue.checked_add(figures.total_revenue).ok_or_else(overflow)?;
            report.total_utilities = report
                .total_utilities
                .checked_add(figures.total_utilities)
                .ok_or_else(overflow)?;
            report.net_income = report.net_income.checked_add(figures.net_income).ok_or_else(overflow)?;
            report.tax_amount = report.tax_amount.checked_add(figures.tax_amount).ok_or_else(overflow)?;
        }
        Ok(report)
    }
}

/// Summaries list response for API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummariesResponse {
    pub year: i32,
    pub currency: String,
    pub summaries: Vec<TaxSummary>,
    pub total_count: usize,
}
