//! Basic enumerations for payments and expenses

use serde::{Deserialize, Serialize};

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Scheduled, nothing received
    #[default]
    Unpaid,
    /// Payment announced but not confirmed
    Pending,
    /// Received; counts as revenue
    Paid,
    /// Past due date without payment
    Overdue,
}

impl PaymentStatus {
    pub fn is_paid(self) -> bool {
        self == PaymentStatus::Paid
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "unpaid"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Overdue => write!(f, "overdue"),
        }
    }
}

/// Summary column an expense is booked into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseBucket {
    Electricity,
    Water,
    Gas,
    Maintenance,
    Other,
}

impl ExpenseBucket {
    /// Bucket for a free-form expense category.
    ///
    /// The generic "utilities" category is booked as electricity; it predates
    /// the per-utility categories and existing summaries depend on it.
    pub fn from_category(category: &str) -> Self {
        match category.trim().to_lowercase().as_str() {
            "utilities" | "electricity" => ExpenseBucket::Electricity,
            "water" => ExpenseBucket::Water,
            "gas" => ExpenseBucket::Gas,
            "maintenance" => ExpenseBucket::Maintenance,
            _ => ExpenseBucket::Other,
        }
    }
}

impl std::fmt::Display for ExpenseBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseBucket::Electricity => write!(f, "electricity"),
            ExpenseBucket::Water => write!(f, "water"),
            ExpenseBucket::Gas => write!(f, "gas"),
            ExpenseBucket::Maintenance => write!(f, "maintenance"),
            ExpenseBucket::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_from_str() {
        assert_eq!("paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!("Overdue".parse::<PaymentStatus>().unwrap(), PaymentStatus::Overdue);
        assert!("refunded".parse::<PaymentStatus>().is_err());
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_bucket_from_category() {
        assert_eq!(ExpenseBucket::from_category("utilities"), ExpenseBucket::Electricity);
        assert_eq!(ExpenseBucket::from_category(" Utilities "), ExpenseBucket::Electricity);
        assert_eq!(ExpenseBucket::from_category("water"), ExpenseBucket::Water);
        assert_eq!(ExpenseBucket::from_category("GAS"), ExpenseBucket::Gas);
        assert_eq!(ExpenseBucket::from_category("maintenance"), ExpenseBucket::Maintenance);
        assert_eq!(ExpenseBucket::from_category("insurance"), ExpenseBucket::Other);
        assert_eq!(ExpenseBucket::from_category(""), ExpenseBucket::Other);
    }
}
