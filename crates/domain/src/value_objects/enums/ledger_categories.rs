use std::fmt::Display;

/// Only income rows are written by this service.
pub const INCOME_KIND: &str = "income";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCategory {
    Subscription,
    Promotion,
}

impl LedgerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerCategory::Subscription => "subscription",
            LedgerCategory::Promotion => "promotion",
        }
    }
}

impl Display for LedgerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
