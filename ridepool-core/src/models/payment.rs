use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    #[default]
    NotRequired,
    Optional,
    Obligatory,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Mobile,
    Other,
}

/// What a driver asks passengers to chip in. Amounts are minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PaymentPolicy {
    pub mode: PaymentMode,
    pub amount: Option<i64>,
    pub method: Option<PaymentMethod>,
}

impl PaymentPolicy {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn is_free(&self) -> bool {
        self.mode == PaymentMode::NotRequired
    }

    pub fn requires_method(&self) -> bool {
        self.mode == PaymentMode::Obligatory
    }
}
