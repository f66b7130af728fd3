//! Payment processing seam.

use std::sync::Arc;

use async_trait::async_trait;
use catalog::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Paypal => "paypal",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Proof of a successful charge.
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    pub transaction_id: String,
}

/// A declined charge. Checkout maps this to its compensation path.
#[derive(Debug, Error)]
#[error("payment declined: {reason}")]
pub struct PaymentDeclined {
    pub reason: String,
}

/// Charges a payment method.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn charge(
        &self,
        method: PaymentMethod,
        amount: Money,
    ) -> Result<ChargeReceipt, PaymentDeclined>;
}

#[derive(Default)]
struct ProcessorState {
    charge_count: u64,
    fail_on_charge: bool,
}

/// In-memory payment processor for development and tests.
///
/// Issues sequential transaction IDs (`TXN-0001`, ...) and can be toggled
/// to decline every charge.
#[derive(Clone, Default)]
pub struct InMemoryPaymentProcessor {
    state: Arc<RwLock<ProcessorState>>,
}

impl InMemoryPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every subsequent charge is declined.
    pub async fn set_fail_on_charge(&self, fail: bool) {
        let mut state = self.state.write().await;
        state.fail_on_charge = fail;
    }

    pub async fn charge_count(&self) -> u64 {
        let state = self.state.read().await;
        state.charge_count
    }
}

#[async_trait]
impl PaymentProcessor for InMemoryPaymentProcessor {
    async fn charge(
        &self,
        method: PaymentMethod,
        amount: Money,
    ) -> Result<ChargeReceipt, PaymentDeclined> {
        let mut state = self.state.write().await;
        state.charge_count += 1;

        if state.fail_on_charge {
            metrics::counter!("payments_declined_total").increment(1);
            return Err(PaymentDeclined {
                reason: "card declined".to_string(),
            });
        }

        let transaction_id = format!("TXN-{:04}", state.charge_count);
        metrics::counter!("payments_charged_total").increment(1);
        info!(%method, %amount, transaction_id, "Payment charged");
        Ok(ChargeReceipt { transaction_id })
    }
}
