//! Simulated portfolio balances.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::TradeError;

/// Quantities held per asset. Every balance is kept non-negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Portfolio {
    balances: BTreeMap<String, Decimal>,
}

impl Portfolio {
    /// Create a portfolio from a seed allocation. Negative seeds are clamped to zero.
    pub fn new<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        let balances = seed
            .into_iter()
            .map(|(asset, qty)| (asset.into(), qty.max(Decimal::ZERO)))
            .collect();
        Self { balances }
    }

    /// Held quantity of an asset (zero if never held).
    pub fn balance(&self, asset: &str) -> Decimal {
        self.balances.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// All balances, ordered by asset code.
    pub fn balances(&self) -> &BTreeMap<String, Decimal> {
        &self.balances
    }

    /// Add to an asset's balance.
    pub fn credit(&mut self, asset: &str, amount: Decimal) -> Result<(), TradeError> {
        if amount < Decimal::ZERO {
            return Err(TradeError::NegativeAmount {
                asset: asset.to_string(),
                amount,
            });
        }
        let total = self
            .balance(asset)
            .checked_add(amount)
            .ok_or_else(|| TradeError::Overflow(asset.to_string()))?;
        self.balances.insert(asset.to_string(), total);
        Ok(())
    }

    /// Subtract from an asset's balance, refusing to go below zero.
    pub fn debit(&mut self, asset: &str, amount: Decimal) -> Result<(), TradeError> {
        if amount < Decimal::ZERO {
            return Err(TradeError::NegativeAmount {
                asset: asset.to_string(),
                amount,
            });
        }
        let available = self.balance(asset);
        if amount > available {
            return Err(TradeError::InsufficientBalance {
                asset: asset.to_string(),
                required: amount,
                available,
            });
        }
        self.balances.insert(asset.to_string(), available - amount);
        Ok(())
    }

    /// Zero out an asset and return what was held.
    pub fn take_all(&mut self, asset: &str) -> Decimal {
        let held = self.balance(asset);
        self.balances.insert(asset.to_string(), Decimal::ZERO);
        held
    }
}
