//! Unit price lookup.

use std::collections::HashMap;

use capsim_core::{BillingMode, Direction, PricingConfig, StorageClass};

use crate::error::{IngestError, IngestResult};

/// Source of per-unit prices.
///
/// Provisioned prices are per unit-hour; on-demand prices are per
/// request unit.
pub trait PriceLookup {
    fn cost_per_unit(
        &self,
        region: &str,
        direction: Direction,
        billing_mode: BillingMode,
        storage_class: StorageClass,
    ) -> IngestResult<f64>;
}

type RateKey = (Direction, BillingMode, StorageClass);

/// Prices for a single region, typically loaded from `[pricing]` in
/// capsim.toml. A table without a region answers for any region.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    region: Option<String>,
    rates: HashMap<RateKey, f64>,
}

impl PriceTable {
    pub fn new(region: Option<String>) -> Self {
        Self {
            region,
            rates: HashMap::new(),
        }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        let mut table = Self::new(config.region.clone());
        for rate in &config.rates {
            table.insert(rate.direction, rate.billing_mode, rate.storage_class, rate.price);
        }
        table
    }

    pub fn insert(
        &mut self,
        direction: Direction,
        billing_mode: BillingMode,
        storage_class: StorageClass,
        price: f64,
    ) {
        self.rates.insert((direction, billing_mode, storage_class), price);
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

impl PriceLookup for PriceTable {
    fn cost_per_unit(
        &self,
        region: &str,
        direction: Direction,
        billing_mode: BillingMode,
        storage_class: StorageClass,
    ) -> IngestResult<f64> {
        let region_matches = self.region.as_deref().is_none_or(|r| r == region);
        region_matches
            .then(|| self.rates.get(&(direction, billing_mode, storage_class)).copied())
            .flatten()
            .ok_or_else(|| IngestError::PriceNotFound {
                region: region.to_string(),
                direction,
                billing_mode,
                storage_class,
            })
    }
}
