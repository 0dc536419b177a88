//! Tiered group pricing
//!
//! Flat quantity breakpoints turn accumulated group quantity into a discount
//! multiplier on the unit price. Everything here is pure.

use serde::{Deserialize, Serialize};

/// A quantity breakpoint and the multiplier it unlocks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub min_quantity: i32,
    pub multiplier: f64,
}

impl PriceTier {
    pub fn discount_percent(&self) -> u8 {
        ((1.0 - self.multiplier) * 100.0).round() as u8
    }
}

/// Breakpoints, highest threshold first. First match wins.
pub const PRICE_TIERS: [PriceTier; 3] = [
    PriceTier { min_quantity: 20, multiplier: 0.80 },
    PriceTier { min_quantity: 10, multiplier: 0.90 },
    PriceTier { min_quantity: 5, multiplier: 0.95 },
];

/// Multiplier applied at the given accumulated quantity
pub fn discount_for_quantity(accumulated_quantity: i32) -> f64 {
    PRICE_TIERS
        .iter()
        .find(|tier| accumulated_quantity >= tier.min_quantity)
        .map_or(1.0, |tier| tier.multiplier)
}

/// Effective unit price for a group holding `accumulated_quantity` units
///
/// Rounded to cents. Negative or non-finite prices are passed through unchecked.
pub fn compute_tier_price(base_unit_price: f64, accumulated_quantity: i32) -> f64 {
    round_to_cents(base_unit_price * discount_for_quantity(accumulated_quantity))
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The next breakpoint a group has not reached yet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NextTier {
    pub min_quantity: i32,
    pub quantity_needed: i32,
    pub discount_percent: u8,
}

pub fn next_tier(current_quantity: i32) -> Option<NextTier> {
    PRICE_TIERS
        .iter()
        .rev()
        .find(|tier| tier.min_quantity > current_quantity)
        .map(|tier| NextTier {
            min_quantity: tier.min_quantity,
            quantity_needed: tier.min_quantity - current_quantity,
            discount_percent: tier.discount_percent(),
        })
}

/// Percentage of the target already committed, capped at 100
pub fn progress_percent(current_quantity: i32, target_quantity: i32) -> u8 {
    if target_quantity <= 0 {
        return 0;
    }
    let percent = (current_quantity.max(0) as i64 * 100) / target_quantity as i64;
    percent.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(compute_tier_price(10.0, 0), 10.00);
        assert_eq!(compute_tier_price(10.0, 4), 10.00);
        assert_eq!(compute_tier_price(10.0, 5), 9.50);
        assert_eq!(compute_tier_price(10.0, 9), 9.50);
        assert_eq!(compute_tier_price(10.0, 10), 9.00);
        assert_eq!(compute_tier_price(10.0, 19), 9.00);
        assert_eq!(compute_tier_price(10.0, 20), 8.00);
        assert_eq!(compute_tier_price(10.0, 500), 8.00);
    }

    #[test]
    fn test_rounds_half_up_to_cents() {
        // 3.33 * 0.95 = 3.1635
        assert_eq!(compute_tier_price(3.33, 5), 3.16);
        // 2.5 * 0.95 = 2.375
        assert_eq!(compute_tier_price(2.5, 5), 2.38);
        assert_eq!(compute_tier_price(0.0, 20), 0.0);
    }

    #[test]
    fn test_next_tier() {
        assert_eq!(
            next_tier(0),
            Some(NextTier { min_quantity: 5, quantity_needed: 5, discount_percent: 5 })
        );
        assert_eq!(
            next_tier(5),
            Some(NextTier { min_quantity: 10, quantity_needed: 5, discount_percent: 10 })
        );
        assert_eq!(
            next_tier(19),
            Some(NextTier { min_quantity: 20, quantity_needed: 1, discount_percent: 20 })
        );
        assert_eq!(next_tier(20), None);
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 10), 0);
        assert_eq!(progress_percent(3, 10), 30);
        assert_eq!(progress_percent(2, 3), 66);
        assert_eq!(progress_percent(15, 10), 100);
        assert_eq!(progress_percent(5, 0), 0);
    }
}
