//! Inventory ledger tests
//!
//! Tests for the append-only ledger including:
//! - Current stock equals sum of receipts minus sum of sales
//! - Sales never drive stock negative
//! - UNIT products only accept whole-number quantities

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test stock derivation from a handful of entries
    #[test]
    fn test_stock_derivation() {
        let entries = vec![
            ("stock", dec("50.0")),
            ("stock", dec("30.0")),
            ("sale", dec("20.0")),
            ("stock", dec("10.0")),
            ("sale", dec("15.0")),
        ];

        let stock: Decimal = entries.iter().fold(Decimal::ZERO, |acc, (kind, qty)| {
            if *kind == "stock" {
                acc + qty
            } else {
                acc - qty
            }
        });

        // 50 + 30 - 20 + 10 - 15 = 55
        assert_eq!(stock, dec("55.0"));
    }

    /// Receiving 150 then selling 10 leaves 140.000
    #[test]
    fn test_receipt_then_sale() {
        let stocked = dec("150");
        let sold = dec("10");
        let stock = (stocked - sold).round_dp(3);

        assert_eq!(stock, dec("140.000"));
        assert_eq!(stock, dec("140"));
    }

    /// Missed sales never change derived stock
    #[test]
    fn test_missed_sales_do_not_affect_stock() {
        let stocked = dec("40.0");
        let sold = dec("10.0");
        let missed = dec("100.0");

        let stock = stocked - sold;
        assert_eq!(stock, dec("30.0"));

        // Recording demand is informational only
        let _ = missed;
        assert_eq!(stocked - sold, dec("30.0"));
    }

    /// A product with no entries has zero stock
    #[test]
    fn test_empty_ledger_zero_stock() {
        let total_in = Decimal::ZERO;
        let total_out = Decimal::ZERO;
        assert_eq!(total_in - total_out, Decimal::ZERO);
    }

    /// Selling the entire stock leaves exactly zero
    #[test]
    fn test_sell_out_to_zero() {
        let stocked = dec("25.000");
        let sold = dec("25.000");
        assert_eq!(stocked - sold, Decimal::ZERO);
    }

    /// Insufficient-stock detection
    #[test]
    fn test_insufficient_stock_detection() {
        let current = dec("5.0");
        let requested = dec("6.0");

        assert!(current < requested);

        let exactly = dec("5.0");
        assert!(current >= exactly);
    }

    /// Quantities are recorded to 3 decimal places
    #[test]
    fn test_quantity_precision() {
        let quantity = dec("1.2345").round_dp(3);
        assert_eq!(quantity, dec("1.235"));

        let exact = dec("0.001");
        assert_eq!(exact.round_dp(3), dec("0.001"));
    }

    /// Whole-number requirement for UNIT products
    #[test]
    fn test_unit_quantity_must_be_whole() {
        assert!(dec("3").fract().is_zero());
        assert!(dec("3.000").fract().is_zero());
        assert!(!dec("3.001").fract().is_zero());
        assert!(!dec("0.5").fract().is_zero());
    }

    /// Fractional quantities are fine for weighed goods
    #[test]
    fn test_weight_volume_allows_fractions() {
        let quantities = [dec("0.250"), dec("1.5"), dec("12.345")];
        for q in quantities {
            assert!(q > Decimal::ZERO);
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating ledger quantities (positive, 3 dp)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 3)) // 0.001 to 1000.000
    }

    /// Strategy for generating whole UNIT quantities
    fn unit_quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=1000i64).prop_map(Decimal::from)
    }

    /// Strategy for generating entry kinds
    fn kind_strategy() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just("stock"), Just("sale")]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Current stock always equals total receipts minus total sales
        #[test]
        fn prop_stock_is_fold_over_ledger(
            entries in prop::collection::vec((kind_strategy(), quantity_strategy()), 1..30)
        ) {
            let mut total_in = Decimal::ZERO;
            let mut total_out = Decimal::ZERO;

            for (kind, qty) in &entries {
                if *kind == "stock" {
                    total_in += qty;
                } else {
                    total_out += qty;
                }
            }

            let folded: Decimal = entries.iter().fold(Decimal::ZERO, |acc, (kind, qty)| {
                if *kind == "stock" { acc + qty } else { acc - qty }
            });

            prop_assert_eq!(folded, total_in - total_out);
        }

        /// Entry order never changes the derived stock
        #[test]
        fn prop_stock_is_order_independent(
            entries in prop::collection::vec((kind_strategy(), quantity_strategy()), 1..20)
        ) {
            let forward: Decimal = entries.iter().fold(Decimal::ZERO, |acc, (kind, qty)| {
                if *kind == "stock" { acc + qty } else { acc - qty }
            });

            let reversed: Decimal = entries.iter().rev().fold(Decimal::ZERO, |acc, (kind, qty)| {
                if *kind == "stock" { acc + qty } else { acc - qty }
            });

            prop_assert_eq!(forward, reversed);
        }

        /// With the stock check enforced, the balance never goes negative
        #[test]
        fn prop_guarded_sales_never_go_negative(
            entries in prop::collection::vec((kind_strategy(), quantity_strategy()), 1..30)
        ) {
            let mut stock = Decimal::ZERO;

            for (kind, qty) in &entries {
                if *kind == "stock" {
                    stock += qty;
                } else if stock >= *qty {
                    // Sales below the available stock are accepted
                    stock -= qty;
                }
                // Rejected sales leave the ledger unchanged
                prop_assert!(stock >= Decimal::ZERO);
            }
        }

        /// Receipts accumulate regardless of grouping
        #[test]
        fn prop_receipts_accumulate(
            amounts in prop::collection::vec(quantity_strategy(), 1..20)
        ) {
            let total: Decimal = amounts.iter().sum();
            let folded: Decimal = amounts.iter().fold(Decimal::ZERO, |acc, x| acc + x);

            prop_assert_eq!(total, folded);
            prop_assert!(total > Decimal::ZERO);
        }

        /// Whole UNIT quantities survive the fractional check
        #[test]
        fn prop_unit_quantities_are_whole(qty in unit_quantity_strategy()) {
            prop_assert!(qty.fract().is_zero());
            prop_assert!(qty > Decimal::ZERO);
        }

        /// Selling everything stocked always lands on exactly zero
        #[test]
        fn prop_full_sellout_is_zero(
            amounts in prop::collection::vec(quantity_strategy(), 1..10)
        ) {
            let total: Decimal = amounts.iter().sum();
            let mut stock = total;

            for qty in &amounts {
                stock -= qty;
            }

            prop_assert_eq!(stock, Decimal::ZERO);
        }
    }
}

// ============================================================================
// Sale Admission Simulation
// ============================================================================

#[cfg(test)]
mod sale_admission {
    use super::*;

    /// Simulate the guarded sale path: check stock, then append
    pub fn try_sell(current_stock: Decimal, quantity: Decimal) -> Result<Decimal, &'static str> {
        if quantity <= Decimal::ZERO {
            return Err("Quantity must be positive");
        }
        if current_stock < quantity {
            return Err("Insufficient stock");
        }
        Ok(current_stock - quantity)
    }

    #[test]
    fn test_sale_within_stock() {
        let after = try_sell(dec("10.0"), dec("4.0")).unwrap();
        assert_eq!(after, dec("6.0"));
    }

    #[test]
    fn test_sale_of_exact_stock() {
        let after = try_sell(dec("10.0"), dec("10.0")).unwrap();
        assert_eq!(after, Decimal::ZERO);
    }

    #[test]
    fn test_sale_exceeding_stock_rejected() {
        assert!(try_sell(dec("10.0"), dec("10.001")).is_err());
        assert!(try_sell(Decimal::ZERO, dec("1.0")).is_err());
    }

    #[test]
    fn test_non_positive_sale_rejected() {
        assert!(try_sell(dec("10.0"), Decimal::ZERO).is_err());
        assert!(try_sell(dec("10.0"), dec("-1.0")).is_err());
    }

    /// Two concurrent sales that each pass a stale check would oversell;
    /// serialized admission admits only the first
    #[test]
    fn test_serialized_concurrent_sales() {
        let initial = dec("10.0");

        let after_first = try_sell(initial, dec("8.0")).unwrap();
        // Second sale sees the updated stock, not the stale snapshot
        let second = try_sell(after_first, dec("8.0"));

        assert!(second.is_err());
        assert_eq!(after_first, dec("2.0"));
    }
}
