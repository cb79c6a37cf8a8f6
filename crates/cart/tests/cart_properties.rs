//! Randomized mutation sequences against the cart invariants.
//!
//! After every step:
//! - every line satisfies `1 <= quantity <= stock_ceiling`
//! - `item_count` equals an independently recomputed sum of quantities
//! - `total` equals an independently recomputed sum of line subtotals

// The generated catalog is single-currency, so adds cannot fail.
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rust_decimal::Decimal;

use clementine_cart::{Cart, ProductRecord};
use clementine_core::{CurrencyCode, Price, ProductId};

/// A small catalog keeps collisions (re-adds, updates of existing lines)
/// frequent enough to matter.
const CATALOG_SIZE: i32 = 8;

#[derive(Debug, Clone)]
enum Op {
    Add { product: i32, quantity: u32 },
    Remove { product: i32 },
    SetQuantity { product: i32, quantity: u32 },
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1..=CATALOG_SIZE, 0u32..20).prop_map(|(product, quantity)| Op::Add {
            product,
            quantity,
        }),
        2 => (1..=CATALOG_SIZE).prop_map(|product| Op::Remove { product }),
        3 => (1..=CATALOG_SIZE, 0u32..20).prop_map(|(product, quantity)| Op::SetQuantity {
            product,
            quantity,
        }),
        1 => Just(Op::Clear),
    ]
}

fn catalog_product(id: i32) -> ProductRecord {
    // Deterministic per-id price and ceiling; ceilings include 0 so the
    // out-of-stock edge is exercised.
    let id_u32 = u32::try_from(id).unwrap_or(1);
    ProductRecord {
        id: ProductId::new(id),
        display_name: format!("Product {id}"),
        unit_price: Price::from_minor_units(i64::from(id) * 125, CurrencyCode::USD),
        stock_ceiling: (id_u32 * 3) % 7,
        image_url: None,
        category: None,
    }
}

fn assert_invariants(cart: &Cart) {
    let mut expected_count: u32 = 0;
    let mut expected_total = Decimal::ZERO;

    for item in cart.items() {
        assert!(
            item.quantity() >= 1,
            "line {} has quantity {} < 1",
            item.product_id,
            item.quantity()
        );
        assert!(
            item.quantity() <= item.stock_ceiling,
            "line {} has quantity {} above ceiling {}",
            item.product_id,
            item.quantity(),
            item.stock_ceiling
        );
        expected_count += item.quantity();
        expected_total += item.unit_price.amount * Decimal::from(item.quantity());
    }

    assert_eq!(cart.item_count(), expected_count);
    assert_eq!(cart.total(), expected_total);
    assert_eq!(cart.totals().item_count, expected_count);
    assert_eq!(cart.totals().total, expected_total);
}

proptest! {
    #[test]
    fn prop_invariants_hold_across_mutation_sequences(
        ops in proptest::collection::vec(op_strategy(), 0..64)
    ) {
        let mut cart = Cart::new();

        for op in ops {
            match op {
                Op::Add { product, quantity } => {
                    let record = catalog_product(product);
                    let applied = cart.add_item(&record, quantity).unwrap();
                    // A clamped outcome still lands inside the bounds.
                    prop_assert!(applied.quantity <= record.stock_ceiling);
                }
                Op::Remove { product } => {
                    cart.remove_item(ProductId::new(product));
                }
                Op::SetQuantity { product, quantity } => {
                    // ProductNotFound is an expected outcome for ids the
                    // sequence never added; it must not disturb the cart.
                    let _ = cart.set_quantity(ProductId::new(product), quantity);
                }
                Op::Clear => cart.clear(),
            }
            assert_invariants(&cart);
        }
    }

    #[test]
    fn prop_remove_is_idempotent(product in 1..=CATALOG_SIZE, quantity in 1u32..10) {
        let mut cart = Cart::new();
        cart.add_item(&catalog_product(product), quantity).unwrap();

        cart.remove_item(ProductId::new(product));
        let after_once = cart.items().to_vec();
        let removed_again = cart.remove_item(ProductId::new(product));

        prop_assert!(!removed_again);
        prop_assert_eq!(cart.items(), after_once.as_slice());
        assert_invariants(&cart);
    }

    #[test]
    fn prop_set_zero_matches_remove(product in 1..=CATALOG_SIZE, quantity in 1u32..10) {
        let record = catalog_product(product);

        let mut via_set = Cart::new();
        via_set.add_item(&record, quantity).unwrap();
        let _ = via_set.set_quantity(record.id, 0);

        let mut via_remove = Cart::new();
        via_remove.add_item(&record, quantity).unwrap();
        via_remove.remove_item(record.id);

        prop_assert_eq!(via_set.items(), via_remove.items());
        prop_assert_eq!(via_set.item_count(), via_remove.item_count());
    }
}
