//! Property tests for tier pricing, join planning and invite codes

use chrono::{Duration, Utc};
use proptest::prelude::*;
use proptest::test_runner::Config;
use uuid::Uuid;

use FarmPool::config::GroupBuyConfig;
use FarmPool::models::{CreateGroupBuyRequest, GroupBuy, GroupStatus};
use FarmPool::services::{
    compute_tier_price, generate_invite_code, is_valid_invite_code, normalize_invite_code, plan_join, progress_percent,
};

fn forming_group(current_quantity: i32, target_quantity: i32, unit_price: f64) -> GroupBuy {
    let mut group = GroupBuy::new(
        CreateGroupBuyRequest {
            product_id: Uuid::new_v4(),
            initiator_id: Uuid::new_v4(),
            target_quantity,
            base_price: unit_price,
            deadline: Utc::now() + Duration::days(1),
            delivery_method: "farm pickup".to_string(),
            region: None,
        },
        "PROP01".to_string(),
    );
    group.current_quantity = current_quantity;
    group
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn tier_price_is_whole_cents(cents in 0_u32..1_000_000, quantity in 0_i32..10_000) {
        let price = compute_tier_price(cents as f64 / 100.0, quantity);
        let scaled = price * 100.0;
        prop_assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    #[test]
    fn tier_price_never_exceeds_base(cents in 0_u32..1_000_000, quantity in 0_i32..10_000) {
        let base = cents as f64 / 100.0;
        prop_assert!(compute_tier_price(base, quantity) <= base);
    }

    #[test]
    fn tier_price_does_not_rise_with_quantity(
        cents in 0_u32..1_000_000,
        quantity in 0_i32..10_000,
        extra in 0_i32..100,
    ) {
        let base = cents as f64 / 100.0;
        prop_assert!(compute_tier_price(base, quantity + extra) <= compute_tier_price(base, quantity));
    }

    #[test]
    fn below_first_tier_keeps_base_price(cents in 0_u32..1_000_000, quantity in 0_i32..5) {
        let base = cents as f64 / 100.0;
        prop_assert_eq!(compute_tier_price(base, quantity), base);
    }

    #[test]
    fn join_plan_activates_exactly_at_target(
        current in 0_i32..500,
        quantity in 1_i32..500,
        target in 2_i32..1_000,
    ) {
        let group = forming_group(current, target, 10.0);
        let plan = plan_join(&group, quantity, &GroupBuyConfig::default(), Utc::now()).unwrap();

        prop_assert_eq!(plan.new_quantity, current + quantity);
        let expected = if current + quantity >= target { GroupStatus::Active } else { GroupStatus::Forming };
        prop_assert_eq!(plan.new_status, expected);
        prop_assert_eq!(plan.new_price, compute_tier_price(10.0, current + quantity));
    }

    #[test]
    fn progress_is_capped(current in 0_i32..10_000, target in 1_i32..1_000) {
        let percent = progress_percent(current, target);
        prop_assert!(percent <= 100);
        prop_assert_eq!(percent == 100, current >= target);
    }

    #[test]
    fn typed_codes_normalize_to_valid_form(code in "[a-zA-Z0-9]{6}", padding in " {0,3}") {
        let typed = format!("{padding}{code}{padding}");
        prop_assert!(is_valid_invite_code(&normalize_invite_code(&typed)));
    }

    #[test]
    fn malformed_codes_are_rejected(code in "[A-Z0-9]{0,5}|[A-Z0-9]{7,10}|[A-Z0-9]{0,5}[^A-Z0-9][A-Z0-9]{0,5}") {
        prop_assert!(!is_valid_invite_code(&code));
    }
}

#[test]
fn generated_codes_are_always_valid() {
    for _ in 0..5_000 {
        assert!(is_valid_invite_code(&generate_invite_code()));
    }
}
