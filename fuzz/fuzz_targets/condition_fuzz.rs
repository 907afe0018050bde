//! Fuzz test for eligibility condition parsing
//!
//! Run with: cargo +nightly fuzz run condition_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use quest_core::Condition;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let condition = Condition::parse(input);
    match &condition {
        Condition::Any => {
            assert!(condition.matches::<&str>(&[]));
        }
        Condition::OneOf(values) | Condition::AllOf(values) => {
            assert!(!values.is_empty());
            // A condition always matches the exact values it was built from.
            assert!(condition.matches(values));
        }
    }

    // Parsing is stable under surrounding whitespace.
    assert_eq!(Condition::parse(&format!("  {}  ", input)), condition);
});
