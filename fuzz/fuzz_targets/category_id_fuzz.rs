//! Fuzz test for category id parsing
//!
//! Feeds arbitrary strings to `CategoryId::parse` and checks that accepted
//! ids keep their raw text and a consistent week number.
//!
//! Run with: cargo +nightly fuzz run category_id_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use quest_core::CategoryId;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    match CategoryId::parse(input) {
        Ok(id) => {
            assert_eq!(id.as_str(), input);
            if id.is_daily() {
                assert_eq!(id.week_number(), 0);
                assert!(id.previous_week().is_none());
            } else {
                assert!(id.week_number() >= 1, "week ids start at 1");
                assert_eq!(CategoryId::week(id.week_number()).ok(), Some(id.clone()));
                match id.previous_week() {
                    Some(previous) => {
                        assert_eq!(previous.week_number() + 1, id.week_number());
                    }
                    None => assert_eq!(id.week_number(), 1),
                }
            }
        }
        Err(err) => {
            assert!(!err.to_string().is_empty());
        }
    }
});
