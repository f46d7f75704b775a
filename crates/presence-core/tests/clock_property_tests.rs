//! Property-based tests for civil time normalisation

use presence_core::{days_in_month, CivilTime, Clock, Timestamp};
use proptest::prelude::*;

fn arb_civil() -> impl Strategy<Value = CivilTime> {
    (2020u16..=2050, 1u8..=12, 0u8..=23, 0u8..=59, 0u8..=59)
        .prop_flat_map(|(year, month, hour, minute, second)| {
            (1u8..=days_in_month(year, month)).prop_map(move |day| CivilTime {
                year,
                month,
                day,
                hour,
                minute,
                second,
            })
        })
}

proptest! {
    /// Property: updates with less than a second elapsed never change the clock
    #[test]
    fn sub_second_updates_are_idempotent(
        civil in arb_civil(),
        anchor in 0u64..1_000_000,
        offsets in prop::collection::vec(0u64..1_000, 1..10),
    ) {
        let mut clock = Clock::new(Timestamp::new(anchor));
        clock.set(civil, Timestamp::new(anchor));
        for offset in offsets {
            clock.update(Timestamp::new(anchor + offset));
            prop_assert_eq!(clock.civil(), civil);
            prop_assert_eq!(clock.last_update(), Timestamp::new(anchor));
        }
    }

    /// Property: advancing always yields a valid calendar time
    #[test]
    fn advance_stays_normalised(civil in arb_civil(), seconds in 0u64..400_000_000) {
        let mut advanced = civil;
        advanced.advance_seconds(seconds);
        prop_assert!(advanced.month >= 1 && advanced.month <= 12);
        prop_assert!(advanced.day >= 1 && advanced.day <= days_in_month(advanced.year, advanced.month));
        prop_assert!(advanced.hour < 24 && advanced.minute < 60 && advanced.second < 60);
        prop_assert!(advanced >= civil);
    }

    /// Property: advancing in two steps equals advancing once
    #[test]
    fn advance_is_additive(civil in arb_civil(), a in 0u64..10_000_000, b in 0u64..10_000_000) {
        let mut stepwise = civil;
        stepwise.advance_seconds(a);
        stepwise.advance_seconds(b);
        let mut once = civil;
        once.advance_seconds(a + b);
        prop_assert_eq!(stepwise, once);
    }

    /// Property: formatted times parse back when in range
    #[test]
    fn display_parses_back(civil in arb_civil()) {
        prop_assert_eq!(civil.to_string().parse::<CivilTime>(), Ok(civil));
    }
}
