//! Properties of the impulse protocol over arbitrary relay layouts.

use pi_relays::Behavior;
use pi_relays::Level;
use pi_relays::Relay;
use pi_relays::RelayBoard;
use pi_relays::SimulatedGpio;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

fn level() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::High), Just(Level::Low)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every trigger writes the inverted level followed by the resting level,
    /// and leaves the pin resting.
    #[test]
    fn impulse_writes_opposite_then_resting(
        pin in 0u32..54,
        resting in level(),
        millis in 1u64..4,
        triggers in 1usize..4,
    ) {
        let gpio = Arc::new(SimulatedGpio::default());
        let mut board = RelayBoard::with_interface(gpio.clone());
        let relay = Relay::new("r", "Relay", pin)
            .unwrap()
            .with_resting_level(resting)
            .with_behavior(Behavior::Impulse { duration: Duration::from_millis(millis) })
            .unwrap();
        board.add_relay(relay);
        board.init().unwrap();

        for _ in 0..triggers {
            board.trigger_relay("r").unwrap();
        }

        let expected: Vec<Level> = (0..triggers)
            .flat_map(|_| [resting.inverted(), resting])
            .collect();
        prop_assert_eq!(gpio.outputs_on(pin), expected);
        prop_assert_eq!(gpio.level(pin), Some(resting));
    }

    /// The registry holds one relay per distinct id, in first-seen order.
    #[test]
    fn registry_keeps_one_relay_per_id(
        ids in proptest::collection::vec("[a-d]", 1..12),
    ) {
        let mut board = RelayBoard::with_interface(Arc::new(SimulatedGpio::default()));
        for (pin, id) in ids.iter().enumerate() {
            board.add_relay(Relay::new(id.as_str(), id.as_str(), pin as u32).unwrap());
        }

        let mut seen = BTreeSet::new();
        let first_seen: Vec<&str> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .map(String::as_str)
            .collect();
        let registered: Vec<&str> = board.relays().map(|r| r.id()).collect();
        prop_assert_eq!(registered, first_seen);

        for id in &ids {
            let last_pin = ids.iter().rposition(|other| other == id).unwrap() as u32;
            prop_assert_eq!(board.relay(id).map(|r| r.pin()), Some(last_pin));
        }
    }
}
