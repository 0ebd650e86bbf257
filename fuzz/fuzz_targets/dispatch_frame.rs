#![no_main]

use std::sync::{Arc, OnceLock};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mqbroker::{BrokerState, Dispatcher};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    frames: Vec<Vec<u8>>,
    max_len: u16,
}

fn dispatcher() -> &'static Dispatcher {
    static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();
    DISPATCHER.get_or_init(|| Dispatcher::new(Arc::new(BrokerState::new())))
}

fuzz_target!(|input: FuzzInput| {
    let dispatcher = dispatcher();
    for frame in &input.frames {
        let _ = dispatcher.handle_frame(frame, usize::from(input.max_len));
    }

    // Подписка и её очередь существуют только вместе.
    let stats = dispatcher.state().stats();
    assert_eq!(stats.subscriptions, stats.queues);
});
