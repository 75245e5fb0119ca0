//! Fuzz target: `SerialLink` inbound path
//!
//! Treats the input as a script of peer writes and connection changes,
//! then drains the queue line by line. The link must never panic, never
//! hold more than its capacity, and must account for every byte either
//! as accepted or dropped.
//!
//! cargo fuzz run fuzz_link_writes

#![no_main]

use bleserial::app::endpoints::Endpoint;
use bleserial::app::ports::{ConnectionObserver, DataSink};
use bleserial::link::SerialLink;
use libfuzzer_sys::fuzz_target;

const CAP: usize = 32;

fuzz_target!(|data: &[u8]| {
    let link = SerialLink::<CAP>::new();
    let mut offered = 0usize;

    // First byte of each chunk is an opcode; the low bits size the write.
    let mut rest = data;
    while let Some((&op, tail)) = rest.split_first() {
        let len = (op as usize & 0x1F).min(tail.len());
        let (payload, tail) = tail.split_at(len);
        match op >> 5 {
            0 => link.on_attach(),
            1 => link.on_detach(),
            2 => {
                let _ = link.queue().read_line(b'\n');
            }
            3 => link.queue().flush(),
            _ => {
                link.on_bytes(Endpoint::DataIn, payload);
                offered += payload.len();
            }
        }
        assert!(link.queue().len() <= CAP);
        rest = tail;
    }

    let accepted = link.queue().accepted() as usize;
    let dropped = link.queue().dropped() as usize;
    assert_eq!(accepted + dropped, offered, "every byte is accounted for");

    while !link.queue().is_empty() {
        let line = link.queue().read_line(b'\n');
        assert!(line.len() <= CAP);
    }
});
