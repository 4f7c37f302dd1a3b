#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rangebuf::{BufError, Buffer, BufferOptions, ByteView, OutOfRange, RangeSet};

const RANGE_SLOTS: usize = 16;
const MAX_BYTES: usize = 1 << 12;

/// One thing a connection handler might do next.
#[derive(Debug, Arbitrary)]
enum Op {
    Append(Vec<u8>),
    Mark { start: u16, length: u16 },
    Consume(u16),
    Compact,
    CompactUnsynced,
    Reset,
    Clear,
}

/// Where the model believes a recorded range points.
#[derive(Debug)]
struct Marked {
    start: usize,
    length: usize,
    stale: bool,
}

fn run(ops: Vec<Op>) {
    let mut buffer = Buffer::with_options(BufferOptions {
        initial_capacity: 8,
        max_capacity: Some(MAX_BYTES),
        range_capacity: RANGE_SLOTS,
    });
    let mut ranges = RangeSet::with_capacity(RANGE_SLOTS);
    let mut model: Vec<u8> = Vec::new();
    let mut read = 0usize;
    let mut marked: Vec<Marked> = Vec::new();
    let mut lagging = false;

    for op in ops {
        match op {
            Op::Append(chunk) => match buffer.append(&chunk) {
                Ok(()) => model.extend_from_slice(&chunk),
                Err(BufError::LimitExceeded { .. }) => {
                    assert!(model.len() + chunk.len() > MAX_BYTES);
                }
                Err(other) => panic!("unexpected append error: {other}"),
            },
            Op::Mark { start, length } => {
                let (start, length) = (usize::from(start), usize::from(length));
                match ranges.append(start, length) {
                    Ok(_) => marked.push(Marked {
                        start,
                        length,
                        stale: lagging,
                    }),
                    Err(BufError::CapacityExceeded { capacity }) => {
                        assert_eq!(capacity, RANGE_SLOTS);
                        assert_eq!(marked.len(), RANGE_SLOTS);
                    }
                    Err(other) => panic!("unexpected mark error: {other}"),
                }
            }
            Op::Consume(n) => {
                let to = read + usize::from(n);
                if buffer.consume_up_to(to).is_ok() {
                    assert!(to <= model.len());
                    read = to;
                } else {
                    assert!(to > model.len());
                }
            }
            Op::Compact => {
                let compaction = buffer.compact_with(&mut ranges);
                assert_eq!(compaction.discarded, read);
                for mark in marked.iter_mut().filter(|mark| !mark.stale) {
                    if mark.start >= read {
                        mark.start -= read;
                    } else {
                        mark.stale = true;
                    }
                }
                if !compaction.is_noop() {
                    lagging = false;
                }
                model.drain(..read);
                read = 0;
            }
            Op::CompactUnsynced => {
                let compaction = buffer.compact();
                assert_eq!(compaction.discarded, read);
                if !compaction.is_noop() {
                    // Nothing renormalized the set, so everything it recorded
                    // or records from now on is stale until it is rebound.
                    for mark in &mut marked {
                        mark.stale = true;
                    }
                    lagging = true;
                }
                model.drain(..read);
                read = 0;
            }
            Op::Reset => {
                ranges.reset();
                marked.clear();
            }
            Op::Clear => {
                buffer.clear();
                ranges.rebind(&buffer);
                lagging = false;
                model.clear();
                read = 0;
                marked.clear();
            }
        }

        assert_eq!(buffer.as_slice(), model.as_slice());
        assert_eq!(buffer.read_position(), read);
        assert_eq!(buffer.remaining(), model.len() - read);
        assert_eq!(ranges.len(), marked.len());

        for (range, mark) in ranges.iter().zip(&marked) {
            let expected = (!mark.stale).then(|| model.get(mark.start..mark.start + mark.length));
            match (expected, range.bytes(&buffer)) {
                (None, Err(BufError::OutOfRange(OutOfRange::Stale { .. }))) => {}
                (Some(None), Err(BufError::OutOfRange(OutOfRange::Bounds { .. }))) => {}
                (Some(Some(want)), Ok(got)) => {
                    assert_eq!(range.start(), mark.start);
                    assert_eq!(want, got);
                }
                (expected, actual) => {
                    panic!("model expected {expected:?}, range read {actual:?} ({mark:?})")
                }
            }
        }
    }
}

fuzz_target!(|ops: Vec<Op>| run(ops));
