//! Isolated MPMC throughput run for nexus-closable - for perf profiling
//!
//! Run: cargo build --release --bench perf_closable
//! Profile: sudo perf stat -e cycles,instructions,cache-misses \
//!          taskset -c 0,2,4,6 ./target/release/deps/perf_closable-*

use std::thread;

use nexus_closable::ClosableQueue;

const PRODUCERS: u64 = 2;
const CONSUMERS: usize = 2;
const PER_PRODUCER: u64 = 2_000_000;
const CAPACITY: usize = 1024;

/// 256-byte message to keep the copy cost realistic
#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct Message {
    sequence: u64,
    _payload: [u8; 248],
}

impl Message {
    fn new(sequence: u64) -> Self {
        Self {
            sequence,
            _payload: [0u8; 248],
        }
    }
}

fn main() {
    let queue = ClosableQueue::<Message>::new(CAPACITY);

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = queue.clone();
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.write(Message::new(p * PER_PRODUCER + i)).unwrap();
                }
            })
        })
        .collect();

    // Consumers run until close, draining whatever is left
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = queue.clone();
            thread::spawn(move || {
                let mut received = 0u64;
                let mut sum = 0u64;
                for msg in &queue {
                    sum = sum.wrapping_add(msg.sequence);
                    received += 1;
                }
                (received, sum)
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    queue.close();

    let (received, sum) = consumers
        .into_iter()
        .map(|c| c.join().unwrap())
        .fold((0u64, 0u64), |(r, s), (cr, cs)| (r + cr, s.wrapping_add(cs)));

    let total = PRODUCERS * PER_PRODUCER;
    assert_eq!(received, total);
    assert_eq!(sum, total * (total - 1) / 2);
}
