/*!
 * Ring Tests
 * Bulk/burst semantics, capacity accounting and validation
 */

use corepool::{Ring, RingError, RingFlags};
use pretty_assertions::assert_eq;

fn spsc<T: Copy>(name: &str, size: u32) -> Ring<T> {
    // Single-threaded test: one producer and one consumer by construction
    unsafe { Ring::with_flags(name, size, -1, RingFlags::SP_ENQ | RingFlags::SC_DEQ) }.unwrap()
}

#[test]
fn test_capacity_four_scenario() {
    let ring = spsc::<char>("scenario", 4);
    assert!(ring.is_single_producer());
    assert!(ring.is_single_consumer());

    assert_eq!(ring.enqueue_bulk(&['A', 'B', 'C']).unwrap(), 3);
    assert_eq!(ring.count(), 3);

    let mut out = ['-'; 4];
    assert_eq!(
        ring.dequeue_bulk(&mut out),
        Err(RingError::NoEntries {
            requested: 4,
            available: 3
        })
    );
    assert_eq!(ring.count(), 3);

    assert_eq!(ring.dequeue_burst(&mut out), 3);
    assert_eq!(&out[..3], &['A', 'B', 'C']);
    assert_eq!(ring.count(), 0);

    assert_eq!(ring.enqueue_bulk(&['D', 'E']).unwrap(), 2);
    assert_eq!(ring.count(), 2);
}

#[test]
fn test_bulk_enqueue_is_all_or_nothing() {
    let ring = Ring::<u32>::new("bulk", 8, -1).unwrap();
    ring.enqueue_bulk(&[1, 2, 3, 4, 5]).unwrap();
    let before = ring.info();

    assert_eq!(
        ring.enqueue_bulk(&[6, 7, 8, 9]),
        Err(RingError::NoSpace {
            requested: 4,
            available: 3
        })
    );
    assert_eq!(ring.info(), before);

    // Probe: exactly the free slots are still usable
    assert_eq!(ring.enqueue_bulk(&[6, 7, 8]).unwrap(), 3);
    assert!(ring.is_full());
}

#[test]
fn test_bulk_dequeue_is_all_or_nothing() {
    let ring = Ring::<u32>::new("bulk_deq", 8, -1).unwrap();
    ring.enqueue_bulk(&[1, 2]).unwrap();
    let before = ring.info();

    let mut out = [0u32; 3];
    assert!(ring.dequeue_bulk(&mut out).unwrap_err().is_capacity());
    assert_eq!(ring.info(), before);
    assert_eq!(out, [0, 0, 0]);

    let mut two = [0u32; 2];
    assert_eq!(ring.dequeue_bulk(&mut two).unwrap(), 2);
    assert_eq!(two, [1, 2]);
}

#[test]
fn test_burst_clamps_to_available() {
    let ring = Ring::<u32>::new("burst", 4, -1).unwrap();
    assert_eq!(ring.enqueue_burst(&[1, 2, 3, 4, 5, 6]), 4);
    assert_eq!(ring.enqueue_burst(&[7]), 0);

    let mut out = [0u32; 6];
    assert_eq!(ring.dequeue_burst(&mut out), 4);
    assert_eq!(&out[..4], &[1, 2, 3, 4]);
    assert_eq!(ring.dequeue_burst(&mut out), 0);
}

#[test]
fn test_size_equals_usable_slots() {
    for size in [1u32, 2, 16, 1024] {
        let ring = Ring::<u64>::new("usable", size, -1).unwrap();
        let values: Vec<u64> = (0..size as u64).collect();
        assert_eq!(ring.enqueue_bulk(&values).unwrap(), size as usize);
        assert_eq!(ring.capacity(), size);
        assert_eq!(ring.free_count(), 0);
        assert!(ring.enqueue(0).is_err());
    }
}

#[test]
fn test_many_laps_keep_fifo() {
    let ring = Ring::<u64>::new("laps", 8, -1).unwrap();
    let mut next_in = 0u64;
    let mut next_out = 0u64;
    let mut out = [0u64; 5];

    for round in 0..1000 {
        let batch: Vec<u64> = (next_in..next_in + 1 + round % 5).collect();
        next_in += ring.enqueue_burst(&batch) as u64;

        let got = ring.dequeue_burst(&mut out[..1 + (round as usize % 4)]);
        for value in &out[..got] {
            assert_eq!(*value, next_out);
            next_out += 1;
        }
    }
    assert_eq!(ring.count() as u64, next_in - next_out);
}

#[test]
fn test_creation_validation() {
    assert_eq!(
        Ring::<u64>::new("npot", 12, -1).unwrap_err(),
        RingError::InvalidSize(12)
    );
    assert!(matches!(
        Ring::<u64>::new("this_ring_name_is_longer_than_31_bytes", 8, -1),
        Err(RingError::NameTooLong(_))
    ));

    let ring = Ring::<u64>::new("meta", 32, 2).unwrap();
    assert_eq!(ring.name(), "meta");
    assert_eq!(ring.socket_id(), 2);
    assert_eq!(ring.flags(), RingFlags::empty());
    assert_eq!(ring.size(), 32);
}

#[test]
fn test_info_serializes() {
    let ring = Ring::<u64>::new("json", 4, -1).unwrap();
    ring.enqueue(9).unwrap();
    let json = serde_json::to_value(ring.info()).unwrap();
    assert_eq!(json["name"], "json");
    assert_eq!(json["used"], 1);
    assert_eq!(json["avail"], 3);
}
