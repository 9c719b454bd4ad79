use dmxp_tally::SPSC::ChannelBuilder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn simple_write_drain() -> std::io::Result<()> {
    let (mut producer, mut consumer) = ChannelBuilder::new().with_capacity(16).build::<u8>()?;

    assert!(producer.try_write(1));
    assert!(producer.try_write(2));
    assert!(producer.try_write(3));
    assert_eq!(consumer.pending(), 3);

    assert_eq!(consumer.drain_all(), vec![1, 2, 3]);
    assert_eq!(consumer.pending(), 0);
    assert!(consumer.drain_all().is_empty());
    Ok(())
}

#[test]
fn capacity_rounds_up_to_power_of_two() -> std::io::Result<()> {
    let (producer, consumer) = ChannelBuilder::new().with_capacity(5).build::<u8>()?;
    assert_eq!(producer.capacity(), 8);
    assert_eq!(consumer.capacity(), 8);

    let (producer, _consumer) = ChannelBuilder::new().with_capacity(1).build::<u8>()?;
    assert_eq!(producer.capacity(), 1);

    let err = ChannelBuilder::new().with_capacity(0).build::<u8>().unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    Ok(())
}

#[test]
fn full_buffer_drops_new_values() -> std::io::Result<()> {
    let (mut producer, mut consumer) = ChannelBuilder::new().with_capacity(4).build::<u32>()?;

    // Fill buffer
    for i in 0..4 {
        assert!(producer.try_write(i));
    }

    // Next writes should fail and leave stored values alone
    assert!(!producer.try_write(100));
    assert!(!producer.try_write(101));
    assert_eq!(producer.overflow_count(), 2);
    assert_eq!(consumer.overflow_count(), 2);
    assert_eq!(producer.pending(), 4);

    assert_eq!(consumer.drain_all(), vec![0, 1, 2, 3]);

    // Space again after a drain
    assert!(producer.try_write(4));
    assert_eq!(consumer.drain_all(), vec![4]);
    Ok(())
}

#[test]
fn wraps_around_many_times() -> std::io::Result<()> {
    let (mut producer, mut consumer) = ChannelBuilder::new().with_capacity(4).build::<u64>()?;

    let mut next = 0u64;
    for round in 0..50 {
        let batch = (round % 4) + 1;
        let expected: Vec<u64> = (next..next + batch).collect();
        for &v in &expected {
            assert!(producer.try_write(v));
        }
        next += batch;
        assert_eq!(consumer.drain_all(), expected);
    }
    assert_eq!(producer.overflow_count(), 0);
    Ok(())
}

#[test]
fn draining_empty_twice_is_harmless() -> std::io::Result<()> {
    let (mut producer, mut consumer) = ChannelBuilder::new().with_capacity(2).build::<u8>()?;

    assert!(consumer.drain_all().is_empty());
    assert!(consumer.drain_all().is_empty());

    assert!(producer.try_write(7));
    assert_eq!(consumer.drain_all(), vec![7]);
    assert!(consumer.drain_all().is_empty());
    assert!(consumer.drain_all().is_empty());
    Ok(())
}

#[test]
fn never_holds_more_than_capacity() -> std::io::Result<()> {
    let (mut producer, mut consumer) = ChannelBuilder::new().with_capacity(8).build::<usize>()?;

    let mut accepted = Vec::new();
    for i in 0..20 {
        if producer.try_write(i) {
            accepted.push(i);
        }
        assert!(producer.pending() <= 8);
    }
    assert_eq!(accepted, (0..8).collect::<Vec<_>>());
    assert_eq!(producer.overflow_count(), 12);
    assert_eq!(consumer.drain_all(), accepted);
    Ok(())
}

#[test]
fn unread_values_are_dropped_with_the_channel() -> std::io::Result<()> {
    struct Tracked(Arc<AtomicUsize>);
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let (mut producer, mut consumer) = ChannelBuilder::new().with_capacity(4).build::<Tracked>()?;

    for _ in 0..4 {
        assert!(producer.try_write(Tracked(drops.clone())));
    }
    // Rejected value is dropped right away
    assert!(!producer.try_write(Tracked(drops.clone())));
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    let drained = consumer.drain_all();
    assert_eq!(drained.len(), 4);
    drop(drained);
    assert_eq!(drops.load(Ordering::SeqCst), 5);

    assert!(producer.try_write(Tracked(drops.clone())));
    assert!(producer.try_write(Tracked(drops.clone())));
    drop(producer);
    drop(consumer);
    assert_eq!(drops.load(Ordering::SeqCst), 7);
    Ok(())
}

#[test]
fn spsc_threads_preserve_write_order() -> std::io::Result<()> {
    let (mut producer, mut consumer) = ChannelBuilder::new().with_capacity(64).build::<u32>()?;
    const COUNT: u32 = 100_000;

    let p = thread::spawn(move || {
        for i in 0..COUNT {
            while !producer.try_write(i) {
                std::hint::spin_loop();
            }
        }
        producer.overflow_count()
    });

    let c = thread::spawn(move || {
        let mut expected = 0u32;
        while expected < COUNT {
            for value in consumer.drain_all() {
                assert_eq!(value, expected);
                expected += 1;
            }
        }
        expected
    });

    let overflow = p.join().unwrap();
    assert_eq!(c.join().unwrap(), COUNT);
    // every rejected attempt was retried, so nothing was lost
    println!("Producer retried {} times on a full ring", overflow);
    Ok(())
}

#[test]
fn debug_shows_ring_state() -> std::io::Result<()> {
    let (mut producer, consumer) = ChannelBuilder::new().with_capacity(2).build::<u8>()?;
    producer.try_write(1);
    producer.try_write(2);
    producer.try_write(3);

    let shown = format!("{:?}", consumer);
    assert!(shown.starts_with("Consumer"));
    assert!(shown.contains("capacity: 2"));
    assert!(shown.contains("pending: 2"));
    assert!(shown.contains("overflow: 1"));
    Ok(())
}
