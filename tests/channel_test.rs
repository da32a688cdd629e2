use sluice::{bounded, rendezvous, RecvError, RecvTimeoutError, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_bounded_single_thread() {
    let ch = bounded(1);

    ch.send(1).unwrap();
    assert_eq!(ch.recv(), Ok(1));
}

#[test]
fn test_bounded_fifo_order() {
    let ch = bounded(5);

    ch.send(1).unwrap();
    ch.send(2).unwrap();
    ch.send(3).unwrap();

    assert_eq!(ch.recv(), Ok(1));

    ch.send(4).unwrap();

    assert_eq!(ch.recv(), Ok(2));
    assert_eq!(ch.recv(), Ok(3));
    assert_eq!(ch.recv(), Ok(4));
}

#[test]
fn test_closed_channel_delivers_pending_messages() {
    let ch = bounded(3);

    ch.send(1).unwrap();
    ch.send(2).unwrap();
    ch.send(3).unwrap();

    assert_eq!(ch.recv(), Ok(1));
    ch.close();

    // Close does not discard what is already buffered.
    assert!(!ch.is_closed());
    assert_eq!(ch.recv(), Ok(2));
    assert_eq!(ch.recv(), Ok(3));

    assert_eq!(ch.recv(), Err(RecvError));
    assert!(ch.is_closed());
}

#[test]
fn test_send_to_closed_returns_the_value() {
    let ch = bounded(2);

    assert!(ch.try_send(1).is_ok());
    ch.close();

    let err = ch.send(2).unwrap_err();
    assert_eq!(err.into_inner(), 2);

    assert_eq!(ch.try_recv(), Ok(1));
    assert_eq!(ch.try_recv(), Err(TryRecvError::Closed));
}

#[test]
fn test_close_is_idempotent() {
    let ch = bounded::<i32>(1);

    ch.close();
    assert!(ch.is_closed());
    ch.close();
    assert!(ch.is_closed());
}

#[test]
fn test_try_recv_distinguishes_empty_and_closed() {
    let ch = bounded::<i32>(1);

    assert_eq!(ch.try_recv(), Err(TryRecvError::Empty));
    ch.close();
    assert_eq!(ch.try_recv(), Err(TryRecvError::Closed));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_rendezvous_send_blocks_until_received() {
    let ch = rendezvous();
    let received = Arc::new(Mutex::new(Vec::new()));
    let start = Instant::now();

    let rx = ch.clone();
    let sink = received.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        sink.lock().unwrap().push(rx.recv().unwrap());
    });

    ch.send(100).unwrap();
    let elapsed = start.elapsed();
    t.join().unwrap();

    assert_eq!(*received.lock().unwrap(), vec![100]);
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_rendezvous_close_waits_for_handoff() {
    let ch = rendezvous();
    let received = Arc::new(Mutex::new(Vec::new()));
    let start = Instant::now();

    let rx = ch.clone();
    let sink = received.clone();
    let receiver = thread::spawn(move || {
        thread::sleep(Duration::from_millis(120));
        sink.lock().unwrap().push(rx.recv().unwrap());
    });

    let tx = ch.clone();
    let sender = thread::spawn(move || {
        tx.send(1).unwrap();
    });

    let closer_ch = ch.clone();
    let closer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        closer_ch.close();
    });

    // Close cannot finish before the deposited value is taken at ~120ms.
    closer.join().unwrap();
    let elapsed = start.elapsed();
    receiver.join().unwrap();
    sender.join().unwrap();

    assert_eq!(*received.lock().unwrap(), vec![1]);
    assert!(elapsed > Duration::from_millis(60));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_rendezvous_close_blocks_while_value_unclaimed() {
    let ch = rendezvous();
    let close_returned = Arc::new(AtomicBool::new(false));

    let closer_ch = ch.clone();
    let flag = close_returned.clone();
    // Deliberately never joined: with no receiver the close never
    // completes, which is exactly what is asserted below.
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        closer_ch.close();
        flag.store(true, Ordering::SeqCst);
    });

    ch.send(1).unwrap();

    thread::sleep(Duration::from_millis(100));
    assert!(!close_returned.load(Ordering::SeqCst));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_try_send_rendezvous_requires_waiting_receiver() {
    let ch = rendezvous();

    // Nobody is receiving, so a non-blocking hand-off is impossible.
    let err = ch.try_send(7).unwrap_err();
    assert!(err.is_full());

    let rx = ch.clone();
    let t = thread::spawn(move || rx.recv().unwrap());
    thread::sleep(Duration::from_millis(30));

    assert!(ch.try_send(7).is_ok());
    assert_eq!(t.join().unwrap(), 7);
}

#[test]
fn test_try_send_closed_rendezvous() {
    let ch = rendezvous();
    ch.close();

    let err = ch.try_send(2).unwrap_err();
    assert!(err.is_closed());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_send_timeout_rendezvous_succeeds() {
    let ch = rendezvous();
    let start = Instant::now();

    let rx = ch.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        rx.recv().unwrap()
    });

    ch.send_timeout("test", Duration::from_millis(200)).unwrap();
    t.join().unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(10));
    assert!(elapsed < Duration::from_secs(2));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_send_timeout_rendezvous_expires() {
    let ch = rendezvous();

    let rx = ch.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        rx.recv().unwrap()
    });

    let err = ch
        .send_timeout("first", Duration::from_millis(10))
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.into_inner(), "first");

    // The channel stays usable; a plain send meets the receiver.
    ch.send("second").unwrap();
    assert_eq!(t.join().unwrap(), "second");
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_send_timeout_bounded_succeeds_when_drained() {
    let ch = bounded(1);
    ch.send(1).unwrap();

    let rx = ch.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        rx.recv().unwrap()
    });

    ch.send_timeout(2, Duration::from_millis(200)).unwrap();
    assert_eq!(t.join().unwrap(), 1);
    assert_eq!(ch.recv(), Ok(2));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_send_timeout_bounded_expires_when_full() {
    let ch = bounded(1);
    ch.send(1).unwrap();

    let err = ch.send_timeout(2, Duration::from_millis(10)).unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.into_inner(), 2);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_recv_timeout() {
    let ch = bounded(1);

    assert_eq!(
        ch.recv_timeout(Duration::from_millis(10)),
        Err(RecvTimeoutError::Timeout)
    );

    ch.send(5).unwrap();
    assert_eq!(ch.recv_timeout(Duration::from_millis(10)), Ok(5));

    ch.close();
    assert_eq!(
        ch.recv_timeout(Duration::from_millis(10)),
        Err(RecvTimeoutError::Closed)
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_recv_timeout_rendezvous_meets_sender() {
    let ch = rendezvous();

    let tx = ch.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        tx.send(5).unwrap();
    });

    assert_eq!(ch.recv_timeout(Duration::from_millis(200)), Ok(5));
    t.join().unwrap();
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_timed_sender_meets_timed_receiver() {
    // Neither side uses a plain blocking call; the receiver announcement
    // must still let the two meet within their budgets.
    let ch = rendezvous();

    let tx = ch.clone();
    let t = thread::spawn(move || tx.send_timeout(9, Duration::from_millis(500)));

    assert_eq!(ch.recv_timeout(Duration::from_millis(500)), Ok(9));
    assert!(t.join().unwrap().is_ok());
}

#[test]
fn test_for_new() {
    let ch = bounded(1);

    let mut seen = None;
    ch.for_new(|v: i32| seen = Some(v));
    assert_eq!(seen, None);

    ch.send(3).unwrap();
    ch.for_new(|v| seen = Some(v));
    assert_eq!(seen, Some(3));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_for_each_drains_producer() {
    let ch = bounded(10);

    let tx = ch.clone();
    let t = thread::spawn(move || {
        for i in 0..100 {
            tx.send(i).unwrap();
        }
        tx.close();
    });

    let mut got = Vec::new();
    ch.for_each(|v| got.push(v));
    t.join().unwrap();

    assert_eq!(got, (0..100).collect::<Vec<_>>());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_iterator_over_channel() {
    let ch = bounded(4);

    let tx = ch.clone();
    let t = thread::spawn(move || {
        for i in 1..=8 {
            tx.send(i).unwrap();
        }
        tx.close();
    });

    let mut sum = 0;
    for v in &ch {
        sum += v;
    }
    t.join().unwrap();

    assert_eq!(sum, 36);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_bounded_multiple_producers() {
    let ch = bounded(10);
    let a = ch.clone();
    let b = ch.clone();

    let t1 = thread::spawn(move || {
        for i in 0..100 {
            a.send(i).unwrap();
        }
    });
    let t2 = thread::spawn(move || {
        for i in 100..200 {
            b.send(i).unwrap();
        }
    });

    let mut received: Vec<i32> = (0..200).map(|_| ch.recv().unwrap()).collect();
    t1.join().unwrap();
    t2.join().unwrap();

    received.sort_unstable();
    assert_eq!(received, (0..200).collect::<Vec<_>>());
}
