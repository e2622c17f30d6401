//! Message channel and application queue behavior when driven by a real event loop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use event_relay::{
    AppQueue, Error, Event, EventKind, HandlerId, InputRegistry, MAX_PAYLOAD, MessageChannel, OpCode,
    Placement, Reactor, ThreadQueue,
};
use testing::{run_producers, with_watchdog};

type Frames = Arc<Mutex<Vec<(OpCode, Option<Vec<u8>>)>>>;

fn attached_channel() -> (Arc<Reactor>, MessageChannel) {
    let reactor = Arc::new(Reactor::new());
    let channel = MessageChannel::new().unwrap();
    channel.attach(Arc::clone(&reactor));
    (reactor, channel)
}

fn record_frames(channel: &MessageChannel) -> (HandlerId, Frames) {
    let frames: Frames = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&frames);

    let handler = channel.register(move |op, payload| {
        sink.lock().unwrap().push((op, payload.map(<[u8]>::to_vec)));
    });

    (handler, frames)
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
fn frames_reach_their_handler_on_the_loop_thread() {
    let (reactor, channel) = attached_channel();
    let (handler, frames) = record_frames(&channel);

    channel.post(handler, 7, Some(b"hello")).unwrap();
    channel.post(handler, 3, None).unwrap();

    assert_eq!(reactor.run_pending().unwrap(), 2);
    assert_eq!(
        *frames.lock().unwrap(),
        vec![(7, Some(b"hello".to_vec())), (3, None)]
    );
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
fn oversized_payload_is_truncated() {
    let (reactor, channel) = attached_channel();
    let (handler, frames) = record_frames(&channel);

    let payload = (0..9000_u32)
        .map(|index| u8::try_from(index % 251).unwrap())
        .collect::<Vec<_>>();

    channel.post(handler, 11, Some(&payload)).unwrap();
    assert_eq!(reactor.run_pending().unwrap(), 1);

    let frames = frames.lock().unwrap();
    let (op, delivered) = &frames[0];

    assert_eq!(*op, 11);
    assert_eq!(delivered.as_deref(), Some(&payload[..MAX_PAYLOAD]));
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
fn frames_from_each_producer_stay_in_order() {
    const PRODUCERS: usize = 4;
    const FRAMES_PER_PRODUCER: u32 = 200;

    with_watchdog(|| {
        let (reactor, channel) = attached_channel();
        let (handler, frames) = record_frames(&channel);

        run_producers(PRODUCERS, |producer| {
            let op = OpCode::try_from(producer).unwrap();

            for sequence in 0..FRAMES_PER_PRODUCER {
                channel
                    .post(handler, op, Some(&sequence.to_le_bytes()))
                    .unwrap();
            }
        });

        let total = PRODUCERS * FRAMES_PER_PRODUCER as usize;
        let mut dispatched = 0;
        while dispatched < total {
            dispatched += reactor.run_once(Some(Duration::from_secs(1))).unwrap();
        }

        let mut per_producer = vec![Vec::new(); PRODUCERS];
        for (op, payload) in frames.lock().unwrap().iter() {
            let bytes: [u8; 4] = payload.as_deref().unwrap().try_into().unwrap();
            per_producer[*op as usize].push(u32::from_le_bytes(bytes));
        }

        for sequences in per_producer {
            assert_eq!(sequences, (0..FRAMES_PER_PRODUCER).collect::<Vec<_>>());
        }
    });
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
fn app_queue_delivers_on_the_loop_thread() {
    const EVENTS: usize = 50;

    with_watchdog(|| {
        let (reactor, channel) = attached_channel();

        let loop_thread = thread::current().id();
        let delivered = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&delivered);

        let queue = Arc::new(AppQueue::new(&channel, move |event: Event| {
            assert_eq!(thread::current().id(), loop_thread);
            assert_eq!(event.kind(), EventKind::TIME_UPDATE);
            counter.fetch_add(1, Ordering::Relaxed);
        }));

        let producer = {
            let queue = Arc::clone(&queue);

            thread::spawn(move || {
                for _ in 0..EVENTS {
                    queue
                        .post(Event::new(EventKind::TIME_UPDATE, 1), Placement::Back)
                        .unwrap();
                }
            })
        };

        while delivered.load(Ordering::Relaxed) < EVENTS {
            reactor.run_once(Some(Duration::from_secs(1))).unwrap();
        }

        producer.join().unwrap();
        assert!(queue.is_empty());
    });
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
fn thread_queue_can_share_the_loop_with_a_channel() {
    let (reactor, channel) = attached_channel();
    let (handler, frames) = record_frames(&channel);

    let queue = Arc::new(ThreadQueue::new().unwrap());
    let popped = Arc::new(Mutex::new(Vec::new()));

    let consumer = Arc::clone(&queue);
    let sink = Arc::clone(&popped);
    reactor.add_input(
        queue.wait_handle(),
        Arc::new(move || {
            while let Some(event) = consumer.pop() {
                sink.lock().unwrap().push(event.kind());
            }
        }),
    );

    queue
        .post(Event::new(EventKind::VOLUME, 1), Placement::Back)
        .unwrap();
    channel.post(handler, 5, Some(b"gain")).unwrap();

    assert_eq!(reactor.run_pending().unwrap(), 2);
    assert_eq!(*popped.lock().unwrap(), vec![EventKind::VOLUME]);
    assert_eq!(*frames.lock().unwrap(), vec![(5, Some(b"gain".to_vec()))]);
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
fn teardown_detaches_from_the_loop() {
    let (reactor, channel) = attached_channel();
    let producer_handle = channel.clone();
    let (handler, frames) = record_frames(&producer_handle);

    assert_eq!(reactor.input_count(), 1);

    channel.teardown();
    assert_eq!(reactor.input_count(), 0);

    // Teardown closes the channel for every handle.
    assert!(producer_handle.is_closed());
    assert!(matches!(
        producer_handle.post(handler, 1, None),
        Err(Error::ChannelClosed)
    ));
    assert!(matches!(producer_handle.drain(), Err(Error::ChannelClosed)));
    assert!(frames.lock().unwrap().is_empty());
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call FFI functions")]
fn app_queue_outliving_its_channel_reports_closed() {
    with_watchdog(|| {
        let (reactor, channel) = attached_channel();
        let queue = AppQueue::new(&channel, |_event: Event| {});

        channel.teardown();
        assert_eq!(reactor.input_count(), 0);

        let result = queue.post(Event::new(EventKind::STATE_READY, 0), Placement::Back);
        assert!(matches!(result, Err(Error::ChannelClosed)));

        // The event stays queued and goes away with the queue.
        assert_eq!(queue.flush(), 1);
    });
}
