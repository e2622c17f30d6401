//! A decoder worker feeding an application event loop.
//!
//! The main thread plays the part of the application: it runs a `Reactor` that dispatches
//! state changes, metadata and errors posted by the decoder. The decoder runs on its own
//! thread, consumes control requests from a `ThreadQueue` and stops early when the
//! application asks it to.
//!
//! The library's own log output is printed at debug level.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use event_relay::{
    AppQueue, Event, EventKind, MessageChannel, Metadata, Payload, Placement, Reactor,
    ThreadQueue,
};

fn main() -> Result<(), event_relay::Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let reactor = Arc::new(Reactor::new());
    let channel = MessageChannel::new()?;
    channel.attach(Arc::clone(&reactor));

    let finished = Arc::new(AtomicBool::new(false));
    let app_finished = Arc::clone(&finished);
    let updates = Arc::new(AtomicUsize::new(0));
    let app_updates = Arc::clone(&updates);

    let to_app = Arc::new(
        ThreadQueue::builder()
            .name("app")
            .build_on_channel(&channel, move |event: Event| {
                describe(&event);

                match event.kind() {
                    EventKind::TIME_UPDATE => {
                        app_updates.fetch_add(1, Ordering::Relaxed);
                    }
                    EventKind::END_OF_STREAM => app_finished.store(true, Ordering::Relaxed),
                    _ => {}
                }
            }),
    );

    let to_decoder = Arc::new(ThreadQueue::builder().name("decoder").build()?);

    let decoder = {
        let to_app = Arc::clone(&to_app);
        let to_decoder = Arc::clone(&to_decoder);
        thread::spawn(move || decode(&to_decoder, &to_app))
    };

    to_decoder.post(
        Event::with_payload(
            EventKind::OPEN,
            1,
            Payload::Text("file:///music/intro.flac".to_string()),
        ),
        Placement::Back,
    )?;

    let mut quit_sent = false;

    while !finished.load(Ordering::Relaxed) {
        reactor.run_once(Some(Duration::from_millis(100)))?;

        // The user loses interest after a few seconds of playback.
        if !quit_sent && updates.load(Ordering::Relaxed) >= 5 {
            to_decoder.post(Event::new(EventKind::QUIT, 1), Placement::Front)?;
            quit_sent = true;
        }
    }

    decoder.join().expect("decoder thread must not panic")?;

    channel.teardown();
    Ok(())
}

fn decode(controls: &ThreadQueue, to_app: &AppQueue) -> Result<(), event_relay::Error> {
    let open = controls.wait()?;
    let stream = open.stream_id();

    to_app.post(Event::new(EventKind::BEGIN_OF_STREAM, stream), Placement::Back)?;
    to_app.post(
        Event::with_payload(
            EventKind::META,
            stream,
            Payload::Metadata(Metadata::new("Intro", "The Examples", "Debut")),
        ),
        Placement::Back,
    )?;

    for second in 1..=30_u64 {
        // Long-running work checks for control requests between units of work.
        if controls.check_preempt() {
            let control = controls.pop();
            println!("decoder: stopping early because of {control:?}");
            break;
        }

        thread::sleep(Duration::from_millis(20));

        to_app.post(
            Event::with_payload(
                EventKind::TIME_UPDATE,
                stream,
                Payload::Position {
                    position: Duration::from_secs(second),
                    length: Duration::from_secs(30),
                },
            ),
            Placement::Back,
        )?;
    }

    to_app.post(Event::new(EventKind::END_OF_STREAM, stream), Placement::Back)
}

fn describe(event: &Event) {
    match event.payload() {
        Payload::Metadata(metadata) => {
            println!("app: now playing {} by {}", metadata.title, metadata.artist);
        }
        Payload::Position { position, length } => {
            println!("app: {}s of {}s", position.as_secs(), length.as_secs());
        }
        _ => println!("app: {:?} for stream {}", event.kind(), event.stream_id()),
    }
}
