//! Stress tests for concurrent logging
//!
//! These tests verify:
//! - No message is lost or duplicated when many threads log at once
//! - Per-thread ordering survives switching asynchronous mode on and off
//! - Messages built on one thread can be sent from another
//! - A bytes-per-minute limit drops the excess and counts it

use snaplogger::prelude::*;
use snaplogger::SharedBuffer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const THREADS: usize = 8;
const PER_THREAD: usize = 500;

fn buffered_logger() -> (Logger, SharedBuffer) {
    let logger = Logger::new();
    let buffer = BufferAppender::new();
    let output = buffer.buffer();
    logger.add_appender(
        AppenderHandle::new(buffer).with_format(Format::shared("${message}").unwrap()),
    );
    (logger, output)
}

/// Parse "t<thread>-<seq>" lines into per-thread sequences
fn sequences(lines: &[String]) -> HashMap<usize, Vec<usize>> {
    let mut result: HashMap<usize, Vec<usize>> = HashMap::new();
    for line in lines {
        let (thread, seq) = line
            .strip_prefix('t')
            .and_then(|rest| rest.split_once('-'))
            .expect("well formed line");
        result
            .entry(thread.parse().unwrap())
            .or_default()
            .push(seq.parse().unwrap());
    }
    result
}

#[test]
fn test_concurrent_synchronous_logging() {
    let (logger, output) = buffered_logger();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.error(format!("t{}-{}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    let lines = output.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    assert_eq!(logger.metrics().total_logged(), (THREADS * PER_THREAD) as u64);

    for (_, seq) in sequences(&lines) {
        assert_eq!(seq, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn test_async_toggling_under_load() {
    let (logger, output) = buffered_logger();
    let done = Arc::new(AtomicBool::new(false));

    let toggler = {
        let logger = logger.clone();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut asynchronous = false;
            while !done.load(Ordering::Acquire) {
                asynchronous = !asynchronous;
                logger
                    .set_asynchronous(asynchronous)
                    .expect("toggle asynchronous mode");
                thread::sleep(Duration::from_millis(1));
            }
            logger.set_asynchronous(false).expect("final drain");
        })
    };

    let producers: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.message(SeverityLevel::ERROR).append(format_args!("t{}-{}", t, i));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer panicked");
    }
    done.store(true, Ordering::Release);
    toggler.join().expect("toggler panicked");

    let lines = output.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);
    let sequences = sequences(&lines);
    assert_eq!(sequences.len(), THREADS);
    for (_, seq) in sequences {
        assert_eq!(seq, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn test_message_sent_from_another_thread() {
    let (logger, output) = buffered_logger();

    let message = logger.message(SeverityLevel::ERROR);
    message.append("built here");
    let alias = message.clone();

    thread::spawn(move || {
        message.append(", sent there");
    })
    .join()
    .expect("sender panicked");

    assert_eq!(output.lines(), vec!["built here, sent there"]);
    assert!(!alias.is_active());
}

#[test]
fn test_rate_limit_drops_excess() {
    let (logger, output) = buffered_logger();
    let appender = logger.get_appender("buffer").expect("registered");
    // "xxxxxxxxx\n" is 10 bytes
    appender.set_bytes_per_minute(100);

    for _ in 0..50 {
        logger.error("xxxxxxxxx");
    }

    assert_eq!(output.lines().len(), 10);
    assert_eq!(appender.messages_written(), 10);
    assert_eq!(appender.messages_dropped(), 40);
    assert_eq!(appender.bytes_written(), 100);
    assert_eq!(logger.metrics().dropped_count(), 40);
}
