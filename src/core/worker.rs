//! Background delivery thread used in asynchronous mode

use super::component::Component;
use super::dispatch::Dispatcher;
use super::error::{LoggerError, Result};
use super::log_entry::LogEntry;
use super::severity::SeverityLevel;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub(crate) const WORKER_THREAD_NAME: &str = "snaplogger-async";

/// Owns the queue sender and the worker thread
///
/// Dropping the sender closes the queue; the worker drains whatever is left
/// before exiting, so stopping never loses or reorders entries.
pub(crate) struct AsyncWorker {
    sender: Option<Sender<LogEntry>>,
    handle: Option<JoinHandle<()>>,
}

impl AsyncWorker {
    pub fn start(
        dispatcher: Arc<Dispatcher>,
        self_component: Arc<Component>,
        program_name: String,
    ) -> Result<Self> {
        let (sender, receiver) = unbounded();

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run(&dispatcher, &receiver, &self_component, &program_name))
            .map_err(|e| {
                LoggerError::io_operation("starting", "could not spawn the async logger thread", e)
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queue an entry; it is delivered in submission order
    pub fn send(&self, entry: LogEntry) -> Result<()> {
        match &self.sender {
            Some(sender) => sender.send(entry).map_err(|_| LoggerError::ChannelSendError),
            None => Err(LoggerError::ChannelSendError),
        }
    }

    /// Close the queue and wait for the worker to drain it
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        drop(self.sender.take());
        if let Some(handle) = self.handle.take() {
            if thread::current().id() == handle.thread().id() {
                // stopping from a sink running on the worker itself; it exits
                // on its own once the queue is drained
                return Ok(());
            }
            handle.join().map_err(|e| {
                LoggerError::other(format!("async worker thread panicked: {:?}", e))
            })?;
        }
        Ok(())
    }
}

impl Drop for AsyncWorker {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            eprintln!("[LOGGER ERROR] {}", e);
        }
    }
}

fn notice(text: &str, self_component: &Arc<Component>, program_name: &str) -> LogEntry {
    let mut entry =
        LogEntry::new(SeverityLevel::DEBUG, text).with_component(Arc::clone(self_component));
    entry.program_name = program_name.to_string();
    entry
}

fn run(
    dispatcher: &Dispatcher,
    receiver: &Receiver<LogEntry>,
    self_component: &Arc<Component>,
    program_name: &str,
) {
    // errors are already reported on stderr by the dispatcher
    let _ = dispatcher.dispatch(&notice(
        "asynchronous logger thread started.",
        self_component,
        program_name,
    ));

    for entry in receiver.iter() {
        let _ = dispatcher.dispatch(&entry);
        if receiver.is_empty() {
            let _ = dispatcher.flush();
        }
    }

    let _ = dispatcher.dispatch(&notice(
        "asynchronous logger thread stopped.",
        self_component,
        program_name,
    ));
    let _ = dispatcher.flush();
}
