// Background task handles. Dropping a handle stops its task.

use log::debug;
use tokio::task::JoinHandle;

/// Owns a spawned polling loop and aborts it on teardown.
#[derive(Debug)]
pub struct PollHandle {
    name: &'static str,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn new(name: &'static str, task: JoinHandle<()>) -> Self {
        Self {
            name,
            task: Some(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Stops the loop. No further ticks run after this returns.
    pub fn stop(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Stopped poller '{}'", self.name);
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
