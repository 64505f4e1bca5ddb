use std::sync::mpsc;
use std::thread;

type Task = Box<dyn FnOnce() + Send>;

enum Message {
    Task(Task),
    Shutdown,
}

/// Posting side of a [`TaskRunner`]'s queue.
///
/// Posting after the runner has shut down silently drops the task.
#[derive(Clone)]
pub struct TaskRunnerHandle {
    tx: mpsc::Sender<Message>,
}

impl TaskRunnerHandle {
    /// Post a one-shot task to the runner's thread.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if self.tx.send(Message::Task(Box::new(task))).is_err() {
            tracing::trace!("task runner gone; dropping task");
        }
    }
}

/// A dedicated thread draining one-shot tasks in post order.
///
/// The pipeline uses one for the IO thread; the UI and GPU threads run typed
/// message loops instead, but follow the same one-task-at-a-time discipline.
/// Dropping the runner lets already-queued tasks finish, then joins the
/// thread.
pub struct TaskRunner {
    handle: TaskRunnerHandle,
    thread: Option<thread::JoinHandle<()>>,
}

impl TaskRunner {
    /// Spawn a named runner thread.
    pub fn spawn(name: &str) -> Self {
        let (tx, rx) = mpsc::channel::<Message>();
        let thread = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                while let Ok(message) = rx.recv() {
                    match message {
                        Message::Task(task) => task(),
                        Message::Shutdown => break,
                    }
                }
            })
            .unwrap_or_else(|e| panic!("failed to spawn task runner thread: {e}"));
        Self {
            handle: TaskRunnerHandle { tx },
            thread: Some(thread),
        }
    }

    /// A cloneable posting handle.
    pub fn handle(&self) -> TaskRunnerHandle {
        self.handle.clone()
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        let _ = self.handle.tx.send(Message::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn tasks_run_in_post_order() {
        let runner = TaskRunner::spawn("kiln-test-runner");
        let log = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = mpsc::channel();

        for i in 1..=3 {
            let log = log.clone();
            let done = done_tx.clone();
            runner.handle().post(move || {
                // Each task observes exactly the prior task count.
                assert_eq!(log.swap(i, Ordering::SeqCst), i - 1);
                if i == 3 {
                    let _ = done.send(());
                }
            });
        }
        done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(log.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn post_after_shutdown_is_dropped() {
        let runner = TaskRunner::spawn("kiln-test-runner-2");
        let handle = runner.handle();
        drop(runner);
        handle.post(|| panic!("must not run"));
    }
}
