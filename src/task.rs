use futures::channel::oneshot;

/// Blocking work running on its own thread, polled from the UI loop
#[derive(Debug)]
pub struct BackgroundTask<T> {
    label: &'static str,
    receiver: oneshot::Receiver<T>,
}

#[derive(Debug, PartialEq)]
pub enum TaskPoll<T> {
    Ready(T),
    Pending,
    /// The worker died without reporting back
    Lost,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Run `work` on a new thread and wake the UI when it finishes
    pub fn spawn(label: &'static str, ctx: &egui::Context, work: impl FnOnce() -> T + Send + 'static) -> Self {
        let ctx = ctx.clone();
        Self::spawn_with(label, work, move || ctx.request_repaint())
    }

    fn spawn_with(
        label: &'static str,
        work: impl FnOnce() -> T + Send + 'static,
        on_done: impl FnOnce() + Send + 'static,
    ) -> Self {
        let (sender, receiver) = oneshot::channel();
        log::debug!("Starting background task: {}", label);
        std::thread::spawn(move || {
            if sender.send(work()).is_err() {
                log::debug!("Result of {} dropped; nobody is waiting", label);
            }
            on_done();
        });
        Self { label, receiver }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn poll(&mut self) -> TaskPoll<T> {
        match self.receiver.try_recv() {
            Ok(Some(value)) => TaskPoll::Ready(value),
            Ok(None) => TaskPoll::Pending,
            Err(oneshot::Canceled) => {
                log::error!("Background task {} ended without a result", self.label);
                TaskPoll::Lost
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait<T: Send + 'static>(task: &mut BackgroundTask<T>) -> TaskPoll<T> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match task.poll() {
                TaskPoll::Pending if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(5)),
                other => return other,
            }
        }
    }

    #[test]
    fn test_result_arrives() {
        let mut task = BackgroundTask::spawn_with("answer", || 42, || ());
        assert_eq!(wait(&mut task), TaskPoll::Ready(42));
    }

    #[test]
    fn test_panicking_worker_is_reported_lost() {
        let mut task: BackgroundTask<u32> = BackgroundTask::spawn_with("boom", || panic!("worker failed"), || ());
        assert_eq!(wait(&mut task), TaskPoll::Lost);
    }
}
