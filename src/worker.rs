use crate::item::{ItemId, ItemSpec};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Cooperative cancellation shared between the UI and a running job.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What a finished job hands back to the interaction thread.
#[derive(Debug)]
pub enum TaskOutput {
    /// Subtrees to graft, at the root when `into` is `None`.
    Items {
        into: Option<ItemId>,
        items: Vec<ItemSpec>,
    },
    Failed {
        task: String,
        reason: String,
    },
    Cancelled {
        task: String,
    },
}

type Job = Box<dyn FnOnce(&StopFlag) -> TaskOutput + Send>;
type Wake = Arc<dyn Fn() + Send + Sync>;

struct Envelope {
    name: String,
    stop: StopFlag,
    job: Job,
}

/// One background thread running jobs in submission order. Jobs never see
/// the desktop; their output is drained on the interaction thread.
pub struct TaskRunner {
    job_tx: Option<Sender<Envelope>>,
    result_rx: Receiver<TaskOutput>,
    handle: Option<thread::JoinHandle<()>>,
}

impl TaskRunner {
    /// `wake` runs after every result is queued, e.g. to request a repaint.
    pub fn spawn(wake: impl Fn() + Send + Sync + 'static) -> Self {
        let (job_tx, job_rx) = unbounded::<Envelope>();
        let (result_tx, result_rx) = unbounded::<TaskOutput>();
        let wake: Wake = Arc::new(wake);
        let handle = thread::Builder::new()
            .name("netdesk-worker".into())
            .spawn(move || run_jobs(job_rx, result_tx, wake))
            .map_err(|err| error!("failed to start worker thread: {err}"))
            .ok();
        Self {
            job_tx: Some(job_tx),
            result_rx,
            handle,
        }
    }

    /// Queues a job and returns the flag that cancels it.
    pub fn submit(
        &self,
        name: impl Into<String>,
        job: impl FnOnce(&StopFlag) -> TaskOutput + Send + 'static,
    ) -> StopFlag {
        let stop = StopFlag::new();
        let name = name.into();
        let envelope = Envelope {
            name: name.clone(),
            stop: stop.clone(),
            job: Box::new(job),
        };
        let sent = self
            .job_tx
            .as_ref()
            .is_some_and(|tx| tx.send(envelope).is_ok());
        if !sent {
            error!("worker is gone; dropping task {name}");
        }
        stop
    }

    pub fn try_recv(&self) -> Option<TaskOutput> {
        match self.result_rx.try_recv() {
            Ok(output) => Some(output),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn drain(&self) -> Vec<TaskOutput> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_jobs(job_rx: Receiver<Envelope>, result_tx: Sender<TaskOutput>, wake: Wake) {
    while let Ok(Envelope { name, stop, job }) = job_rx.recv() {
        let output = if stop.is_stopped() {
            TaskOutput::Cancelled { task: name.clone() }
        } else {
            job(&stop)
        };
        info!("task {name} finished");
        if result_tx.send(output).is_err() {
            break;
        }
        wake();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Item;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn wait_for(runner: &TaskRunner) -> TaskOutput {
        for _ in 0..200 {
            if let Some(output) = runner.try_recv() {
                return output;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("worker produced nothing");
    }

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn jobs_run_off_thread_and_wake_the_ui() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let runner = TaskRunner::spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        runner.submit("load", |_| TaskOutput::Items {
            into: None,
            items: vec![ItemSpec::new(Item::generic("net", None))],
        });

        match wait_for(&runner) {
            TaskOutput::Items { into, items } => {
                assert!(into.is_none());
                assert_eq!(items.len(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        // wake() follows the send, so the count may lag the output.
        assert!(wait_until(|| wakes.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn jobs_observe_the_stop_flag() {
        let runner = TaskRunner::spawn(|| {});
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
        runner.submit("blocker", move |_| {
            let _ = gate_rx.recv();
            TaskOutput::Failed {
                task: "blocker".into(),
                reason: "released".into(),
            }
        });
        let stop = runner.submit("late", |_| TaskOutput::Items {
            into: None,
            items: Vec::new(),
        });
        stop.request_stop();
        let _ = gate_tx.send(());

        assert!(matches!(wait_for(&runner), TaskOutput::Failed { .. }));
        assert!(matches!(
            wait_for(&runner),
            TaskOutput::Cancelled { task } if task == "late"
        ));
    }
}
