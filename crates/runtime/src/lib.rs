
#[allow(unused)]
#[macro_use]
extern crate tracing;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

pub mod args;
pub mod utils;
pub mod log;


type BoxedTask = Box<dyn FnOnce(CancellationToken) -> Box<dyn std::future::Future<Output = ()> + Send + 'static>>;

/// A named long-running task; it should return once its token is cancelled.
pub struct Task {
    name: &'static str,
    start: BoxedTask,
}

impl Task {
    pub fn new<Func, Fut>(name: &'static str, f: Func) -> Self
    where
        Func: FnOnce(CancellationToken) -> Fut + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static
    {
        Task { name, start: Box::new(move |c| Box::new(f(c))) }
    }
}

struct RunHandleInner {
    reload_channel: (flume::Sender<()>, flume::Receiver<()>),
    shutdown_channel: (flume::Sender<()>, flume::Receiver<()>),
}

/// Lets other parts of the process ask the run loop to reload or shut down.
#[derive(Clone)]
pub struct RunHandle(std::sync::Arc<RunHandleInner>);
impl Default for RunHandle {
    fn default() -> Self {
        Self::new()
    }
}
impl RunHandle {
    pub fn new() -> Self {
        RunHandle(std::sync::Arc::new(RunHandleInner {
            reload_channel: flume::unbounded(),
            shutdown_channel: flume::unbounded(),
        }))
    }
    pub fn signal_reload(&self) {
        self.0.reload_channel.0.send(()).ok();
    }
    pub fn signal_shutdown(&self) {
        self.0.shutdown_channel.0.send(()).ok();
    }
}

fn log_task_exit(result: Option<Result<&'_ str, tokio::task::JoinError>>) {
    match result {
        Some(Ok(name)) => info!("task {} exited", name),
        Some(Err(e)) => warn!("task exited with failure: {}", e),
        None => warn!("remaining tasks list is empty?"),
    }
}

/// Run tasks until a signal, a shutdown request, or any task exiting, then cancel
/// the rest and wait for them. A second SIGINT/SIGTERM stops waiting.
///
/// `reload` is called on SIGHUP or [`RunHandle::signal_reload`]; with `None`
/// reload requests are logged and ignored.
#[tracing::instrument(skip_all)]
pub async fn run(
    handle: RunHandle,
    tasks: Vec<Task>,
    mut reload: Option<Box<dyn FnMut()>>,
) -> Result<(), std::io::Error> {
    let mut join_set = tokio::task::JoinSet::new();
    let mut remaining_tasks = tasks.len();
    let cancel = CancellationToken::new();

    for Task { name, start } in tasks {
        let future = start(cancel.child_token());
        let span = tracing::info_span!("task", name).or_current();
        join_set.spawn(async move {
            log::instrument(span, Box::into_pin(future)).await;
            name
        });
    }

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    let reload_rx = &handle.0.reload_channel.1;
    let shutdown_rx = &handle.0.shutdown_channel.1;

    enum Action {
        Exit(&'static str),
        Reload(&'static str),
        Continue,
    }

    loop {
        let action = tokio::select! {
            _ = sighup.recv()  => Action::Reload("Received SIGHUP"),
            _ = sigint.recv()  => Action::Exit("Received SIGINT"),
            _ = sigterm.recv() => Action::Exit("Received SIGTERM"),

            _ = reload_rx.recv_async() => Action::Reload("Received reload request"),
            _ = shutdown_rx.recv_async() => Action::Exit("Received shutdown request"),

            // join_next is cancel-safe
            result = join_set.join_next() => {
                if result.is_some() {
                    remaining_tasks -= 1;
                }
                log_task_exit(result);
                Action::Exit("Task exited")
            },
        };

        match action {
            Action::Continue => (),
            Action::Reload(msg) => match reload.as_mut() {
                Some(reload) => {
                    info!("{msg}, reloading");
                    reload();
                },
                None => info!("{msg}, nothing to reload"),
            },
            Action::Exit(msg) => {
                warn!("{msg}, starting shutdown");
                break;
            },
        }
    }

    log::instrument(tracing::info_span!("shut down").or_current(), async {
        info!("Starting to shut down");
        cancel.cancel();

        while remaining_tasks > 0 {
            let action = tokio::select! {
                _ = sigint.recv()  => Action::Exit("Received second SIGINT"),
                _ = sigterm.recv() => Action::Exit("Received second SIGTERM"),

                result = join_set.join_next() => {
                    if result.is_some() {
                        remaining_tasks -= 1;
                    }
                    log_task_exit(result);
                    Action::Continue
                },
            };
            if let Action::Exit(msg) = action {
                warn!("{msg}, exiting immediately");
                break;
            }
        }

        info!("Exiting");
    }).await;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_stops_when_a_task_exits() {
        let stopped = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = stopped.clone();
        let tasks = vec![
            Task::new("quick", |_cancel| async {}),
            Task::new("waiter", move |cancel| async move {
                cancel.cancelled().await;
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
            }),
        ];
        run(RunHandle::new(), tasks, None).await.unwrap();
        assert!(stopped.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn run_without_tasks_returns() {
        run(RunHandle::new(), Vec::new(), None).await.unwrap();
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_request() {
        let handle = RunHandle::new();
        handle.signal_reload();
        handle.signal_shutdown();
        let tasks = vec![Task::new("idle", |cancel| async move { cancel.cancelled().await })];
        run(handle, tasks, None).await.unwrap();
    }
}
