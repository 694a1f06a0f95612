#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use lifetask::{
    Config, Event, EventKind, Lifecycle, LifecycleEvent, OwnerThread, Scheduler, TaskError,
};
use tokio::sync::broadcast;

pub const WAIT: Duration = Duration::from_secs(5);

pub fn scheduler(workers: usize) -> Arc<Scheduler> {
    Scheduler::new(Config {
        workers,
        ..Config::default()
    })
    .expect("scheduler")
}

/// Lifecycle driven up to `Resumed`.
pub fn resumed(thread: &Rc<OwnerThread>, label: &str) -> Rc<Lifecycle> {
    let lc = thread.lifecycle(label);
    lc.handle_event(LifecycleEvent::Create);
    lc.handle_event(LifecycleEvent::Start);
    lc.handle_event(LifecycleEvent::Resume);
    lc
}

/// Yields to the owner thread until `cond` holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Receives events until one of `kind` arrives.
pub async fn wait_event(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    tokio::time::timeout(WAIT, async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("bus closed"),
            }
        }
    })
    .await
    .expect("event not received in time")
}

/// Everything the callbacks saw, in order.
pub type Deliveries<T> = Rc<RefCell<Vec<Result<T, TaskError>>>>;

pub fn deliveries<T>() -> Deliveries<T> {
    Rc::new(RefCell::new(Vec::new()))
}

/// Success and failure callbacks recording into `log`.
pub fn recorders<T: 'static>(
    log: &Deliveries<T>,
) -> (impl FnOnce(T) + 'static, impl FnOnce(TaskError) + 'static) {
    let ok = Rc::clone(log);
    let err = Rc::clone(log);
    (
        move |v| ok.borrow_mut().push(Ok(v)),
        move |e| err.borrow_mut().push(Err(e)),
    )
}
