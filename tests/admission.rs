mod common;

use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::*;
use lifetask::{
    CallbackFn, Config, EventKind, LifecycleEvent, LifecycleState, OwnerThread, RuntimeError,
    Scheduler, ShutdownMode, TaskSpec, WorkerPool,
};

#[tokio::test]
async fn test_execute_on_destroyed_owner_fails_fast() {
    let scheduler = scheduler(1);
    let mut events = scheduler.subscribe();
    let thread = OwnerThread::new("main");
    let owner = resumed(&thread, "screen");
    owner.handle_event(LifecycleEvent::Destroy);

    let pre = Rc::new(Cell::new(false));
    let flag = pre.clone();
    let callbacks = CallbackFn::new(|_: u8| panic!("must not run"), |_| panic!("must not run"))
        .with_pre_execute(move || flag.set(true));

    let err = scheduler
        .execute(&owner, (), TaskSpec::new("late", |_: ()| Ok(1u8), callbacks))
        .expect_err("destroyed owner");
    assert!(matches!(err, RuntimeError::OwnerDestroyed { ref owner } if owner == "screen"));
    assert!(!pre.get(), "no hook runs for a rejected task");
    assert_eq!(owner.observer_count(), 0);
    assert_eq!(scheduler.pool().in_flight(), 0);

    let rejected = wait_event(&mut events, EventKind::TaskRejected).await;
    assert_eq!(rejected.reason.as_deref(), Some("runtime_owner_destroyed"));
    assert_eq!(rejected.task.as_deref(), Some("late"));
}

#[tokio::test]
async fn test_execute_on_detached_owner_fails_fast() {
    let scheduler = scheduler(1);
    let thread = OwnerThread::new("main");
    let owner = resumed(&thread, "screen");
    drop(thread);

    let log = deliveries::<u8>();
    let (ok, err) = recorders(&log);
    let res = scheduler.execute(&owner, (), TaskSpec::from_fns("orphan", |_: ()| Ok(1u8), ok, err));

    assert!(matches!(res, Err(RuntimeError::OwnerDetached { .. })));
    assert_eq!(owner.observer_count(), 0);
}

#[tokio::test]
async fn test_execute_after_shutdown_fails_fast() {
    let scheduler = scheduler(1);
    scheduler.shutdown().await.expect("shutdown");

    let thread = OwnerThread::new("main");
    let owner = resumed(&thread, "screen");
    let log = deliveries::<u8>();
    let (ok, err) = recorders(&log);
    let res = scheduler.execute(&owner, (), TaskSpec::from_fns("too-late", |_: ()| Ok(1u8), ok, err));

    assert!(matches!(res, Err(RuntimeError::PoolShutdown)));
    assert_eq!(owner.observer_count(), 0);
}

#[tokio::test]
async fn test_pool_closed_by_other_scheduler_skips_pre_execute() {
    let pool = Arc::new(
        WorkerPool::new(&Config {
            workers: 1,
            ..Config::default()
        })
        .expect("pool"),
    );
    let first = Scheduler::builder(Config::default())
        .with_pool(Arc::clone(&pool))
        .build()
        .expect("first");
    let second = Scheduler::builder(Config::default())
        .with_pool(Arc::clone(&pool))
        .build()
        .expect("second");
    second.shutdown().await.expect("shutdown");

    let thread = OwnerThread::new("main");
    let owner = resumed(&thread, "screen");
    let pre = Rc::new(Cell::new(false));
    let flag = pre.clone();
    let callbacks = CallbackFn::new(|_: u8| panic!("must not run"), |_| panic!("must not run"))
        .with_pre_execute(move || flag.set(true));

    let res = first.execute(&owner, (), TaskSpec::new("shared", |_: ()| Ok(1u8), callbacks));
    assert!(matches!(res, Err(RuntimeError::PoolShutdown)));
    assert!(!pre.get(), "no hook runs once the shared pool is closed");
    assert_eq!(owner.observer_count(), 0);
}

#[tokio::test]
async fn test_owner_destroyed_by_pre_execute_skips_work() {
    let scheduler = scheduler(1);
    let thread = OwnerThread::new("main");
    let owner = resumed(&thread, "screen");
    let ran = Arc::new(AtomicBool::new(false));
    let ran_in_work = Arc::clone(&ran);

    let closing = Rc::clone(&owner);
    let callbacks = CallbackFn::new(|_: ()| panic!("must not deliver"), |_| panic!("must not deliver"))
        .with_pre_execute(move || closing.handle_event(LifecycleEvent::Destroy));

    let ticket = scheduler
        .execute(
            &owner,
            ran_in_work,
            TaskSpec::new(
                "closing",
                |ran: Arc<AtomicBool>| {
                    ran.store(true, Ordering::SeqCst);
                    Ok(())
                },
                callbacks,
            ),
        )
        .expect("execute");

    assert!(ticket.is_finished());
    assert_eq!(owner.state(), LifecycleState::Destroyed);
    assert_eq!(owner.observer_count(), 0);

    thread
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await;
    assert!(!ran.load(Ordering::SeqCst), "work never submitted");
    assert_eq!(scheduler.pool().in_flight(), 0);
}

#[tokio::test]
async fn test_execute_before_resume_delivers_while_created() {
    // a freshly created owner is not paused: it behaves like the first resume happened
    let scheduler = scheduler(1);
    let thread = OwnerThread::new("main");
    let owner = thread.lifecycle("splash");
    owner.handle_event(LifecycleEvent::Create);

    let log = deliveries::<u8>();
    let (ok, err) = recorders(&log);
    let ticket = scheduler
        .execute(&owner, (), TaskSpec::from_fns("warmup", |_: ()| Ok(9u8), ok, err))
        .expect("execute");

    thread.run_until(wait_until(|| ticket.is_finished())).await;
    assert_eq!(*log.borrow(), vec![Ok(9)]);
}

#[tokio::test]
async fn test_abandoned_work_is_delivered_as_failure() {
    let scheduler = Scheduler::new(Config {
        workers: 1,
        shutdown: ShutdownMode::Abandon,
        ..Config::default()
    })
    .expect("scheduler");
    let thread = OwnerThread::new("main");
    let owner = resumed(&thread, "screen");
    let (release, gate) = std::sync::mpsc::channel::<()>();
    let (started_tx, started_rx) = std::sync::mpsc::channel::<()>();

    let first_log = deliveries::<u8>();
    let (ok, err) = recorders(&first_log);
    let first = scheduler
        .execute(
            &owner,
            (gate, started_tx),
            TaskSpec::from_fns(
                "running",
                |(gate, started): (std::sync::mpsc::Receiver<()>, std::sync::mpsc::Sender<()>)| {
                    let _ = started.send(());
                    let _ = gate.recv();
                    Ok(1u8)
                },
                ok,
                err,
            ),
        )
        .expect("execute");

    let second_log = deliveries::<u8>();
    let (ok, err) = recorders(&second_log);
    let second = scheduler
        .execute(&owner, (), TaskSpec::from_fns("queued", |_: ()| Ok(2u8), ok, err))
        .expect("execute");

    started_rx.recv_timeout(WAIT).expect("first work started");
    scheduler.shutdown().await.expect("shutdown");
    release.send(()).expect("release");

    thread
        .run_until(wait_until(|| first.is_finished() && second.is_finished()))
        .await;
    assert_eq!(*first_log.borrow(), vec![Ok(1)]);
    assert_eq!(
        *second_log.borrow(),
        vec![Err(lifetask::TaskError::Abandoned)]
    );
}
