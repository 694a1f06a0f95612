//! # Example: Deferred Delivery
//!
//! A screen loads contact names in the background while it is paused, gets them on
//! resume, then is destroyed with one load still running (that result is dropped).
//!
//! Run with:
//! ```text
//! RUST_LOG=debug cargo run --example deferred_delivery --features logging
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use lifetask::{
    AddressCache, CacheConfig, Config, LifecycleEvent, LogWriter, OwnerThread, Scheduler,
    Subscribe, TaskError, TaskSpec,
};
use tracing_subscriber::EnvFilter;

type Contacts = Arc<AddressCache<String, u64>>;

/// Slow "address book" resolution, cached.
fn resolve(contacts: &Contacts, address: &str) -> String {
    contacts.record_or_resolve(address, || {
        std::thread::sleep(Duration::from_millis(100));
        address
            .split('<')
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(address)
            .to_string()
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let scheduler = Scheduler::builder(Config {
        workers: 2,
        ..Config::default()
    })
    .with_subscribers(subs)
    .build()?;
    let contacts: Contacts = Arc::new(AddressCache::new(CacheConfig::default()));

    let thread = OwnerThread::new("ui");
    let screen = thread.lifecycle("message-list");
    screen.handle_event(LifecycleEvent::Create);
    screen.handle_event(LifecycleEvent::Start);
    screen.handle_event(LifecycleEvent::Resume);

    let shown = Rc::new(RefCell::new(Vec::<String>::new()));
    let load = |address: &'static str| {
        let shown = Rc::clone(&shown);
        TaskSpec::from_fns(
            format!("resolve {address}"),
            move |contacts: Contacts| Ok::<_, TaskError>(resolve(&contacts, address)),
            move |name| {
                println!("[ui] showing {name}");
                shown.borrow_mut().push(name);
            },
            |e| println!("[ui] lookup failed: {e}"),
        )
    };

    let first = scheduler.execute(&screen, Arc::clone(&contacts), load("Ann Lee <ann@example.org>"))?;
    let second = scheduler.execute(&screen, Arc::clone(&contacts), load("Bob <bob@example.org>"))?;

    println!("[ui] paused while lookups run");
    screen.handle_event(LifecycleEvent::Pause);
    thread
        .run_until(tokio::time::sleep(Duration::from_millis(300)))
        .await;
    println!("[ui] shown so far: {:?}", shown.borrow());

    println!("[ui] resumed");
    screen.handle_event(LifecycleEvent::Resume);
    println!("[ui] shown after resume: {:?}", shown.borrow());
    assert!(first.is_finished() && second.is_finished());

    let orphan = scheduler.execute(&screen, Arc::clone(&contacts), load("Cid <cid@example.org>"))?;
    screen.handle_event(LifecycleEvent::Pause);
    screen.handle_event(LifecycleEvent::Stop);
    screen.handle_event(LifecycleEvent::Destroy);
    println!("[ui] destroyed, '{}' finished: {}", orphan.label(), orphan.is_finished());

    thread
        .run_until(tokio::time::sleep(Duration::from_millis(300)))
        .await;
    println!("[ui] final: {:?}", shown.borrow());

    scheduler.shutdown().await?;
    Ok(())
}
