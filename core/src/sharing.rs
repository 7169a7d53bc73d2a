//! Lifecycle-scoped sharing of a derived state stream.
//!
//! # Design
//! A [`SharedState`] owns an output `watch` channel and a producer factory.
//! The producer runs only while someone observes it:
//! - the first [`Subscription`] starts it;
//! - when the last subscription drops, a stop timer of `stop_timeout` starts;
//! - a subscription arriving before the timer fires cancels it and keeps the
//!   running producer;
//! - when the timer fires the producer is aborted and the output is reset to
//!   the initial value, so the next observer starts from scratch.
//!
//! Dropping the `SharedState` itself stops the producer immediately.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::scope::lock;

type ProducerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type ProducerFactory<S> = Box<dyn Fn(watch::Sender<S>) -> ProducerFuture + Send + Sync>;

pub struct SharedState<S> {
    shared: Arc<Shared<S>>,
}

struct Shared<S> {
    output: watch::Sender<S>,
    initial: S,
    stop_timeout: Duration,
    runtime: Handle,
    start: ProducerFactory<S>,
    slot: Mutex<Slot>,
}

#[derive(Default)]
struct Slot {
    observers: usize,
    producer: Option<AbortHandle>,
    stop_timer: Option<AbortHandle>,
}

impl<S> SharedState<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// `start` is called with a handle to the output each time the producer
    /// (re)starts; the future it returns is the producer.
    pub fn new<F, Fut>(runtime: Handle, initial: S, stop_timeout: Duration, start: F) -> Self
    where
        F: Fn(watch::Sender<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (output, _) = watch::channel(initial.clone());
        let start: ProducerFactory<S> = Box::new(move |sender| Box::pin(start(sender)));
        Self {
            shared: Arc::new(Shared {
                output,
                initial,
                stop_timeout,
                runtime,
                start,
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    /// Latest value; the initial value while nobody observes.
    pub fn value(&self) -> S {
        self.shared.output.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        lock(&self.shared.slot)
            .producer
            .as_ref()
            .is_some_and(|producer| !producer.is_finished())
    }

    pub fn subscribe(&self) -> Subscription<S> {
        let receiver = self.shared.output.subscribe();
        let mut slot = lock(&self.shared.slot);
        slot.observers += 1;
        if let Some(timer) = slot.stop_timer.take() {
            timer.abort();
        }
        let running = slot
            .producer
            .as_ref()
            .is_some_and(|producer| !producer.is_finished());
        if !running {
            debug!("starting shared state producer");
            let producer = (self.shared.start)(self.shared.output.clone());
            slot.producer = Some(self.shared.runtime.spawn(producer).abort_handle());
        }
        Subscription {
            receiver,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> Drop for SharedState<S> {
    fn drop(&mut self) {
        let mut slot = lock(&self.shared.slot);
        if let Some(timer) = slot.stop_timer.take() {
            timer.abort();
        }
        if let Some(producer) = slot.producer.take() {
            producer.abort();
        }
    }
}

impl<S> Shared<S>
where
    S: Clone,
{
    fn stop_if_idle(&self) {
        let mut slot = lock(&self.slot);
        if slot.observers > 0 {
            return;
        }
        slot.stop_timer = None;
        if let Some(producer) = slot.producer.take() {
            debug!("stopping idle shared state producer");
            producer.abort();
        }
        self.output.send_replace(self.initial.clone());
    }
}

/// An attached observer. Dropping it detaches.
pub struct Subscription<S: Clone + Send + Sync + 'static> {
    receiver: watch::Receiver<S>,
    shared: Arc<Shared<S>>,
}

impl<S> Subscription<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn current(&self) -> S {
        self.receiver.borrow().clone()
    }

    /// Wait for the next published value. Returns `false` once the stream
    /// has ended.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Wait until the current value satisfies `predicate`.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&S) -> bool) -> Option<S> {
        self.receiver
            .wait_for(predicate)
            .await
            .ok()
            .map(|value| (*value).clone())
    }
}

impl<S: Clone + Send + Sync + 'static> Drop for Subscription<S> {
    fn drop(&mut self) {
        let mut slot = lock(&self.shared.slot);
        slot.observers = slot.observers.saturating_sub(1);
        if slot.observers > 0 || slot.producer.is_none() {
            return;
        }
        let shared: Weak<Shared<S>> = Arc::downgrade(&self.shared);
        let stop_timeout = self.shared.stop_timeout;
        let timer = self.shared.runtime.spawn(async move {
            tokio::time::sleep(stop_timeout).await;
            if let Some(shared) = shared.upgrade() {
                shared.stop_if_idle();
            }
        });
        slot.stop_timer = Some(timer.abort_handle());
    }
}
