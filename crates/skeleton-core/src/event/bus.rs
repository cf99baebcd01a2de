use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::event::error::EventSystemError;
use crate::event::{Event, SubscriptionId};

/// Callback invoked with every event delivered to a subscription.
pub type EventHandler = Arc<dyn Fn(Event) + Send + Sync>;

#[derive(Clone)]
enum Delivery {
    /// Inline, on the publishing thread
    Inline,
    /// On a runtime task. A serial subscription runs one delivery at a time.
    Spawned { serial: Option<Arc<tokio::sync::Mutex<()>>> },
}

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    handler: EventHandler,
    delivery: Delivery,
    once: bool,
}

/// In-process event bus.
///
/// Inline subscriptions run before [`EventBus::publish`] returns. Async
/// subscriptions run on the current tokio runtime; [`EventBus::wait_async`]
/// waits for them. Outside a runtime async deliveries fall back to running
/// inline. Once-subscriptions are removed as soon as they are selected for
/// delivery.
pub struct EventBus {
    subscriptions: Mutex<HashMap<String, Vec<Subscription>>>,
    next_id: AtomicU64,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn subscriptions(&self) -> MutexGuard<'_, HashMap<String, Vec<Subscription>>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn add<F>(&self, topic: &str, handler: F, delivery: Delivery, once: bool) -> Result<SubscriptionId, EventSystemError>
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        if topic.trim().is_empty() {
            return Err(EventSystemError::InvalidTopic {
                topic: topic.to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions()
            .entry(topic.to_string())
            .or_default()
            .push(Subscription {
                id,
                handler: Arc::new(handler),
                delivery,
                once,
            });
        log::trace!("Subscription {} added for topic '{}'", id, topic);
        Ok(id)
    }

    /// Run `handler` inline for every event on `topic`.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> Result<SubscriptionId, EventSystemError>
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.add(topic, handler, Delivery::Inline, false)
    }

    /// Run `handler` on a runtime task for every event on `topic`.
    /// A transactional subscription handles one event at a time.
    pub fn subscribe_async<F>(
        &self,
        topic: &str,
        handler: F,
        transactional: bool,
    ) -> Result<SubscriptionId, EventSystemError>
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        let serial = transactional.then(|| Arc::new(tokio::sync::Mutex::new(())));
        self.add(topic, handler, Delivery::Spawned { serial }, false)
    }

    /// Like [`EventBus::subscribe`], for the next event only.
    pub fn subscribe_once<F>(&self, topic: &str, handler: F) -> Result<SubscriptionId, EventSystemError>
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.add(topic, handler, Delivery::Inline, true)
    }

    /// Like [`EventBus::subscribe_async`], for the next event only.
    pub fn subscribe_once_async<F>(&self, topic: &str, handler: F) -> Result<SubscriptionId, EventSystemError>
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.add(topic, handler, Delivery::Spawned { serial: None }, true)
    }

    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> Result<(), EventSystemError> {
        let mut subscriptions = self.subscriptions();
        let removed = match subscriptions.get_mut(topic) {
            Some(list) => {
                let before = list.len();
                list.retain(|subscription| subscription.id != id);
                let removed = list.len() != before;
                if list.is_empty() {
                    subscriptions.remove(topic);
                }
                removed
            }
            None => false,
        };

        if removed {
            Ok(())
        } else {
            Err(EventSystemError::SubscriptionNotFound {
                topic: topic.to_string(),
                id,
            })
        }
    }

    pub fn has_callback(&self, topic: &str) -> bool {
        self.subscriptions()
            .get(topic)
            .is_some_and(|list| !list.is_empty())
    }

    /// Deliver `event` to every subscription on `event.event_type`.
    pub fn publish(&self, event: Event) {
        let selected = {
            let mut subscriptions = self.subscriptions();
            let Some(list) = subscriptions.get_mut(&event.event_type) else {
                log::trace!("No subscribers for topic '{}'", event.event_type);
                return;
            };
            let selected = list.clone();
            list.retain(|subscription| !subscription.once);
            if list.is_empty() {
                subscriptions.remove(&event.event_type);
            }
            selected
        };

        let runtime = Handle::try_current().ok();
        for subscription in selected {
            let handler = Arc::clone(&subscription.handler);
            let event = event.clone();
            match (&subscription.delivery, &runtime) {
                (Delivery::Spawned { serial }, Some(runtime)) => {
                    let serial = serial.clone();
                    let task = runtime.spawn(async move {
                        let _guard = match &serial {
                            Some(lock) => Some(lock.lock().await),
                            None => None,
                        };
                        handler(event);
                    });
                    let mut pending = self.pending();
                    pending.retain(|task| !task.is_finished());
                    pending.push(task);
                }
                _ => handler(event),
            }
        }
    }

    /// Wait until every async delivery published so far has completed.
    pub async fn wait_async(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.pending());
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    log::error!("Async event handler failed: {}", e);
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics: Vec<String> = self.subscriptions().keys().cloned().collect();
        f.debug_struct("EventBus")
            .field("topics", &topics)
            .field("pending", &self.pending().len())
            .finish()
    }
}
