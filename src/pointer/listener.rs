use std::sync::{Arc, Mutex};

use log::{error, trace};

pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub passive: bool,
}

/// Something listeners can be added to and removed from, keyed by event
/// name. Removal matches on the handler's identity, as the DOM does.
pub trait EventTarget<E>: Send + Sync {
    fn add_event_listener(&self, event: &str, handler: Handler<E>, options: ListenerOptions);
    fn remove_event_listener(&self, event: &str, handler: &Handler<E>, options: ListenerOptions);
}

/// Listeners added by [`listen`]. Removes them on [`Listening::detach`]
/// or when dropped, whichever comes first.
#[must_use = "listeners are removed when this is dropped"]
pub struct Listening {
    cleanups: Vec<Box<dyn FnOnce() + Send>>,
}

/// Add every listener for every event on `target`.
pub fn listen<E, T>(
    target: &Arc<T>,
    events: &[&str],
    listeners: &[Handler<E>],
    options: ListenerOptions,
) -> Listening
where
    E: 'static,
    T: EventTarget<E> + ?Sized + 'static,
{
    let mut cleanups: Vec<Box<dyn FnOnce() + Send>> = Vec::new();

    for &event in events {
        for listener in listeners {
            target.add_event_listener(event, Arc::clone(listener), options);

            let target = Arc::clone(target);
            let event = event.to_string();
            let listener = Arc::clone(listener);
            cleanups.push(Box::new(move || {
                target.remove_event_listener(&event, &listener, options);
            }));
        }
    }

    trace!("listening: {} registrations", cleanups.len());
    Listening { cleanups }
}

impl Listening {
    /// Attached to nothing, detaching is a no-op.
    pub fn inert() -> Self {
        Self { cleanups: vec![] }
    }

    pub fn is_attached(&self) -> bool {
        !self.cleanups.is_empty()
    }

    pub fn detach(&mut self) {
        for cleanup in self.cleanups.drain(..) {
            cleanup();
        }
    }
}

impl Drop for Listening {
    fn drop(&mut self) {
        self.detach();
    }
}

struct Registration<E> {
    event: String,
    handler: Handler<E>,
    options: ListenerOptions,
}

/// An in-process [`EventTarget`] which calls its listeners on
/// [`EventBus::dispatch`].
pub struct EventBus<E> {
    registrations: Mutex<Vec<Registration<E>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            registrations: Mutex::new(vec![]),
        }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call every listener for `event`, in registration order.
    pub fn dispatch(&self, event: &str, payload: &E) {
        // listeners may add or remove listeners, don't hold the lock
        let handlers: Vec<Handler<E>> = match self.registrations.lock() {
            Ok(regs) => regs
                .iter()
                .filter(|r| r.event == event)
                .map(|r| Arc::clone(&r.handler))
                .collect(),
            Err(e) => {
                error!("event listeners poisoned: {e}");
                return;
            }
        };

        for handler in handlers {
            handler(payload);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registrations.lock().map_or(0, |regs| regs.len())
    }
}

impl<E> EventTarget<E> for EventBus<E>
where
    E: 'static,
{
    fn add_event_listener(&self, event: &str, handler: Handler<E>, options: ListenerOptions) {
        let Ok(mut regs) = self.registrations.lock() else {
            error!("event listeners poisoned, dropping {event} listener");
            return;
        };

        // the same listener twice is a no-op
        let dup = regs.iter().any(|r| {
            r.event == event && Arc::ptr_eq(&r.handler, &handler) && r.options.capture == options.capture
        });
        if !dup {
            regs.push(Registration {
                event: event.into(),
                handler,
                options,
            });
        }
    }

    fn remove_event_listener(&self, event: &str, handler: &Handler<E>, options: ListenerOptions) {
        let Ok(mut regs) = self.registrations.lock() else {
            error!("event listeners poisoned, can't remove {event} listener");
            return;
        };

        regs.retain(|r| {
            !(r.event == event && Arc::ptr_eq(&r.handler, handler) && r.options.capture == options.capture)
        });
    }
}
