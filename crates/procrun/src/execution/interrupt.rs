//! Process-wide interrupt listener
//!
//! SIGINT registration is global state, so it is owned by a single service
//! that is installed once and shared by every run. A run subscribes for the
//! time it is active and unsubscribes by dropping its
//! [`InterruptSubscription`]. An interrupt that arrives while nobody is
//! subscribed gets the default disposition, as if the listener were absent.

use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::execution::group::signal_name;

#[cfg(unix)]
const SIGINT: i32 = signal_hook::consts::SIGINT;
#[cfg(not(unix))]
const SIGINT: i32 = 2;

type Handler = Box<dyn Fn(Interrupt) + Send>;
type Subscribers = Arc<Mutex<HashMap<u64, Handler>>>;

static GLOBAL: OnceLock<InterruptListener> = OnceLock::new();

/// An interrupt delivered to the calling process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupt {
    pub signal: i32,
}

impl Interrupt {
    pub fn sigint() -> Self {
        Self { signal: SIGINT }
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "interrupted by {}", signal_name(self.signal))
    }
}

pub struct InterruptListener {
    subscribers: Subscribers,
    next_id: AtomicU64,
    active: bool,
}

impl fmt::Debug for InterruptListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptListener")
            .field("subscribers", &self.subscriber_count())
            .field("active", &self.active)
            .finish()
    }
}

impl InterruptListener {
    /// The shared listener, installed on first use
    pub fn global() -> &'static InterruptListener {
        GLOBAL.get_or_init(|| {
            let subscribers: Subscribers = Arc::new(Mutex::new(HashMap::new()));
            let active = install(Arc::clone(&subscribers));
            InterruptListener {
                subscribers,
                next_id: AtomicU64::new(0),
                active,
            }
        })
    }

    /// A listener that no signal feeds; interrupts arrive only through
    /// [`notify`](Self::notify)
    pub fn detached() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            active: false,
        }
    }

    /// Whether a signal source feeds this listener
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn subscribe<F>(&self, handler: F) -> InterruptSubscription<'_>
    where
        F: Fn(Interrupt) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.subscribers).insert(id, Box::new(handler));
        debug!("Interrupt subscriber {} registered", id);
        InterruptSubscription { id, listener: self }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Deliver `interrupt` to every current subscriber; returns how many
    /// received it
    pub fn notify(&self, interrupt: Interrupt) -> usize {
        dispatch(&self.subscribers, interrupt)
    }

    fn unsubscribe(&self, id: u64) {
        lock(&self.subscribers).remove(&id);
        debug!("Interrupt subscriber {} removed", id);
    }
}

/// Active subscription; dropping it stops delivery
pub struct InterruptSubscription<'l> {
    id: u64,
    listener: &'l InterruptListener,
}

impl fmt::Debug for InterruptSubscription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptSubscription")
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for InterruptSubscription<'_> {
    fn drop(&mut self) {
        self.listener.unsubscribe(self.id);
    }
}

fn lock(subscribers: &Subscribers) -> MutexGuard<'_, HashMap<u64, Handler>> {
    subscribers
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
}

fn dispatch(subscribers: &Subscribers, interrupt: Interrupt) -> usize {
    let subscribers = lock(subscribers);
    for handler in subscribers.values() {
        handler(interrupt);
    }
    subscribers.len()
}

#[cfg(unix)]
fn install(subscribers: Subscribers) -> bool {
    use signal_hook::iterator::Signals;
    use signal_hook::low_level::emulate_default_handler;

    let mut signals = match Signals::new([SIGINT]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Unable to listen for SIGINT, interrupts will not be forwarded: {}", e);
            return false;
        }
    };

    let spawned = std::thread::Builder::new()
        .name("procrun-interrupt".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                let interrupt = Interrupt { signal };
                if dispatch(&subscribers, interrupt) > 0 {
                    continue;
                }
                debug!("{} with no active run, applying default action", interrupt);
                if let Err(e) = emulate_default_handler(signal) {
                    warn!("Unable to apply default action for signal {}: {}", signal, e);
                }
            }
        });

    match spawned {
        Ok(_) => true,
        Err(e) => {
            warn!("Unable to start interrupt listener thread: {}", e);
            false
        }
    }
}

#[cfg(not(unix))]
fn install(_subscribers: Subscribers) -> bool {
    debug!("Interrupt forwarding is not available on this platform");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn interrupt_display_names_signal() {
        assert_eq!(Interrupt::sigint().to_string(), "interrupted by SIGINT");
    }

    #[test]
    fn notify_reaches_all_subscribers() {
        let listener = InterruptListener::detached();
        let (tx, rx) = mpsc::channel();
        let tx2 = tx.clone();

        let _first = listener.subscribe(move |i| tx.send(("first", i)).unwrap());
        let _second = listener.subscribe(move |i| tx2.send(("second", i)).unwrap());

        assert_eq!(listener.notify(Interrupt::sigint()), 2);

        let mut names: Vec<&str> = rx.try_iter().map(|(name, _)| name).collect();
        names.sort();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let listener = InterruptListener::detached();
        let (tx, rx) = mpsc::channel();

        let subscription = listener.subscribe(move |i| tx.send(i).unwrap());
        assert_eq!(listener.subscriber_count(), 1);
        drop(subscription);

        assert_eq!(listener.subscriber_count(), 0);
        assert_eq!(listener.notify(Interrupt::sigint()), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn detached_listener_is_inactive() {
        let listener = InterruptListener::detached();
        assert!(!listener.is_active());
        assert!(format!("{:?}", listener).contains("subscribers: 0"));
    }
}
