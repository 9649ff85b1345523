//! Typed publish/subscribe channel decoupling the stores from the UI
//! fragments that react to them (legend, background switcher, detection
//! layer). Emission is synchronous and fire-and-forget; there is no replay.

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use aigle_shared::models::{Polygon, Position};

/// The closed set of events crossing component boundaries. A tagged union
/// rather than string keys, so an invalid event name cannot compile.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Layer visibility changed; legend and switchers must re-render.
    LayersUpdated,
    /// Detection data changed server-side; the detection layer must refetch.
    UpdateDetections,
    /// A single detection was edited; its detail panel must refresh.
    UpdateDetectionDetail,
    /// Navigation request: center the viewport on a coordinate.
    JumpTo { point: Position },
    /// Navigation request: outline a cadastral parcel.
    DisplayParcel { geometry: Polygon },
}

/// Payload-free discriminant of [`MapEvent`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEventKind {
    LayersUpdated,
    UpdateDetections,
    UpdateDetectionDetail,
    JumpTo,
    DisplayParcel,
}

impl MapEvent {
    pub fn kind(&self) -> MapEventKind {
        match self {
            MapEvent::LayersUpdated => MapEventKind::LayersUpdated,
            MapEvent::UpdateDetections => MapEventKind::UpdateDetections,
            MapEvent::UpdateDetectionDetail => MapEventKind::UpdateDetectionDetail,
            MapEvent::JumpTo { .. } => MapEventKind::JumpTo,
            MapEvent::DisplayParcel { .. } => MapEventKind::DisplayParcel,
        }
    }
}

type Callback = Rc<dyn Fn(&MapEvent)>;

struct Subscriber {
    id: u64,
    kind: MapEventKind,
    callback: Callback,
}

#[derive(Default)]
struct Inner {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

/// Handle returned by [`EventBus::subscribe`], usable to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

/// Cheaply clonable handle to a shared subscriber list. Single-threaded by
/// design (the whole subsystem runs on the UI thread), hence `Rc`.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for every future emission of `kind`.
    /// Subscribers registered after an emission never observe it.
    pub fn subscribe<F>(&self, kind: MapEventKind, callback: F) -> Subscription
    where
        F: Fn(&MapEvent) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            kind,
            callback: Rc::new(callback),
        });
        Subscription { id }
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.inner
            .borrow_mut()
            .subscribers
            .retain(|s| s.id != subscription.id);
    }

    /// Invokes every subscriber of the event's kind, in subscription order.
    /// A panicking subscriber is logged and skipped; the remaining
    /// subscribers still run.
    pub fn emit(&self, event: &MapEvent) {
        let kind = event.kind();
        // Snapshot before dispatch: a callback may subscribe, unsubscribe
        // or emit again, and must not hit a borrowed subscriber list.
        // Subscribers added mid-emission only see the next emission.
        let callbacks: Vec<Callback> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| Rc::clone(&s.callback))
            .collect();

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::error!(
                    ?kind,
                    "event subscriber panicked, continuing with remaining subscribers"
                );
            }
        }
    }
}
