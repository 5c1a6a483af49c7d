//! Host events and the queue that carries them to a field.
//!
//! Hosts whose input arrives off the frame thread push [`HostEvent`]s through
//! an [`EventSender`]; the field drains the queue at the start of every frame.
//! The queue is bounded: when it is full new events are dropped, which only
//! ever loses redundant pointer motion in practice.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use meshgrid_core::{Rect, Vec2};

/// Default queue capacity per field.
pub const DEFAULT_CAPACITY: usize = 256;

/// Something the host environment observed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// The host element changed size.
    Resize {
        /// New container width.
        width: f32,
        /// New container height.
        height: f32,
        /// Current viewport width, for breakpoint selection.
        viewport_width: f32,
    },
    /// The host element's client-space bounding rect changed.
    Bounds(Rect),
    /// Pointer entered the host.
    PointerEnter,
    /// Pointer moved, client coordinates.
    PointerMove(Vec2),
    /// Pointer left the host.
    PointerLeave,
    /// Pointer click, client coordinates.
    Click(Vec2),
    /// Single touch began, client coordinates.
    TouchStart(Vec2),
    /// Active touch moved, client coordinates.
    TouchMove(Vec2),
    /// Active touch ended.
    TouchEnd,
    /// The host scrolled into (`true`) or out of view.
    ViewportVisibility(bool),
    /// The page became visible (`true`) or hidden.
    TabVisibility(bool),
}

/// Cloneable producer handle.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: Sender<HostEvent>,
}

impl EventSender {
    /// Queues an event without blocking. Returns false if it was dropped.
    pub fn send(&self, event: HostEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::trace!("event queue full, dropped {:?}", event);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer handle.
#[derive(Debug, Clone)]
pub struct EventReceiver {
    receiver: Receiver<HostEvent>,
}

impl EventReceiver {
    /// Drains every queued event without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = HostEvent> + '_ {
        self.receiver.try_iter()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Bounded event queue owned by one field.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: EventSender,
    receiver: EventReceiver,
}

impl EventBus {
    /// Creates a bounded queue.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self {
            sender: EventSender { sender },
            receiver: EventReceiver { receiver },
        }
    }

    /// A producer handle for another thread.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// The consumer side.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        self.receiver.clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
