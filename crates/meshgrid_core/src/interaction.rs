//! Pointer and touch interaction source.
//!
//! Normalizes host (client) coordinates into canvas space and keeps a single
//! "interaction point" that effects read once per frame. Pointer moves are
//! coalesced: only the latest sample is committed by [`InteractionSource::commit_frame`].
//!
//! Touch gestures are classified by their early motion. The first axis whose
//! cumulative travel exceeds the other decides: vertical means the user is
//! scrolling the page and interaction is suppressed until the touch ends.

use crate::math::{Rect, Size, Vec2};

/// Maximum travel (client pixels) for a touch to still count as a tap.
pub const TAP_SLOP: f32 = 10.0;

/// Classification of the current touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchIntent {
    /// No axis has dominated yet.
    #[default]
    Undecided,
    /// Horizontal motion dominated; the touch drives interaction.
    Drag,
    /// Vertical motion dominated; the page is scrolling.
    Scroll,
}

/// Discrete interaction forwarded to effects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Pointer click at a canvas position.
    Click(Vec2),
    /// Touch tap (not a scroll or drag) at a canvas position.
    Tap(Vec2),
    /// Pointer entered the host.
    PointerEnter,
    /// A touch gesture ended.
    TouchRelease,
}

/// The interaction point effects see for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionSample {
    /// Canvas-space position of the pointer or touch.
    pub position: Vec2,
    /// True if `position` should drive pointer-following effects.
    pub interacting: bool,
}

impl InteractionSample {
    /// A sample with no interaction.
    pub const IDLE: Self = Self {
        position: Vec2::ZERO,
        interacting: false,
    };

    /// The interaction point, if interacting.
    #[must_use]
    pub fn point(&self) -> Option<Vec2> {
        self.interacting.then_some(self.position)
    }
}

#[derive(Debug, Clone, Copy)]
struct TouchTrack {
    start: Vec2,
    last: Vec2,
    intent: TouchIntent,
}

/// Result of a touch ending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEnd {
    /// Canvas position if the gesture qualified as a tap.
    pub tap: Option<Vec2>,
}

/// Interaction state for one grid host.
#[derive(Debug, Clone, Default)]
pub struct InteractionSource {
    canvas: Size,
    bounds: Rect,
    current: Option<Vec2>,
    pending: Option<Vec2>,
    touch: Option<TouchTrack>,
    sample: InteractionSample,
}

impl InteractionSource {
    /// Creates a source for a canvas whose client bounds equal its size.
    #[must_use]
    pub fn new(canvas: Size) -> Self {
        Self {
            canvas,
            bounds: Rect::new(0.0, 0.0, canvas.width, canvas.height),
            ..Self::default()
        }
    }

    /// Updates the canvas size.
    pub fn set_canvas(&mut self, canvas: Size) {
        self.canvas = canvas;
    }

    /// Updates the host's client-space bounding rect.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    /// Maps a client-space point into canvas space.
    #[must_use]
    pub fn to_canvas(&self, client: Vec2) -> Vec2 {
        self.bounds.map_to_canvas(client, self.canvas)
    }

    /// Pointer entered the host; stale positions are dropped.
    pub fn pointer_enter(&mut self) -> Gesture {
        self.current = None;
        self.pending = None;
        Gesture::PointerEnter
    }

    /// Pointer moved; applied at the next frame commit.
    pub fn pointer_move(&mut self, client: Vec2) {
        self.pending = Some(self.to_canvas(client));
    }

    /// Pointer left the host.
    pub fn pointer_leave(&mut self) {
        self.current = None;
        self.pending = None;
    }

    /// Pointer click.
    #[must_use]
    pub fn click(&self, client: Vec2) -> Gesture {
        Gesture::Click(self.to_canvas(client))
    }

    /// A single touch began.
    pub fn touch_start(&mut self, client: Vec2) {
        self.touch = Some(TouchTrack {
            start: client,
            last: client,
            intent: TouchIntent::Undecided,
        });
        self.current = Some(self.to_canvas(client));
        self.pending = None;
    }

    /// The active touch moved. Returns the gesture classification.
    pub fn touch_move(&mut self, client: Vec2) -> TouchIntent {
        let Some(track) = self.touch.as_mut() else {
            return TouchIntent::Undecided;
        };
        track.last = client;

        if track.intent == TouchIntent::Undecided {
            let delta = client - track.start;
            if delta.y.abs() > delta.x.abs() {
                track.intent = TouchIntent::Scroll;
            } else if delta.x.abs() > delta.y.abs() {
                track.intent = TouchIntent::Drag;
            }
        }

        let intent = track.intent;
        if intent == TouchIntent::Scroll {
            self.current = None;
            self.pending = None;
        } else {
            self.pending = Some(self.to_canvas(client));
        }
        intent
    }

    /// The active touch ended.
    pub fn touch_end(&mut self) -> TouchEnd {
        let tap = self.touch.take().and_then(|track| {
            let travel = track.last.distance(track.start);
            (track.intent != TouchIntent::Scroll && travel <= TAP_SLOP)
                .then(|| self.to_canvas(track.last))
        });
        self.current = None;
        self.pending = None;
        TouchEnd { tap }
    }

    /// Commits the latest coalesced sample. Call once per frame.
    pub fn commit_frame(&mut self) -> InteractionSample {
        if let Some(pending) = self.pending.take() {
            self.current = Some(pending);
        }

        let touch_intent = self.touch.map(|t| t.intent);
        self.sample = match (self.current, touch_intent) {
            (_, Some(TouchIntent::Scroll)) | (None, _) => InteractionSample::IDLE,
            (Some(position), Some(_)) => InteractionSample {
                position,
                interacting: true,
            },
            (Some(position), None) => InteractionSample {
                position,
                interacting: self.canvas.contains(position),
            },
        };
        self.sample
    }

    /// The sample committed by the last frame.
    #[must_use]
    pub fn sample(&self) -> InteractionSample {
        self.sample
    }
}
