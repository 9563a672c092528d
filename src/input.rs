//! Pointer and touch input smoothing, plus the scoped listener registry.
//!
//! Raw pointer/touch events are committed into a normalized 2D target by
//! event handlers; the frame loop reads the latest committed value once per
//! frame via [`InputInterpolator::sample`], which never blocks. Everything
//! runs on one thread, so the execution model itself is the mutual
//! exclusion: handlers are the sole writers, the frame loop the reader.

use instant::{Duration, Instant};

/// External triggers the scene reacts to, already translated out of the
/// windowing layer.
#[derive(Clone, Debug)]
pub enum InputEvent {
    /// Global pointer position in surface pixels.
    PointerMove { x: f32, y: f32 },
    TouchStart { x: f32, y: f32 },
    TouchMove { x: f32, y: f32 },
    TouchEnd,
    /// Pointer entered / left the designated hover region.
    HoverEnter,
    HoverLeave,
    Resize { width: u32, height: u32 },
}

/// Per-axis interpolation coefficients for the head-tracking lerp.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Smoothing {
    pub x: f32,
    pub y: f32,
}

/// Gain applied to the final touch delta so a release reads as a fling
/// rather than a dead stop.
const FLING_GAIN: f32 = 3.0;

/// Converts raw pointer/touch events into a smoothed 2D target in [-1, 1],
/// decoupled from frame rate.
pub struct InputInterpolator {
    viewport: (f32, f32),
    target: (f32, f32),
    smoothing: Smoothing,
    mouse_smoothing: Smoothing,
    flung_smoothing: Smoothing,
    touch_debounce: Duration,
    touch_armed_at: Option<Instant>,
    last_touch: Option<(f32, f32)>,
    last_delta: (f32, f32),
}

impl InputInterpolator {
    pub fn new(
        viewport: (u32, u32),
        mouse_smoothing: Smoothing,
        flung_smoothing: Smoothing,
        touch_debounce: Duration,
    ) -> Self {
        Self {
            viewport: (viewport.0.max(1) as f32, viewport.1.max(1) as f32),
            target: (0.0, 0.0),
            smoothing: mouse_smoothing,
            mouse_smoothing,
            flung_smoothing,
            touch_debounce,
            touch_armed_at: None,
            last_touch: None,
            last_delta: (0.0, 0.0),
        }
    }

    /// Latest committed target and the smoothing factors to apply to it.
    /// Returns the declared default `(0, 0)` before any event arrives.
    pub fn sample(&self) -> ((f32, f32), Smoothing) {
        (self.target, self.smoothing)
    }

    pub fn handle(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::PointerMove { x, y } => {
                self.target = self.normalize(x, y);
                self.smoothing = self.mouse_smoothing;
            }
            InputEvent::TouchStart { x, y } => {
                self.touch_armed_at = Some(Instant::now());
                self.last_touch = Some(self.normalize(x, y));
                self.last_delta = (0.0, 0.0);
            }
            InputEvent::TouchMove { x, y } => {
                let armed = self
                    .touch_armed_at
                    .map(|t| t.elapsed() >= self.touch_debounce)
                    .unwrap_or(false);
                if !armed {
                    return;
                }
                let current = self.normalize(x, y);
                if let Some(previous) = self.last_touch {
                    self.last_delta = (current.0 - previous.0, current.1 - previous.1);
                }
                self.last_touch = Some(current);
                // Touch-move tracks the finger 1:1 in the normalized space.
                self.target = current;
                self.smoothing = self.mouse_smoothing;
            }
            InputEvent::TouchEnd => {
                if self.touch_armed_at.take().is_some() {
                    self.target = (
                        (self.target.0 + self.last_delta.0 * FLING_GAIN).clamp(-1.0, 1.0),
                        (self.target.1 + self.last_delta.1 * FLING_GAIN).clamp(-1.0, 1.0),
                    );
                    self.smoothing = self.flung_smoothing;
                }
                self.last_touch = None;
            }
            InputEvent::Resize { width, height } => {
                if width > 0 && height > 0 {
                    self.viewport = (width as f32, height as f32);
                }
            }
            InputEvent::HoverEnter | InputEvent::HoverLeave => {}
        }
    }

    /// Map surface pixels into [-1, 1], x right-positive, y up-positive.
    fn normalize(&self, x: f32, y: f32) -> (f32, f32) {
        (
            ((x / self.viewport.0) * 2.0 - 1.0).clamp(-1.0, 1.0),
            (1.0 - (y / self.viewport.1) * 2.0).clamp(-1.0, 1.0),
        )
    }
}

/// Handle returned by [`Listeners::register`]; passing it back to
/// [`Listeners::remove`] is the disposer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(usize);

type Handler = Box<dyn FnMut(&InputEvent)>;

/// Scoped listener registry. Each registration returns a [`ListenerId`];
/// the lifecycle collects the ids and removes them in reverse-registration
/// order during teardown, so no handler leaks even if initialization
/// partially failed.
#[derive(Default)]
pub struct Listeners {
    entries: Vec<Option<Handler>>,
    registered: usize,
    removed: usize,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Handler) -> ListenerId {
        self.entries.push(Some(handler));
        self.registered += 1;
        ListenerId(self.entries.len() - 1)
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.entries.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                self.removed += 1;
                true
            }
            _ => false,
        }
    }

    pub fn dispatch(&mut self, event: &InputEvent) {
        for entry in self.entries.iter_mut().flatten() {
            entry(event);
        }
    }

    /// Number of live registrations; zero after a complete teardown.
    pub fn active(&self) -> usize {
        self.registered - self.removed
    }

    pub fn registered(&self) -> usize {
        self.registered
    }

    pub fn removed(&self) -> usize {
        self.removed
    }
}
