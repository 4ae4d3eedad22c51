use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::listener::{listen, EventBus, EventTarget, Handler, ListenerOptions, Listening};

pub const MOUSE_EVENTS: [&str; 2] = ["mousemove", "dragover"];
pub const TOUCH_EVENTS: [&str; 2] = ["touchstart", "touchmove"];
pub const TOUCH_END: &str = "touchend";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Point {
    pub page_x: f64,
    pub page_y: f64,
    pub client_x: f64,
    pub client_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Mouse(Point),
    Touch { touches: Vec<Point> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateKind {
    #[default]
    Page,
    Client,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PointerOptions {
    #[serde(rename = "type")]
    pub kind: CoordinateKind,
    /// Follow touch start/move as well as the mouse.
    pub touch: bool,
    /// Go back to `initial_value` when a touch ends.
    pub reset_on_touch_ends: bool,
    pub initial_value: Position,
    /// Keep element coordinates up to date while the pointer is outside it.
    pub handle_outside: bool,
}

impl Default for PointerOptions {
    fn default() -> Self {
        Self {
            kind: CoordinateKind::Page,
            touch: true,
            reset_on_touch_ends: false,
            initial_value: Position::default(),
            handle_outside: true,
        }
    }
}

/// An element whose bounds the pointer is measured against.
pub trait Element: Send + Sync {
    /// Viewport-relative bounds, `None` until mounted.
    fn bounding_client_rect(&self) -> Option<Rect>;
}

/// Where pointer events come from.
pub trait Window: EventTarget<PointerEvent> {
    fn scroll(&self) -> Position;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerSnapshot {
    pub x: f64,
    pub y: f64,
    pub source_type: Option<SourceType>,
    pub element_x: i64,
    pub element_y: i64,
    pub element_position_x: i64,
    pub element_position_y: i64,
    pub element_width: i64,
    pub element_height: i64,
    pub is_outside: bool,
}

struct Signals {
    x: watch::Sender<f64>,
    y: watch::Sender<f64>,
    source_type: watch::Sender<Option<SourceType>>,
    element_x: watch::Sender<i64>,
    element_y: watch::Sender<i64>,
    element_position_x: watch::Sender<i64>,
    element_position_y: watch::Sender<i64>,
    element_width: watch::Sender<i64>,
    element_height: watch::Sender<i64>,
    is_outside: watch::Sender<bool>,
}

struct Inner {
    options: PointerOptions,
    element: Option<Arc<dyn Element>>,
    signals: Signals,
}

/// Tracks the pointer over a window, and relative to an element if given.
/// Nothing is listened to until [`PointerTracker::start`].
pub struct PointerTracker {
    inner: Arc<Inner>,
    attached: Arc<AtomicBool>,
}

/// Listeners added by [`PointerTracker::start`], removed on
/// [`Tracking::stop`] or drop.
#[must_use = "tracking stops when this is dropped"]
pub struct Tracking {
    listening: Vec<Listening>,
    attached: Option<Arc<AtomicBool>>,
}

fn set<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}

// Math.round: halves go up, -0.5 => 0
fn round(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

impl PointerTracker {
    pub fn new(element: Option<Arc<dyn Element>>, options: PointerOptions) -> Self {
        let mounted = element
            .as_ref()
            .is_some_and(|el| el.bounding_client_rect().is_some());

        let signals = Signals {
            x: watch::Sender::new(options.initial_value.x),
            y: watch::Sender::new(options.initial_value.y),
            source_type: watch::Sender::new(None),
            element_x: watch::Sender::new(0),
            element_y: watch::Sender::new(0),
            element_position_x: watch::Sender::new(0),
            element_position_y: watch::Sender::new(0),
            element_width: watch::Sender::new(0),
            element_height: watch::Sender::new(0),
            is_outside: watch::Sender::new(mounted),
        };

        Self {
            inner: Arc::new(Inner {
                options,
                element,
                signals,
            }),
            attached: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start listening on `window`. Starting twice, or before the element
    /// is mounted, gives a handle which tracks nothing.
    pub fn start<W>(&self, window: &Arc<W>) -> Tracking
    where
        W: Window + ?Sized + 'static,
    {
        if let Some(ref el) = self.inner.element {
            if el.bounding_client_rect().is_none() {
                debug!("pointer tracker: element not mounted, not attaching");
                return Tracking::inert();
            }
        }

        if self.attached.swap(true, Ordering::SeqCst) {
            trace!("pointer tracker already attached");
            return Tracking::inert();
        }

        let options = self.inner.options;
        let passive = ListenerOptions {
            capture: false,
            passive: true,
        };

        let on_move: Handler<PointerEvent> = {
            let inner = Arc::clone(&self.inner);
            let window = Arc::downgrade(window);
            Arc::new(move |event: &PointerEvent| {
                if inner.on_move(event) {
                    inner.update_element(&window);
                }
            })
        };

        let mut listening = vec![listen(window, &MOUSE_EVENTS, &[Arc::clone(&on_move)], passive)];

        if options.touch {
            listening.push(listen(window, &TOUCH_EVENTS, &[on_move], passive));

            if options.reset_on_touch_ends {
                let on_end: Handler<PointerEvent> = {
                    let inner = Arc::clone(&self.inner);
                    let window = Arc::downgrade(window);
                    Arc::new(move |_: &PointerEvent| {
                        inner.reset();
                        inner.update_element(&window);
                    })
                };
                listening.push(listen(window, &[TOUCH_END], &[on_end], passive));
            }
        }

        self.inner.update_element(&Arc::downgrade(window));

        Tracking {
            listening,
            attached: Some(Arc::clone(&self.attached)),
        }
    }

    pub fn x(&self) -> watch::Receiver<f64> {
        self.inner.signals.x.subscribe()
    }

    pub fn y(&self) -> watch::Receiver<f64> {
        self.inner.signals.y.subscribe()
    }

    pub fn source_type(&self) -> watch::Receiver<Option<SourceType>> {
        self.inner.signals.source_type.subscribe()
    }

    pub fn element_x(&self) -> watch::Receiver<i64> {
        self.inner.signals.element_x.subscribe()
    }

    pub fn element_y(&self) -> watch::Receiver<i64> {
        self.inner.signals.element_y.subscribe()
    }

    pub fn element_position_x(&self) -> watch::Receiver<i64> {
        self.inner.signals.element_position_x.subscribe()
    }

    pub fn element_position_y(&self) -> watch::Receiver<i64> {
        self.inner.signals.element_position_y.subscribe()
    }

    pub fn element_width(&self) -> watch::Receiver<i64> {
        self.inner.signals.element_width.subscribe()
    }

    pub fn element_height(&self) -> watch::Receiver<i64> {
        self.inner.signals.element_height.subscribe()
    }

    pub fn is_outside(&self) -> watch::Receiver<bool> {
        self.inner.signals.is_outside.subscribe()
    }

    pub fn snapshot(&self) -> PointerSnapshot {
        let s = &self.inner.signals;

        PointerSnapshot {
            x: *s.x.borrow(),
            y: *s.y.borrow(),
            source_type: *s.source_type.borrow(),
            element_x: *s.element_x.borrow(),
            element_y: *s.element_y.borrow(),
            element_position_x: *s.element_position_x.borrow(),
            element_position_y: *s.element_position_y.borrow(),
            element_width: *s.element_width.borrow(),
            element_height: *s.element_height.borrow(),
            is_outside: *s.is_outside.borrow(),
        }
    }
}

impl Inner {
    /// Returns whether the pointer position was taken from `event`.
    fn on_move(&self, event: &PointerEvent) -> bool {
        let (point, source) = match event {
            PointerEvent::Mouse(point) => (point, SourceType::Mouse),
            PointerEvent::Touch { touches } => match touches.first() {
                Some(point) => (point, SourceType::Touch),
                None => return false,
            },
        };

        let (x, y) = match self.options.kind {
            CoordinateKind::Page => (point.page_x, point.page_y),
            CoordinateKind::Client => (point.client_x, point.client_y),
        };

        set(&self.signals.x, x);
        set(&self.signals.y, y);
        set(&self.signals.source_type, Some(source));
        true
    }

    fn reset(&self) {
        let Position { x, y } = self.options.initial_value;

        set(&self.signals.x, x);
        set(&self.signals.y, y);
    }

    fn update_element<W: Window + ?Sized>(&self, window: &Weak<W>) {
        let Some(window) = window.upgrade() else {
            return;
        };
        // without an element there's nothing relative to track
        let Some(ref element) = self.element else {
            return;
        };
        let Some(rect) = element.bounding_client_rect() else {
            return;
        };

        let scroll = window.scroll();
        let s = &self.signals;
        let (x, y) = (*s.x.borrow(), *s.y.borrow());

        let pos_x = rect.left + scroll.x;
        let pos_y = rect.top + scroll.y;
        let el_x = x - pos_x;
        let el_y = y - pos_y;
        let outside = rect.width == 0.0
            || rect.height == 0.0
            || el_x < 0.0
            || el_y < 0.0
            || el_x > rect.width
            || el_y > rect.height;

        set(&s.element_position_x, round(pos_x));
        set(&s.element_position_y, round(pos_y));
        set(&s.element_width, round(rect.width));
        set(&s.element_height, round(rect.height));
        set(&s.is_outside, outside);

        if self.options.handle_outside || !outside {
            set(&s.element_x, round(el_x));
            set(&s.element_y, round(el_y));
        }
    }
}

impl Tracking {
    fn inert() -> Self {
        Self {
            listening: vec![],
            attached: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.listening.iter().any(Listening::is_attached)
    }

    pub fn stop(&mut self) {
        for l in &mut self.listening {
            l.detach();
        }
        self.listening.clear();

        if let Some(attached) = self.attached.take() {
            attached.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for Tracking {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A window with fixed scroll offsets, fed events by hand.
pub struct StaticWindow {
    events: EventBus<PointerEvent>,
    scroll: Position,
}

impl StaticWindow {
    pub fn new(scroll: Position) -> Self {
        Self {
            events: EventBus::new(),
            scroll,
        }
    }

    pub fn dispatch(&self, event: &str, payload: &PointerEvent) {
        self.events.dispatch(event, payload);
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }
}

impl EventTarget<PointerEvent> for StaticWindow {
    fn add_event_listener(&self, event: &str, handler: Handler<PointerEvent>, options: ListenerOptions) {
        self.events.add_event_listener(event, handler, options);
    }

    fn remove_event_listener(&self, event: &str, handler: &Handler<PointerEvent>, options: ListenerOptions) {
        self.events.remove_event_listener(event, handler, options);
    }
}

impl Window for StaticWindow {
    fn scroll(&self) -> Position {
        self.scroll
    }
}

/// An element that never moves.
pub struct StaticElement(pub Option<Rect>);

impl Element for StaticElement {
    fn bounding_client_rect(&self) -> Option<Rect> {
        self.0
    }
}
