mod listener;
pub use listener::{listen, EventBus, EventTarget, Handler, ListenerOptions, Listening};

mod mouse;
pub use mouse::{
    CoordinateKind, Element, Point, PointerEvent, PointerOptions, PointerSnapshot, PointerTracker,
    Position, Rect, SourceType, StaticElement, StaticWindow, Tracking, Window,
};

mod replay;
pub use replay::{replay, ReplayEvent, ReplayRequest, UnknownEvent};
