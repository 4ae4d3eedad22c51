use std::fmt;
use std::sync::Arc;

use log::trace;
use serde::Deserialize;

use super::mouse::{
    Element, Point, PointerEvent, PointerOptions, PointerSnapshot, PointerTracker, Position, Rect,
    StaticElement, StaticWindow, MOUSE_EVENTS, TOUCH_END, TOUCH_EVENTS,
};

/// A recorded pointer session: an element's bounds, the page scroll and
/// the events that happened over it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRequest {
    #[serde(default)]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub scroll: Position,
    #[serde(default)]
    pub options: PointerOptions,
    pub events: Vec<ReplayEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayEvent {
    #[serde(rename = "type")]
    pub name: String,
    #[serde(flatten)]
    pub point: Point,
    #[serde(default)]
    pub touches: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "unknown pointer event {:?}", self.0)
    }
}

impl std::error::Error for UnknownEvent {}

impl ReplayEvent {
    fn into_event(self) -> Result<(String, PointerEvent), UnknownEvent> {
        let event = if MOUSE_EVENTS.contains(&self.name.as_str()) {
            PointerEvent::Mouse(self.point)
        } else if TOUCH_EVENTS.contains(&self.name.as_str()) || self.name == TOUCH_END {
            PointerEvent::Touch {
                touches: self.touches,
            }
        } else {
            return Err(UnknownEvent(self.name));
        };

        Ok((self.name, event))
    }
}

/// Play `req.events` through a fresh tracker and report where it ended up.
pub fn replay(req: ReplayRequest) -> Result<PointerSnapshot, UnknownEvent> {
    let events = req
        .events
        .into_iter()
        .map(ReplayEvent::into_event)
        .collect::<Result<Vec<_>, _>>()?;

    let element = req
        .rect
        .map(|rect| Arc::new(StaticElement(Some(rect))) as Arc<dyn Element>);
    let window = Arc::new(StaticWindow::new(req.scroll));

    let tracker = PointerTracker::new(element, req.options);
    let _tracking = tracker.start(&window);

    trace!("replaying {} pointer events", events.len());
    for (name, event) in &events {
        window.dispatch(name, event);
    }

    Ok(tracker.snapshot())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pointer::SourceType;

    #[test]
    fn replays_json() {
        let req: ReplayRequest = serde_json::from_str(
            r#"{
                "rect": { "left": 10, "top": 10, "width": 100, "height": 100 },
                "scroll": { "x": 0, "y": 5 },
                "events": [
                    { "type": "mousemove", "pageX": 20, "pageY": 20 },
                    { "type": "touchmove", "touches": [{ "pageX": 30, "pageY": 40 }] }
                ]
            }"#,
        )
        .unwrap();

        let snap = replay(req).unwrap();

        assert_eq!((snap.x, snap.y), (30.0, 40.0));
        assert_eq!(snap.source_type, Some(SourceType::Touch));
        assert_eq!((snap.element_x, snap.element_y), (20, 25));
        assert!(!snap.is_outside);
    }

    #[test]
    fn touch_end_honours_options() {
        let req: ReplayRequest = serde_json::from_str(
            r#"{
                "options": { "resetOnTouchEnds": true, "initialValue": { "x": 3, "y": 4 } },
                "events": [
                    { "type": "touchstart", "touches": [{ "pageX": 30, "pageY": 40 }] },
                    { "type": "touchend" }
                ]
            }"#,
        )
        .unwrap();

        let snap = replay(req).unwrap();
        assert_eq!((snap.x, snap.y), (3.0, 4.0));
    }

    #[test]
    fn unknown_events_are_rejected() {
        let req: ReplayRequest =
            serde_json::from_str(r#"{ "events": [{ "type": "click" }] }"#).unwrap();

        assert_eq!(replay(req).unwrap_err(), UnknownEvent("click".into()));
    }
}
