//! Action handlers: observers of what running programs do.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};
use worms_core::EntityId;

/// Receives a notification for every effect a program produces.
///
/// Handlers are called after the world has applied the effect.
pub trait ActionHandler: Send + Sync {
    fn print(&self, text: &str);

    fn moved(&self, _worm: EntityId) {}

    fn turned(&self, _worm: EntityId, _angle: f64) {}

    fn jumped(&self, _worm: EntityId) {}

    fn fired(&self, _worm: EntityId, _yield_percent: u32) {}

    /// Toggling selects the next weapon; handlers that don't tell the two
    /// apart only implement `selected_next_weapon`.
    fn toggled_weapon(&self, worm: EntityId) {
        self.selected_next_weapon(worm);
    }

    fn selected_next_weapon(&self, _worm: EntityId) {}
}

/// Handler that turns every notification into a log event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHandler;

impl ActionHandler for TracingHandler {
    fn print(&self, text: &str) {
        info!(event = "program_print", text = %text);
    }

    fn moved(&self, worm: EntityId) {
        debug!(event = "program_move", worm = %worm);
    }

    fn turned(&self, worm: EntityId, angle: f64) {
        debug!(event = "program_turn", worm = %worm, angle);
    }

    fn jumped(&self, worm: EntityId) {
        debug!(event = "program_jump", worm = %worm);
    }

    fn fired(&self, worm: EntityId, yield_percent: u32) {
        debug!(event = "program_fire", worm = %worm, yield_percent);
    }

    fn selected_next_weapon(&self, worm: EntityId) {
        debug!(event = "program_select_weapon", worm = %worm);
    }
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HandlerEvent {
    Print { text: String },
    Moved { worm: EntityId },
    Turned { worm: EntityId, angle: f64 },
    Jumped { worm: EntityId },
    Fired { worm: EntityId, yield_percent: u32 },
    SelectedNextWeapon { worm: EntityId },
}

/// Handler that keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<HandlerEvent>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: HandlerEvent) {
        self.events.lock().push(event);
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<HandlerEvent> {
        self.events.lock().clone()
    }

    pub fn take_events(&self) -> Vec<HandlerEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Printed lines, in order
    pub fn printed(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                HandlerEvent::Print { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl ActionHandler for RecordingHandler {
    fn print(&self, text: &str) {
        self.record(HandlerEvent::Print {
            text: text.to_string(),
        });
    }

    fn moved(&self, worm: EntityId) {
        self.record(HandlerEvent::Moved { worm });
    }

    fn turned(&self, worm: EntityId, angle: f64) {
        self.record(HandlerEvent::Turned { worm, angle });
    }

    fn jumped(&self, worm: EntityId) {
        self.record(HandlerEvent::Jumped { worm });
    }

    fn fired(&self, worm: EntityId, yield_percent: u32) {
        self.record(HandlerEvent::Fired {
            worm,
            yield_percent,
        });
    }

    fn selected_next_weapon(&self, worm: EntityId) {
        self.record(HandlerEvent::SelectedNextWeapon { worm });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_handler() {
        let handler = RecordingHandler::new();
        let worm = EntityId(7);
        handler.print("hello");
        handler.moved(worm);
        handler.toggled_weapon(worm);

        assert_eq!(handler.printed(), vec!["hello".to_string()]);
        assert_eq!(
            handler.events(),
            vec![
                HandlerEvent::Print {
                    text: "hello".to_string()
                },
                HandlerEvent::Moved { worm },
                HandlerEvent::SelectedNextWeapon { worm },
            ]
        );

        assert_eq!(handler.take_events().len(), 3);
        assert!(handler.events().is_empty());
    }

    #[test]
    fn test_handler_event_json() {
        let json = serde_json::to_value(HandlerEvent::Fired {
            worm: EntityId(3),
            yield_percent: 40,
        })
        .unwrap();
        assert_eq!(json["event"], "fired");
        assert_eq!(json["yield_percent"], 40);
    }
}
