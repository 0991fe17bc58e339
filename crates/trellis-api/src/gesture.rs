//! Drag gesture events delivered by the host's gesture capture

use serde::{Deserialize, Serialize};

use crate::{Point, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GesturePhase {
    Start,
    Hover,
    End,
}

/// Where the dragged node sat when the gesture started
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DragOrigin {
    pub parent_id: Option<String>,
    /// Index of the dragged row in the rendered list
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum GestureEvent {
    Start {
        dragged_id: String,
        origin: DragOrigin,
    },
    Hover {
        pointer: Point,
        hovered_id: String,
        hovered_rect: Rect,
    },
    /// Pointer release; terminates the session unconditionally
    End,
}

impl GestureEvent {
    pub fn phase(&self) -> GesturePhase {
        match self {
            GestureEvent::Start { .. } => GesturePhase::Start,
            GestureEvent::Hover { .. } => GesturePhase::Hover,
            GestureEvent::End => GesturePhase::End,
        }
    }

    pub fn start(dragged_id: impl Into<String>, origin: DragOrigin) -> Self {
        GestureEvent::Start {
            dragged_id: dragged_id.into(),
            origin,
        }
    }

    pub fn hover(pointer: Point, hovered_id: impl Into<String>, hovered_rect: Rect) -> Self {
        GestureEvent::Hover {
            pointer,
            hovered_id: hovered_id.into(),
            hovered_rect,
        }
    }
}
