//! Freehand stroke recording from an ordered pointer-event stream.
//!
//! A drawing session turns `start -> move* -> end` pointer events into
//! strokes. Strokes are append-only: once an `End` closes a stroke its
//! points never change. Only closed strokes are handed to the rasterizer
//! through [`DrawingSession::strokes`]; [`DrawingSession::snapshot`] adds the
//! stroke still being drawn for a live preview.

use serde::{Deserialize, Serialize};

use crate::pattern::{Point, Stroke};

/// A single pointer event on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    /// Pointer went down at a point; opens a new stroke.
    Start(Point),
    /// Pointer moved while down; extends the open stroke.
    Move(Point),
    /// Pointer went up; closes the open stroke.
    End,
}

/// Records strokes for one drawing session.
#[derive(Debug, Clone, Default)]
pub struct DrawingSession {
    closed: Vec<Stroke>,
    open: Option<Stroke>,
    version: u64,
}

impl DrawingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a session from previously recorded strokes.
    pub fn from_strokes(strokes: Vec<Stroke>) -> Self {
        Self {
            closed: strokes,
            open: None,
            version: 0,
        }
    }

    /// Feeds one pointer event into the session.
    pub fn apply(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Start(point) => {
                self.close_open_stroke();
                self.open = Some(Stroke {
                    points: vec![point],
                });
            }
            PointerEvent::Move(point) => {
                // A move without a start still begins a stroke.
                self.open.get_or_insert_with(Stroke::new).push(point);
            }
            PointerEvent::End => self.close_open_stroke(),
        }
        self.version = self.version.wrapping_add(1);
    }

    /// Feeds a sequence of events in order.
    pub fn apply_all(&mut self, events: impl IntoIterator<Item = PointerEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    fn close_open_stroke(&mut self) {
        if let Some(stroke) = self.open.take() {
            self.closed.push(stroke);
        }
    }

    /// Closed strokes, in recording order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.closed
    }

    /// Closed strokes plus the one currently being drawn, if any.
    pub fn snapshot(&self) -> Vec<Stroke> {
        let mut strokes = self.closed.clone();
        strokes.extend(self.open.iter().cloned());
        strokes
    }

    /// Returns true while a stroke is open.
    pub fn is_drawing(&self) -> bool {
        self.open.is_some()
    }

    /// Increments on every event or clear; used to invalidate previews.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Discards every stroke, including one in progress.
    pub fn clear(&mut self) {
        self.closed.clear();
        self.open = None;
        self.version = self.version.wrapping_add(1);
    }

    /// Ends the session, closing any open stroke.
    pub fn finish(mut self) -> Vec<Stroke> {
        self.close_open_stroke();
        self.closed
    }
}
