//! Scene value type: a background reference plus placed glyph elements.
//!
//! # Responsibility
//! - Hold the pure document content with no persistence or fetch behavior.
//! - Provide element mutation helpers and the persisted byte encoding.
//!
//! # Invariants
//! - `id` is unique within `elements`; ids are assigned monotonically and
//!   never reused within a scene's lifetime.
//! - `encode` is deterministic (stable field order) and infallible for a
//!   well-formed in-memory scene.
//! - Setting the background is pure assignment; any fetch is the owning
//!   controller's concern.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Scene-unique identifier for one placed element.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ElementId = u64;

/// One placed glyph with position and size.
///
/// Positions are unclamped; off-canvas coordinates are legal and the
/// presentation layer decides what is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Stable id within the owning scene.
    pub id: ElementId,
    /// Glyph string (typically a single emoji/grapheme, not enforced).
    pub text: String,
    /// Horizontal center position in scene units.
    pub x: i64,
    /// Vertical center position in scene units.
    pub y: i64,
    /// Rendered size in scene units.
    pub size: i64,
}

/// Error decoding persisted scene bytes.
///
/// Never fatal: callers substitute an empty scene and continue.
#[derive(Debug)]
pub struct SceneDecodeError(serde_json::Error);

impl Display for SceneDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed scene payload: {}", self.0)
    }
}

impl Error for SceneDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

/// Serializable content of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Background resource URL; `None` means no background.
    background: Option<String>,
    /// Placed elements in insertion order.
    elements: Vec<Element>,
    /// Next id to hand out. Not persisted; recomputed as `max(id) + 1`
    /// on decode, which is safe because elements are never removed.
    #[serde(skip)]
    next_id: ElementId,
}

impl Scene {
    /// Creates an empty scene with no background.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the scene to its persisted JSON byte form.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("scene serialization is infallible")
    }

    /// Decodes persisted scene bytes.
    ///
    /// # Errors
    /// - Returns `SceneDecodeError` on malformed or truncated input.
    ///   Callers fall back to `Scene::new()` instead of propagating.
    pub fn decode(bytes: &[u8]) -> Result<Self, SceneDecodeError> {
        let mut scene: Self = serde_json::from_slice(bytes).map_err(SceneDecodeError)?;
        scene.next_id = scene
            .elements
            .iter()
            .map(|element| element.id + 1)
            .max()
            .unwrap_or(0);
        Ok(scene)
    }

    /// Appends one element and returns its freshly assigned id.
    pub fn add_element(&mut self, text: impl Into<String>, x: i64, y: i64, size: i64) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.push(Element {
            id,
            text: text.into(),
            x,
            y,
            size,
        });
        id
    }

    /// Moves one element by integer deltas.
    ///
    /// Returns whether the element existed; an absent `id` is a no-op.
    /// Positions are not clamped, off-canvas coordinates are legal.
    pub fn move_element(&mut self, id: ElementId, dx: i64, dy: i64) -> bool {
        match self.elements.iter_mut().find(|element| element.id == id) {
            Some(element) => {
                element.x += dx;
                element.y += dy;
                true
            }
            None => false,
        }
    }

    /// Rescales one element's size.
    ///
    /// Returns whether the element existed; an absent `id` is a no-op.
    /// Uses round-half-to-even so that repeated small pinch deltas do not
    /// accumulate a directional bias.
    pub fn resize_element(&mut self, id: ElementId, scale: f64) -> bool {
        match self.elements.iter_mut().find(|element| element.id == id) {
            Some(element) => {
                element.size = round_half_to_even(element.size as f64 * scale);
                true
            }
            None => false,
        }
    }

    /// Replaces the background reference. Pure assignment, no fetch.
    pub fn set_background(&mut self, url: Option<String>) {
        self.background = url;
    }

    /// Returns the background URL, if any.
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    /// Returns the placed elements in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Looks up one element by id.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }
}

/// Banker's rounding to the nearest integer.
///
/// `f64::round` rounds halves away from zero, which compounds upward under
/// repeated scale gestures; ties must go to the even neighbor instead.
fn round_half_to_even(value: f64) -> i64 {
    let floor = value.floor();
    let fraction = value - floor;
    let below = floor as i64;
    if fraction > 0.5 {
        below + 1
    } else if fraction < 0.5 {
        below
    } else if below % 2 == 0 {
        below
    } else {
        below + 1
    }
}
