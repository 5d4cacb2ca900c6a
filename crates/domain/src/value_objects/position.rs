//! Planar world position

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// A point in village world units (screen-aligned, y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Build a position from untrusted input (roster files), rejecting NaN and infinities.
    pub fn checked(x: f32, y: f32) -> Result<Self, DomainError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(DomainError::validation(format!(
                "position ({}, {}) is not finite",
                x, y
            )));
        }
        Ok(Self::new(x, y))
    }

    /// Euclidean distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Move by `(dx, dy)` scaled by `dt`
    pub fn advanced(&self, dx: f32, dy: f32, dt: f32) -> Self {
        Self::new(self.x + dx * dt, self.y + dy * dt)
    }
}
