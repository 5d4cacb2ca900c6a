//! Keyboard-driven player body.
//!
//! Velocity is recomputed from the held keys every frame and the position is
//! integrated over the frame's delta time. There is no acceleration.

use std::str::FromStr;

use emberglen_domain::{DomainError, Position};

/// Units per second along a single axis
pub const PLAYER_SPEED: f32 = 300.0;
/// Applied to both axes when two perpendicular keys are held
pub const DIAGONAL_SCALE: f32 = std::f32::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for Direction {
    type Err = DomainError;

    /// Accepts direction names, arrow key names and WASD
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "arrowup" | "w" => Ok(Self::Up),
            "down" | "arrowdown" | "s" => Ok(Self::Down),
            "left" | "arrowleft" | "a" => Ok(Self::Left),
            "right" | "arrowright" | "d" => Ok(Self::Right),
            other => Err(DomainError::validation(format!(
                "Unknown direction: {other}"
            ))),
        }
    }
}

/// Directions held during a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementInput {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn pressed(direction: Direction) -> Self {
        Self::none().with(direction)
    }

    pub fn with(mut self, direction: Direction) -> Self {
        match direction {
            Direction::Up => self.up = true,
            Direction::Down => self.down = true,
            Direction::Left => self.left = true,
            Direction::Right => self.right = true,
        }
        self
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Unscaled velocity for these keys. Opposite keys cancel.
    pub fn velocity(&self) -> (f32, f32) {
        let mut vx = 0.0;
        let mut vy = 0.0;
        if self.left {
            vx -= PLAYER_SPEED;
        }
        if self.right {
            vx += PLAYER_SPEED;
        }
        if self.up {
            vy -= PLAYER_SPEED;
        }
        if self.down {
            vy += PLAYER_SPEED;
        }
        if vx != 0.0 && vy != 0.0 {
            vx *= DIAGONAL_SCALE;
            vy *= DIAGONAL_SCALE;
        }
        (vx, vy)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBody {
    position: Position,
    velocity: (f32, f32),
    facing_left: bool,
}

impl PlayerBody {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            velocity: (0.0, 0.0),
            facing_left: false,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn velocity(&self) -> (f32, f32) {
        self.velocity
    }

    pub fn facing_left(&self) -> bool {
        self.facing_left
    }

    pub fn teleport(&mut self, position: Position) {
        self.position = position;
    }

    /// Set velocity from the held keys. Horizontal input also sets facing.
    pub fn apply_input(&mut self, input: &MovementInput) {
        self.velocity = input.velocity();
        if self.velocity.0 < 0.0 {
            self.facing_left = true;
        } else if self.velocity.0 > 0.0 {
            self.facing_left = false;
        }
    }

    /// Integrate the current velocity over `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Position {
        let (vx, vy) = self.velocity;
        self.position = self.position.advanced(vx, vy, dt);
        self.position
    }
}
