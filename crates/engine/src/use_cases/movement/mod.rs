//! Player movement use cases.

mod player_body;

pub use player_body::{Direction, MovementInput, PlayerBody, DIAGONAL_SCALE, PLAYER_SPEED};
