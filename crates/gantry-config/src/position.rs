use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Canvas coordinates of a node. Render-only; no graph logic reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
  pub x: f64,
  pub y: f64,
}

impl Position {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

impl Add for Position {
  type Output = Position;

  fn add(self, rhs: Position) -> Position {
    Position::new(self.x + rhs.x, self.y + rhs.y)
  }
}
