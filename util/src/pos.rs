/// A cell coordinate, `x` counting columns and `y` counting rows.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct Pos {
  pub x: i32,
  pub y: i32,
}

impl Pos {
  pub const fn transpose(&self) -> Self {
    Self { x: self.y, y: self.x }
  }
}
