//! Raster terrain and circle-vs-raster passability.

use serde::{Deserialize, Serialize};
use tracing::warn;
use worms_core::{Error, Position, Result};

/// How a disc relates to the terrain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// Clear of terrain, even when slightly inflated
    Passable,
    /// Passable, but touching terrain
    Contact,
    Impassable,
}

/// An immutable passable/impassable raster stretched over the world.
///
/// Row 0 holds the topmost cells: y grows upward, rows grow downward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    width: f64,
    height: f64,
    rows: usize,
    cols: usize,
    /// Row-major, `true` where passable
    cells: Vec<bool>,
    contact_inflation: f64,
}

impl TerrainGrid {
    /// Build a grid from rows of passable flags.
    ///
    /// A ragged map degrades to the empty (entirely passable) grid.
    pub fn new(width: f64, height: f64, map: Vec<Vec<bool>>) -> Result<Self> {
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "illegal world dimensions {} x {}",
                width, height
            )));
        }

        let rows = map.len();
        let cols = map.first().map_or(0, Vec::len);
        if map.iter().any(|row| row.len() != cols) {
            warn!(event = "ragged_terrain_map", rows, "terrain rows differ in length; using an empty map");
            return Ok(Self::empty(width, height));
        }

        Ok(Self {
            width,
            height,
            rows,
            cols,
            cells: map.into_iter().flatten().collect(),
            contact_inflation: 1.1,
        })
    }

    /// An entirely passable world without raster
    pub fn empty(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            rows: 0,
            cols: 0,
            cells: Vec::new(),
            contact_inflation: 1.1,
        }
    }

    /// Parse a map drawn as text: `#` is impassable, anything else passable
    pub fn from_ascii(width: f64, height: f64, lines: &[&str]) -> Result<Self> {
        let map = lines
            .iter()
            .map(|line| line.chars().map(|c| c != '#').collect())
            .collect();
        Self::new(width, height, map)
    }

    pub fn with_contact_inflation(mut self, factor: f64) -> Self {
        self.contact_inflation = factor;
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_degenerate(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    fn cell_width(&self) -> f64 {
        self.width / self.cols as f64
    }

    fn cell_height(&self) -> f64 {
        self.height / self.rows as f64
    }

    /// Column coordinate of a metre x
    pub fn col_of(&self, x: f64) -> f64 {
        x / self.cell_width()
    }

    /// Row coordinate of a metre y
    pub fn row_of(&self, y: f64) -> f64 {
        self.rows as f64 - y / self.cell_height()
    }

    pub fn x_of(&self, col: f64) -> f64 {
        self.cell_width() * col
    }

    pub fn y_of(&self, row: f64) -> f64 {
        self.height - self.cell_height() * row
    }

    /// Whether the cell at (row, col) is passable; cells off the map are
    pub fn cell(&self, row: usize, col: usize) -> bool {
        if row >= self.rows || col >= self.cols {
            return true;
        }
        self.cells[row * self.cols + col]
    }

    /// Whether every cell overlapped by the disc is passable
    pub fn is_passable(&self, position: Position, radius: f64) -> Result<bool> {
        validate_disc(position, radius)?;
        if self.is_degenerate() {
            return Ok(true);
        }

        let (x, y, r) = (position.x, position.y, radius);
        let first_row = clamp_index(self.row_of(y + r).floor(), self.rows);
        let end_row = clamp_index(self.row_of(y - r).ceil(), self.rows);

        for row in first_row..end_row {
            let top = self.y_of(row as f64);
            let bottom = self.y_of(row as f64 + 1.0);

            let half_chord = if bottom <= y && y <= top {
                // The widest point of the circle lies inside this row
                r
            } else {
                half_chord(r, top - y).max(half_chord(r, bottom - y))
            };

            let first_col = clamp_index(self.col_of(x - half_chord).floor(), self.cols);
            let end_col = clamp_index(self.col_of(x + half_chord).ceil(), self.cols);
            if (first_col..end_col).any(|col| !self.cell(row, col)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Classify the disc as clear, touching or overlapping terrain
    pub fn classify(&self, position: Position, radius: f64) -> Result<Location> {
        if !self.is_passable(position, radius)? {
            return Ok(Location::Impassable);
        }
        if !self.is_passable(position, radius * self.contact_inflation)? {
            return Ok(Location::Contact);
        }
        Ok(Location::Passable)
    }

    /// Whether the disc's bounding box lies within the world
    pub fn is_inside(&self, position: Position, radius: f64) -> bool {
        position.x - radius >= 0.0
            && position.x + radius <= self.width
            && position.y - radius >= 0.0
            && position.y + radius <= self.height
    }
}

fn validate_disc(position: Position, radius: f64) -> Result<()> {
    if radius.is_nan() || radius < 0.0 {
        return Err(Error::InvalidArgument(format!("illegal radius {}", radius)));
    }
    if !position.is_valid() {
        return Err(Error::InvalidArgument(format!(
            "illegal position {}",
            position
        )));
    }
    Ok(())
}

/// Half-chord where a horizontal line `dy` from the centre cuts the circle
fn half_chord(radius: f64, dy: f64) -> f64 {
    if dy.abs() >= radius {
        0.0
    } else {
        (radius * radius - dy * dy).sqrt()
    }
}

fn clamp_index(value: f64, len: usize) -> usize {
    if value <= 0.0 {
        0
    } else if value >= len as f64 {
        len
    } else {
        value as usize
    }
}
