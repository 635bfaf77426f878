//! Tile grid collider
//!
//! A boolean occupancy grid over fixed-size cells. Coordinates passed to the
//! `*_at` methods and to [`GridCollider::overlaps`] are local pixels relative to
//! the grid's top-left corner; cell coordinates are plain column/row indices.

use serde::{Deserialize, Serialize};

use super::rect::Rect;

/// How cells outside the grid answer occupancy queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutOfBounds {
    /// Everything outside the grid is empty space
    #[default]
    Open,
    /// Everything outside the grid is solid (closed levels)
    Solid,
}

/// Boolean occupancy grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCollider {
    columns: i32,
    rows: i32,
    cell_width: i32,
    cell_height: i32,
    /// Occupied cells, row-major
    cells: Vec<bool>,
    out_of_bounds: OutOfBounds,
}

impl GridCollider {
    /// Create an empty grid of `columns × rows` cells.
    ///
    /// # Errors
    ///
    /// Returns [`CollisionError::InvalidGrid`] if any dimension is zero or negative,
    /// or if the cell count does not fit in an `i32`.
    pub fn new(
        columns: i32,
        rows: i32,
        cell_width: i32,
        cell_height: i32,
    ) -> Result<Self, CollisionError> {
        let invalid = CollisionError::InvalidGrid {
            columns,
            rows,
            cell_width,
            cell_height,
        };
        if columns <= 0 || rows <= 0 || cell_width <= 0 || cell_height <= 0 {
            return Err(invalid);
        }
        let Some(len) = columns.checked_mul(rows) else {
            return Err(invalid);
        };

        Ok(Self {
            columns,
            rows,
            cell_width,
            cell_height,
            cells: vec![false; len as usize],
            out_of_bounds: OutOfBounds::Open,
        })
    }

    /// Set the policy for queries outside the grid
    #[must_use]
    pub fn with_out_of_bounds(mut self, policy: OutOfBounds) -> Self {
        self.out_of_bounds = policy;
        self
    }

    /// Create a grid from rows of text, `1`/`#` occupied and `0`/`.` empty.
    ///
    /// Blank lines are skipped. Every row must be `columns` wide.
    ///
    /// # Errors
    ///
    /// Returns an error if the dimensions are invalid or the text does not match them.
    pub fn from_str_rows(
        data: &str,
        cell_width: i32,
        cell_height: i32,
    ) -> Result<Self, CollisionError> {
        let lines: Vec<&str> = data
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let columns = lines.first().map_or(0, |l| l.chars().count()) as i32;
        let mut grid = Self::new(columns, lines.len() as i32, cell_width, cell_height)?;
        grid.load_str(data)?;
        Ok(grid)
    }

    /// Number of columns
    #[must_use]
    pub fn columns(&self) -> i32 {
        self.columns
    }

    /// Number of rows
    #[must_use]
    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Cell width in pixels
    #[must_use]
    pub fn cell_width(&self) -> i32 {
        self.cell_width
    }

    /// Cell height in pixels
    #[must_use]
    pub fn cell_height(&self) -> i32 {
        self.cell_height
    }

    /// Total width in pixels
    #[must_use]
    pub fn width(&self) -> i32 {
        self.columns * self.cell_width
    }

    /// Total height in pixels
    #[must_use]
    pub fn height(&self) -> i32 {
        self.rows * self.cell_height
    }

    /// Out-of-bounds query policy
    #[must_use]
    pub fn out_of_bounds(&self) -> OutOfBounds {
        self.out_of_bounds
    }

    fn index(&self, cx: i32, cy: i32) -> Option<usize> {
        if cx < 0 || cy < 0 || cx >= self.columns || cy >= self.rows {
            return None;
        }
        Some((cy * self.columns + cx) as usize)
    }

    /// Convert local pixel coordinates to the containing cell (floor division)
    #[must_use]
    pub fn cell_at(&self, x: i32, y: i32) -> (i32, i32) {
        (x.div_euclid(self.cell_width), y.div_euclid(self.cell_height))
    }

    /// Check if a cell is occupied
    #[must_use]
    pub fn occupied(&self, cx: i32, cy: i32) -> bool {
        match self.index(cx, cy) {
            Some(i) => self.cells[i],
            None => self.out_of_bounds == OutOfBounds::Solid,
        }
    }

    /// Check if the cell under a local pixel coordinate is occupied
    #[must_use]
    pub fn occupied_at(&self, x: i32, y: i32) -> bool {
        let (cx, cy) = self.cell_at(x, y);
        self.occupied(cx, cy)
    }

    /// Set a cell. Cells outside the grid are ignored.
    pub fn set(&mut self, cx: i32, cy: i32, occupied: bool) {
        if let Some(i) = self.index(cx, cy) {
            self.cells[i] = occupied;
        }
    }

    /// Set the cell under a local pixel coordinate
    pub fn set_at(&mut self, x: i32, y: i32, occupied: bool) {
        let (cx, cy) = self.cell_at(x, y);
        self.set(cx, cy, occupied);
    }

    /// Fill a `w × h` block of cells starting at `(cx, cy)`
    pub fn set_rect(&mut self, cx: i32, cy: i32, w: i32, h: i32, occupied: bool) {
        let x0 = cx.max(0);
        let y0 = cy.max(0);
        let x1 = cx.saturating_add(w).min(self.columns);
        let y1 = cy.saturating_add(h).min(self.rows);

        for y in y0..y1 {
            for x in x0..x1 {
                self.cells[(y * self.columns + x) as usize] = occupied;
            }
        }
    }

    /// Set every cell
    pub fn clear(&mut self, occupied: bool) {
        self.cells.fill(occupied);
    }

    /// Number of occupied cells
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    /// Overwrite the grid from rows of text (see [`GridCollider::from_str_rows`]).
    ///
    /// # Errors
    ///
    /// Returns [`CollisionError::InvalidMapData`] on unknown characters or a
    /// row/column count that does not match the grid. The grid is unchanged on error.
    pub fn load_str(&mut self, data: &str) -> Result<(), CollisionError> {
        let mut cells = Vec::with_capacity(self.cells.len());
        let mut rows = 0;

        for line in data.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let before = cells.len();
            for c in line.chars() {
                match c {
                    '1' | '#' => cells.push(true),
                    '0' | '.' => cells.push(false),
                    other => {
                        return Err(CollisionError::InvalidMapData(format!(
                            "unexpected character {other:?} in row {rows}"
                        )));
                    }
                }
            }
            if (cells.len() - before) as i32 != self.columns {
                return Err(CollisionError::InvalidMapData(format!(
                    "row {rows} has {} cells, expected {}",
                    cells.len() - before,
                    self.columns
                )));
            }
            rows += 1;
        }

        if rows != self.rows {
            return Err(CollisionError::InvalidMapData(format!(
                "found {rows} rows, expected {}",
                self.rows
            )));
        }

        self.cells = cells;
        Ok(())
    }

    /// Check if any occupied cell lies under a rectangle in local pixels
    #[must_use]
    pub fn overlaps(&self, area: &Rect) -> bool {
        if area.is_empty() {
            return false;
        }

        let (x0, y0) = self.cell_at(area.x, area.y);
        let (x1, y1) = self.cell_at(area.right() - 1, area.bottom() - 1);

        let outside = x0 < 0 || y0 < 0 || x1 >= self.columns || y1 >= self.rows;
        if outside && self.out_of_bounds == OutOfBounds::Solid {
            return true;
        }

        let (x0, y0) = (x0.max(0), y0.max(0));
        let (x1, y1) = (x1.min(self.columns - 1), y1.min(self.rows - 1));

        (y0..=y1).any(|y| (x0..=x1).any(|x| self.cells[(y * self.columns + x) as usize]))
    }
}

/// Errors raised while building collision data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionError {
    /// Grid dimensions must all be positive
    InvalidGrid {
        columns: i32,
        rows: i32,
        cell_width: i32,
        cell_height: i32,
    },
    /// Text map data could not be parsed
    InvalidMapData(String),
}

impl std::fmt::Display for CollisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGrid {
                columns,
                rows,
                cell_width,
                cell_height,
            } => write!(
                f,
                "Invalid grid: {columns}x{rows} cells of {cell_width}x{cell_height} pixels"
            ),
            Self::InvalidMapData(e) => write!(f, "Invalid map data: {e}"),
        }
    }
}

impl std::error::Error for CollisionError {}
