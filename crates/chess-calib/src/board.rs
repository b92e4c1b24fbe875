//! Physical checkerboard description.

use opencv::core::{Point3f, Size};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum BoardSpecError {
    #[error("checkerboard needs at least 2x2 inner corners, got {cols}x{rows}")]
    TooFewCorners { cols: i32, rows: i32 },

    #[error("square size must be positive, got {0}")]
    NonPositiveSquareSize(f64),
}

/// Inner-corner grid of a physical checkerboard.
///
/// `cols` and `rows` count *inner* corners, not squares: a board of 10x7
/// squares has 9x6 inner corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardSpec {
    /// Inner corners along the long side.
    pub cols: i32,
    /// Inner corners along the short side.
    pub rows: i32,
    /// Side length of one board square, in meters.
    pub square_size: f64,
}

impl BoardSpec {
    pub fn new(cols: i32, rows: i32, square_size: f64) -> Result<Self, BoardSpecError> {
        if cols < 2 || rows < 2 {
            return Err(BoardSpecError::TooFewCorners { cols, rows });
        }
        if square_size <= 0.0 {
            return Err(BoardSpecError::NonPositiveSquareSize(square_size));
        }
        Ok(Self {
            cols,
            rows,
            square_size,
        })
    }

    pub fn corner_count(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    /// Pattern size in the order the corner finder expects (cols, rows).
    pub fn pattern_size(&self) -> Size {
        Size::new(self.cols, self.rows)
    }

    /// Planar object points of the board corners.
    ///
    /// The board is assumed to lie in the z = 0 plane; points are row-major
    /// with x varying fastest, scaled by the square size.
    pub fn object_points(&self) -> Vec<Point3f> {
        let square = self.square_size as f32;
        let mut points = Vec::with_capacity(self.corner_count());
        for y in 0..self.rows {
            for x in 0..self.cols {
                points.push(Point3f::new(x as f32 * square, y as f32 * square, 0.0));
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_degenerate_grids() {
        assert!(matches!(
            BoardSpec::new(1, 6, 0.02),
            Err(BoardSpecError::TooFewCorners { .. })
        ));
        assert!(matches!(
            BoardSpec::new(9, 0, 0.02),
            Err(BoardSpecError::TooFewCorners { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_square_size() {
        assert!(matches!(
            BoardSpec::new(9, 6, 0.0),
            Err(BoardSpecError::NonPositiveSquareSize(_))
        ));
        assert!(matches!(
            BoardSpec::new(9, 6, -0.01),
            Err(BoardSpecError::NonPositiveSquareSize(_))
        ));
    }

    #[test]
    fn object_points_cover_the_grid_in_plane() {
        let board = BoardSpec::new(4, 3, 0.5).expect("board");
        let points = board.object_points();

        assert_eq!(points.len(), 12);
        assert!(points.iter().all(|p| p.z == 0.0));

        // x varies fastest
        assert_relative_eq!(points[0].x, 0.0);
        assert_relative_eq!(points[1].x, 0.5);
        assert_relative_eq!(points[3].x, 1.5);
        assert_relative_eq!(points[4].x, 0.0);
        assert_relative_eq!(points[4].y, 0.5);

        let last = points.last().expect("non-empty");
        assert_relative_eq!(last.x, 1.5);
        assert_relative_eq!(last.y, 1.0);
    }

    #[test]
    fn pattern_size_is_cols_by_rows() {
        let board = BoardSpec::new(9, 6, 0.02).expect("board");
        let size = board.pattern_size();
        assert_eq!((size.width, size.height), (9, 6));
    }
}
