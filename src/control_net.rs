use nalgebra::{Point3, Point4};

use crate::errors::{Result, SurfoError};
use crate::FloatingPoint;

/// 2D grid of control points with a parallel weight grid.
///
/// The outer index runs along the u direction, the inner index along v;
/// both grids are rectangular and always have the same shape. The flat
/// row-major form is derived on demand rather than stored.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlNet<T: FloatingPoint> {
    points: Vec<Vec<Point3<T>>>,
    weights: Vec<Vec<T>>,
}

impl<T: FloatingPoint> ControlNet<T> {
    /// Build a control net with uniform unit weights (ordinary B-spline form).
    pub fn from_grid(points: Vec<Vec<Point3<T>>>) -> Result<Self> {
        let weights = points.iter().map(|row| vec![T::one(); row.len()]).collect();
        Self::try_new(points, weights)
    }

    /// Build a control net from a point grid and a same-shaped weight grid.
    pub fn try_new(points: Vec<Vec<Point3<T>>>, weights: Vec<Vec<T>>) -> Result<Self> {
        if points.is_empty() || points[0].is_empty() {
            return Err(SurfoError::InvalidInput("control net is empty".into()));
        }
        let cols = points[0].len();
        if points.iter().any(|row| row.len() != cols) {
            return Err(SurfoError::InvalidInput(
                "control net rows have inconsistent lengths".into(),
            ));
        }
        if weights.len() != points.len()
            || weights
                .iter()
                .zip(points.iter())
                .any(|(w, p)| w.len() != p.len())
        {
            return Err(SurfoError::InvalidInput(
                "weight grid does not match the control net shape".into(),
            ));
        }
        Ok(Self { points, weights })
    }

    /// Number of control points in the u direction
    pub fn size_u(&self) -> usize {
        self.points.len()
    }

    /// Number of control points in the v direction
    pub fn size_v(&self) -> usize {
        self.points[0].len()
    }

    pub fn point(&self, i: usize, j: usize) -> &Point3<T> {
        &self.points[i][j]
    }

    pub fn weight(&self, i: usize, j: usize) -> T {
        self.weights[i][j]
    }

    pub fn points(&self) -> &[Vec<Point3<T>>] {
        &self.points
    }

    /// Flat row-major view of the grid (u rows concatenated), computed on demand
    pub fn flattened(&self) -> Vec<Point3<T>> {
        self.points.iter().flatten().copied().collect()
    }

    /// Flat row-major view of the weight grid
    pub fn flattened_weights(&self) -> Vec<T> {
        self.weights.iter().flatten().copied().collect()
    }

    /// Replace the weight grid from a flat row-major vector
    pub fn set_weights(&mut self, weights: Vec<T>) -> Result<()> {
        let expected = self.size_u() * self.size_v();
        if weights.len() != expected {
            return Err(SurfoError::InvalidInput(format!(
                "expected {} weights, got {}",
                expected,
                weights.len()
            )));
        }
        self.weights = weights
            .chunks(self.size_v())
            .map(|chunk| chunk.to_vec())
            .collect();
        Ok(())
    }

    /// Lift every control point into homogeneous form (x·w, y·w, z·w, w),
    /// index-aligned with the grid
    pub fn to_homogeneous(&self) -> Vec<Vec<Point4<T>>> {
        self.points
            .iter()
            .zip(self.weights.iter())
            .map(|(prow, wrow)| {
                prow.iter()
                    .zip(wrow.iter())
                    .map(|(p, &w)| Point4::new(p.x * w, p.y * w, p.z * w, w))
                    .collect()
            })
            .collect()
    }

    /// Recover positions and weights from a grid of homogeneous control points
    pub fn try_from_homogeneous(points: &[Vec<Point4<T>>]) -> Result<Self> {
        let mut grid = Vec::with_capacity(points.len());
        let mut weights = Vec::with_capacity(points.len());
        for row in points {
            let mut prow = Vec::with_capacity(row.len());
            let mut wrow = Vec::with_capacity(row.len());
            for p in row {
                prow.push(dehomogenize(p)?);
                wrow.push(p.w);
            }
            grid.push(prow);
            weights.push(wrow);
        }
        Self::try_new(grid, weights)
    }
}

/// Project a homogeneous point back to 3D by the perspective divide
pub fn dehomogenize<T: FloatingPoint>(point: &Point4<T>) -> Result<Point3<T>> {
    let w = point.w;
    if w.abs() <= T::default_epsilon() {
        return Err(SurfoError::DivisionByZero(
            "zero weight component in homogeneous point".into(),
        ));
    }
    Ok(Point3::new(point.x / w, point.y / w, point.z / w))
}
