use itertools::iproduct;
use nalgebra::{Point3, Point4, Vector3, Vector4};

use crate::control_net::{dehomogenize, ControlNet};
use crate::errors::{Result, SurfoError};
use crate::knot::KnotVector;
use crate::FloatingPoint;

/// Tensor-product B-spline / NURBS surface configuration and evaluation state.
///
/// Degrees, knot vectors, control net and sampling delta are assigned through
/// setters; every setter ends in an explicit [`Surface::invalidate_cache`] so
/// the point list produced by the last bulk evaluation can never go stale.
///
/// # Example
/// ```
/// use nalgebra::Point3;
/// use surfo::prelude::*;
///
/// let mut surface = Surface::new();
/// surface.set_degree_u(1);
/// surface.set_degree_v(1);
/// surface.set_knot_vector_u(vec![0., 0., 1., 1.]).unwrap();
/// surface.set_knot_vector_v(vec![0., 0., 1., 1.]).unwrap();
/// surface
///     .set_control_net(vec![
///         vec![Point3::new(0., 0., 0.), Point3::new(0., 1., 0.)],
///         vec![Point3::new(1., 0., 0.), Point3::new(1., 1., 0.)],
///     ])
///     .unwrap();
/// surface.set_delta(0.1).unwrap();
///
/// let points = surface.evaluate().unwrap();
/// assert_eq!(points.len(), 121);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Surface<T: FloatingPoint> {
    degree_u: usize,
    degree_v: usize,
    knots_u: Option<KnotVector<T>>,
    knots_v: Option<KnotVector<T>>,
    control_net: Option<ControlNet<T>>,
    delta: T,
    surface_points: Vec<Point3<T>>,
}

impl<T: FloatingPoint> Default for Surface<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatingPoint> Surface<T> {
    pub fn new() -> Self {
        Self {
            degree_u: 0,
            degree_v: 0,
            knots_u: None,
            knots_v: None,
            control_net: None,
            delta: T::from_f64(0.01).unwrap(),
            surface_points: vec![],
        }
    }

    pub fn degree_u(&self) -> usize {
        self.degree_u
    }

    pub fn degree_v(&self) -> usize {
        self.degree_v
    }

    pub fn knot_vector_u(&self) -> Option<&KnotVector<T>> {
        self.knots_u.as_ref()
    }

    pub fn knot_vector_v(&self) -> Option<&KnotVector<T>> {
        self.knots_v.as_ref()
    }

    pub fn control_net(&self) -> Option<&ControlNet<T>> {
        self.control_net.as_ref()
    }

    pub fn delta(&self) -> T {
        self.delta
    }

    /// The points produced by the last bulk evaluation, in v-major order
    /// (outer loop over v, inner loop over u). Empty until [`Surface::evaluate`]
    /// or [`Surface::evaluate_rational`] has run, and cleared by every setter.
    pub fn surface_points(&self) -> &[Point3<T>] {
        &self.surface_points
    }

    pub fn set_degree_u(&mut self, degree: usize) {
        self.invalidate_cache();
        self.degree_u = degree;
    }

    pub fn set_degree_v(&mut self, degree: usize) {
        self.invalidate_cache();
        self.degree_v = degree;
    }

    /// Assign the u knot vector, normalizing it to [0, 1] on the way in
    pub fn set_knot_vector_u(&mut self, knots: Vec<T>) -> Result<()> {
        let knots = KnotVector::try_normalized(knots)?;
        self.invalidate_cache();
        self.knots_u = Some(knots);
        Ok(())
    }

    /// Assign the v knot vector, normalizing it to [0, 1] on the way in
    pub fn set_knot_vector_v(&mut self, knots: Vec<T>) -> Result<()> {
        let knots = KnotVector::try_normalized(knots)?;
        self.invalidate_cache();
        self.knots_v = Some(knots);
        Ok(())
    }

    /// Assign the control net and reset all weights to one.
    ///
    /// The outer index of `grid` runs along the u direction, so the grid
    /// needs at least `degree_u + 1` rows and every row at least
    /// `degree_v + 1` points.
    pub fn set_control_net(&mut self, grid: Vec<Vec<Point3<T>>>) -> Result<()> {
        let net = ControlNet::from_grid(grid)?;
        self.check_net_sizes(&net)?;
        self.invalidate_cache();
        self.control_net = Some(net);
        Ok(())
    }

    /// Assign the control net from homogeneous (weighted) control points,
    /// recovering positions and weights by the perspective divide
    pub fn set_homogeneous_control_net(&mut self, grid: &[Vec<Point4<T>>]) -> Result<()> {
        let net = ControlNet::try_from_homogeneous(grid)?;
        self.check_net_sizes(&net)?;
        self.invalidate_cache();
        self.control_net = Some(net);
        Ok(())
    }

    /// Assign weights from a flat row-major vector, one per control point
    pub fn set_weights(&mut self, weights: Vec<T>) -> Result<()> {
        let net = self.control_net.as_mut().ok_or_else(|| {
            SurfoError::PreconditionNotMet("control net must be set before weights".into())
        })?;
        net.set_weights(weights)?;
        self.invalidate_cache();
        Ok(())
    }

    /// Assign the sampling step used by the bulk evaluators; must lie in (0, 1)
    pub fn set_delta(&mut self, delta: T) -> Result<()> {
        if delta <= T::zero() || delta >= T::one() {
            return Err(SurfoError::InvalidInput(
                "delta must lie strictly between 0 and 1".into(),
            ));
        }
        self.invalidate_cache();
        self.delta = delta;
        Ok(())
    }

    /// Drop the cached surface points
    pub fn invalidate_cache(&mut self) {
        self.surface_points.clear();
    }

    /// Verify the configuration is complete and consistent, returning the
    /// pieces every evaluation needs
    pub(crate) fn checked_config(
        &self,
    ) -> Result<(&KnotVector<T>, &KnotVector<T>, &ControlNet<T>)> {
        if self.degree_u == 0 || self.degree_v == 0 {
            return Err(SurfoError::PreconditionNotMet(
                "degrees must be set and positive in both directions".into(),
            ));
        }
        let knots_u = self
            .knots_u
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SurfoError::PreconditionNotMet("u knot vector is not set".into()))?;
        let knots_v = self
            .knots_v
            .as_ref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SurfoError::PreconditionNotMet("v knot vector is not set".into()))?;
        let net = self
            .control_net
            .as_ref()
            .ok_or_else(|| SurfoError::PreconditionNotMet("control net is not set".into()))?;

        if knots_u.len() != net.size_u() + self.degree_u + 1 {
            return Err(SurfoError::PreconditionNotMet(format!(
                "u knot vector length {} does not fit {} control points of degree {}",
                knots_u.len(),
                net.size_u(),
                self.degree_u
            )));
        }
        if knots_v.len() != net.size_v() + self.degree_v + 1 {
            return Err(SurfoError::PreconditionNotMet(format!(
                "v knot vector length {} does not fit {} control points of degree {}",
                knots_v.len(),
                net.size_v(),
                self.degree_v
            )));
        }

        Ok((knots_u, knots_v, net))
    }

    /// Evaluate the surface on the regular (u, v) grid with step delta,
    /// treating the net as an ordinary (non-rational) B-spline surface.
    ///
    /// The sampled points are cached on the surface and returned.
    pub fn evaluate(&mut self) -> Result<&[Point3<T>]> {
        self.invalidate_cache();

        let points = {
            let (knots_u, knots_v, net) = self.checked_config()?;
            let params = sample_parameters(self.delta);
            let bases_u = spanned_basis_functions(knots_u, self.degree_u, net.size_u(), &params)?;
            let bases_v = spanned_basis_functions(knots_v, self.degree_v, net.size_v(), &params)?;

            let mut points = Vec::with_capacity(params.len() * params.len());
            for (j, i) in iproduct!(0..params.len(), 0..params.len()) {
                let (span_u, basis_u) = &bases_u[i];
                let (span_v, basis_v) = &bases_v[j];
                let uind = span_u - self.degree_u;
                let vind = span_v - self.degree_v;

                let mut position = Vector3::zeros();
                for l in 0..=self.degree_v {
                    // sample the u isoline for this basis row
                    let mut temp = Vector3::zeros();
                    for k in 0..=self.degree_u {
                        temp += net.point(uind + k, vind + l).coords * basis_u[k];
                    }
                    position += temp * basis_v[l];
                }
                points.push(Point3::from(position));
            }
            points
        };

        self.surface_points = points;
        Ok(&self.surface_points)
    }

    /// Evaluate the NURBS surface on the regular (u, v) grid with step delta,
    /// accumulating homogeneous coordinates and projecting each sample back
    /// to 3D
    pub fn evaluate_rational(&mut self) -> Result<&[Point3<T>]> {
        self.invalidate_cache();

        let points = {
            let (knots_u, knots_v, net) = self.checked_config()?;
            let homogeneous = net.to_homogeneous();
            let params = sample_parameters(self.delta);
            let bases_u = spanned_basis_functions(knots_u, self.degree_u, net.size_u(), &params)?;
            let bases_v = spanned_basis_functions(knots_v, self.degree_v, net.size_v(), &params)?;

            let mut points = Vec::with_capacity(params.len() * params.len());
            for (j, i) in iproduct!(0..params.len(), 0..params.len()) {
                let (span_u, basis_u) = &bases_u[i];
                let (span_v, basis_v) = &bases_v[j];
                let uind = span_u - self.degree_u;
                let vind = span_v - self.degree_v;

                let mut position = Vector4::zeros();
                for l in 0..=self.degree_v {
                    let mut temp = Vector4::zeros();
                    for k in 0..=self.degree_u {
                        temp += homogeneous[uind + k][vind + l].coords * basis_u[k];
                    }
                    position += temp * basis_v[l];
                }
                points.push(dehomogenize(&Point4::from(position))?);
            }
            points
        };

        self.surface_points = points;
        Ok(&self.surface_points)
    }

    fn check_net_sizes(&self, net: &ControlNet<T>) -> Result<()> {
        if net.size_u() < self.degree_u + 1 {
            return Err(SurfoError::InvalidInput(format!(
                "number of control points in the u direction ({}) must be at least degree + 1 ({})",
                net.size_u(),
                self.degree_u + 1
            )));
        }
        if net.size_v() < self.degree_v + 1 {
            return Err(SurfoError::InvalidInput(format!(
                "number of control points in the v direction ({}) must be at least degree + 1 ({})",
                net.size_v(),
                self.degree_v + 1
            )));
        }
        Ok(())
    }
}

/// The regular sample grid over [0, 1] with the given step, inclusive of
/// both endpoints whether or not the step divides one evenly
fn sample_parameters<T: FloatingPoint>(delta: T) -> Vec<T> {
    let tolerance = T::default_epsilon() * T::from_f64(8.0).unwrap();
    let mut params = vec![];
    let mut i = 0usize;
    loop {
        let t = T::from_usize(i).unwrap() * delta;
        if t >= T::one() - tolerance {
            break;
        }
        params.push(t);
        i += 1;
    }
    params.push(T::one());
    params
}

/// Locate the span and non-vanishing basis functions for every parameter value
#[allow(clippy::type_complexity)]
fn spanned_basis_functions<T: FloatingPoint>(
    knots: &KnotVector<T>,
    degree: usize,
    num_ctrlpts: usize,
    params: &[T],
) -> Result<Vec<(usize, Vec<T>)>> {
    params
        .iter()
        .map(|&u| {
            let span = knots.find_span(degree, num_ctrlpts, u)?;
            Ok((span, knots.basis_functions(span, u, degree)))
        })
        .collect()
}
