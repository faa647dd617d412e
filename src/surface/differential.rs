use nalgebra::{Point3, Vector3};

use crate::errors::{as_f64, Result, SurfoError};
use crate::FloatingPoint;

use super::Surface;

impl<T: FloatingPoint> Surface<T> {
    /// Compute the table of mixed partial derivatives at a single (u, v)
    /// parameter pair.
    ///
    /// Entry `[k][l]` is the derivative taken k times in u and l times in v;
    /// `[0][0]` is the surface point itself. The table is truncated
    /// triangularly: entries with `k + l > order` are left at zero, and the
    /// row/column counts are clamped to `degree + 1` in each direction.
    pub fn derivatives(&self, u: T, v: T, order: usize) -> Result<Vec<Vec<Vector3<T>>>> {
        let (knots_u, knots_v, net) = self.checked_config()?;
        let degree_u = self.degree_u();
        let degree_v = self.degree_v();

        let du = order.min(degree_u);
        let dv = order.min(degree_v);

        let span_u = knots_u.find_span(degree_u, net.size_u(), u)?;
        let span_v = knots_v.find_span(degree_v, net.size_v(), v)?;
        let ders_u = knots_u.derivative_basis_functions(span_u, u, degree_u, du)?;
        let ders_v = knots_v.derivative_basis_functions(span_v, v, degree_v, dv)?;

        let mut skl = vec![vec![Vector3::zeros(); dv + 1]; du + 1];
        let mut temp = vec![Vector3::zeros(); degree_v + 1];

        for k in 0..=du {
            // contract the control window against the u derivative basis
            for s in 0..=degree_v {
                temp[s] = Vector3::zeros();
                for r in 0..=degree_u {
                    temp[s] += net
                        .point(span_u - degree_u + r, span_v - degree_v + s)
                        .coords
                        * ders_u[k][r];
                }
            }

            // then against the v derivative basis, truncating at k + l <= order
            let dd = (order - k).min(dv);
            for l in 0..=dd {
                for s in 0..=degree_v {
                    skl[k][l] += temp[s] * ders_v[l][s];
                }
            }
        }

        Ok(skl)
    }

    /// Surface point and the two first partial derivative vectors at (u, v)
    pub fn tangent(&self, u: T, v: T) -> Result<(Point3<T>, Vector3<T>, Vector3<T>)> {
        let skl = self.derivatives(u, v, 1)?;
        Ok((Point3::from(skl[0][0]), skl[1][0], skl[0][1]))
    }

    /// Surface normal at (u, v): the cross product of the u and v partial
    /// derivative vectors, optionally scaled to unit length.
    ///
    /// The parameter pair must be at least one sampling step away from every
    /// domain boundary so that both one-sided derivatives are well defined.
    pub fn normal(&self, u: T, v: T, normalized: bool) -> Result<Vector3<T>> {
        let delta = self.delta();
        if u - delta < T::zero()
            || u + delta > T::one()
            || v - delta < T::zero()
            || v + delta > T::one()
        {
            return Err(SurfoError::DomainError {
                u: as_f64(u),
                v: as_f64(v),
                delta: as_f64(delta),
            });
        }

        let skl = self.derivatives(u, v, 1)?;
        let normal = skl[1][0].cross(&skl[0][1]);
        if normal.norm() <= T::default_epsilon() {
            return Err(SurfoError::DegenerateNormal {
                u: as_f64(u),
                v: as_f64(v),
            });
        }

        Ok(if normalized { normal.normalize() } else { normal })
    }
}
