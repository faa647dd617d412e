use std::ops::Index;

use crate::errors::{as_f64, Result, SurfoError};
use crate::FloatingPoint;

/// Knot vector representation
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Create a knot vector normalized to the range [0, 1]
    /// by dividing every entry by the maximum entry
    /// # Example
    /// ```
    /// use surfo::prelude::*;
    /// let knots = KnotVector::try_normalized(vec![0., 0., 0., 2., 2., 2.]).unwrap();
    /// assert_eq!(knots.to_vec(), vec![0., 0., 0., 1., 1., 1.]);
    /// ```
    pub fn try_normalized(knots: Vec<T>) -> Result<Self> {
        if knots.is_empty() {
            return Err(SurfoError::InvalidInput("knot vector is empty".into()));
        }
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(SurfoError::InvalidInput(
                "knot vector must be non-decreasing".into(),
            ));
        }
        let max = knots[knots.len() - 1];
        if max <= T::zero() {
            return Err(SurfoError::InvalidInput(
                "knot vector maximum must be positive".into(),
            ));
        }
        Ok(Self(knots.into_iter().map(|k| k / max).collect()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    pub fn first(&self) -> T {
        self.0[0]
    }

    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<T> {
        self.0.iter()
    }

    /// Find the index of the knot span containing `u` by binary search,
    /// so that `knots[span] <= u < knots[span + 1]`.
    ///
    /// The upper domain boundary `u == 1.0` maps to the last valid span
    /// `num_ctrlpts - 1` since the final knots are repeated.
    /// The knot vector must satisfy `len == num_ctrlpts + degree + 1`.
    ///
    /// # Example
    /// ```
    /// use surfo::prelude::*;
    /// let knots = KnotVector::new(vec![0., 0., 0., 0.5, 1., 1., 1.]);
    /// assert_eq!(knots.find_span(2, 4, 0.25).unwrap(), 2);
    /// assert_eq!(knots.find_span(2, 4, 1.0).unwrap(), 3);
    /// ```
    pub fn find_span(&self, degree: usize, num_ctrlpts: usize, u: T) -> Result<usize> {
        if u < T::zero() || u > T::one() {
            return Err(SurfoError::InvalidInput(format!(
                "parameter {} is outside the domain [0, 1]",
                as_f64(u)
            )));
        }

        debug_assert_eq!(self.len(), num_ctrlpts + degree + 1);

        let n = num_ctrlpts - 1;
        if u >= self.0[n + 1] {
            return Ok(n);
        }
        if u <= self.0[degree] {
            return Ok(degree);
        }

        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self.0[mid] || u >= self.0[mid + 1] {
            if u < self.0[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }

        Ok(mid)
    }

    /// Compute the `degree + 1` non-vanishing basis functions at `u`
    /// on the given knot span. The returned values sum to one.
    pub fn basis_functions(&self, span: usize, u: T, degree: usize) -> Vec<T> {
        let mut basis_functions = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        basis_functions[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self.0[span + 1 - j];
            right[j] = self.0[span + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let temp = basis_functions[r] / (right[r + 1] + left[j - r]);
                basis_functions[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }

            basis_functions[j] = saved;
        }

        basis_functions
    }

    /// Compute the non-vanishing basis functions and their derivatives.
    ///
    /// Returns a table of size `(order + 1, degree + 1)` whose k-th row holds
    /// the k-th derivatives of the `degree + 1` non-vanishing basis functions;
    /// the first row is made up of the basis function values themselves.
    /// Derivatives beyond the degree vanish identically, so `order` is
    /// clamped to `degree`.
    pub fn derivative_basis_functions(
        &self,
        span: usize,
        u: T,
        degree: usize,
        order: usize,
    ) -> Result<Vec<Vec<T>>> {
        if u < T::zero() || u > T::one() {
            return Err(SurfoError::InvalidInput(format!(
                "parameter {} is outside the domain [0, 1]",
                as_f64(u)
            )));
        }

        let order = order.min(degree);

        let mut ndu = vec![vec![T::zero(); degree + 1]; degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        ndu[0][0] = T::one();

        for j in 1..=degree {
            left[j] = u - self.0[span + 1 - j];
            right[j] = self.0[span + j] - u;

            let mut saved = T::zero();
            for r in 0..j {
                // lower triangle stores the knot differences
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = ndu[r][j - 1] / ndu[j][r];

                // upper triangle stores the basis values
                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        let mut ders = vec![vec![T::zero(); degree + 1]; order + 1];
        for j in 0..=degree {
            ders[0][j] = ndu[j][degree];
        }

        let mut a = vec![vec![T::zero(); degree + 1]; 2];
        let idegree = degree as isize;
        let iorder = order as isize;

        for r in 0..=idegree {
            // alternate rows in array a
            let mut s1 = 0;
            let mut s2 = 1;
            a[0][0] = T::one();

            // back-substitute the divided differences for the kth derivative
            for k in 1..=iorder {
                let mut d = T::zero();
                let rk = r - k;
                let pk = idegree - k;

                if r >= k {
                    a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                    d = a[s2][0] * ndu[rk as usize][pk as usize];
                }

                let j1 = if rk >= -1 { 1 } else { -rk };
                let j2 = if r - 1 <= pk { k - 1 } else { idegree - r };

                for j in j1..=j2 {
                    a[s2][j as usize] = (a[s1][j as usize] - a[s1][j as usize - 1])
                        / ndu[(pk + 1) as usize][(rk + j) as usize];
                    d += a[s2][j as usize] * ndu[(rk + j) as usize][pk as usize];
                }

                let uk = k as usize;
                let ur = r as usize;
                if r <= pk {
                    a[s2][uk] = -a[s1][uk - 1] / ndu[(pk + 1) as usize][ur];
                    d += a[s2][uk] * ndu[ur][pk as usize];
                }

                ders[uk][ur] = d;

                // switch rows
                std::mem::swap(&mut s1, &mut s2);
            }
        }

        // multiply through by the factors degree! / (degree - k)!
        let mut acc = idegree;
        for k in 1..=order {
            for j in 0..=degree {
                ders[k][j] *= T::from_isize(acc).unwrap();
            }
            acc *= idegree - k as isize;
        }

        Ok(ders)
    }
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
