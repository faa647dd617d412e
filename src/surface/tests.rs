use approx::assert_relative_eq;
use nalgebra::{Point3, Point4, Vector3};

use crate::errors::SurfoError;
use crate::surface::Surface;

/// Flat bilinear patch spanning the unit square: S(u, v) = (u, v, 0)
fn bilinear_patch() -> Surface<f64> {
    let mut surface = Surface::new();
    surface.set_degree_u(1);
    surface.set_degree_v(1);
    surface.set_knot_vector_u(vec![0., 0., 1., 1.]).unwrap();
    surface.set_knot_vector_v(vec![0., 0., 1., 1.]).unwrap();
    surface
        .set_control_net(vec![
            vec![Point3::new(0., 0., 0.), Point3::new(0., 1., 0.)],
            vec![Point3::new(1., 0., 0.), Point3::new(1., 1., 0.)],
        ])
        .unwrap();
    surface
}

/// Biquadratic Bezier patch with a unit bump at the central control point
fn biquadratic_patch() -> Surface<f64> {
    let mut surface = Surface::new();
    surface.set_degree_u(2);
    surface.set_degree_v(2);
    surface.set_knot_vector_u(vec![0., 0., 0., 1., 1., 1.]).unwrap();
    surface.set_knot_vector_v(vec![0., 0., 0., 1., 1., 1.]).unwrap();
    let grid = (0..3)
        .map(|i| {
            (0..3)
                .map(|j| {
                    let z = if i == 1 && j == 1 { 1. } else { 0. };
                    Point3::new(i as f64, j as f64, z)
                })
                .collect()
        })
        .collect();
    surface.set_control_net(grid).unwrap();
    surface
}

#[test]
fn evaluate_covers_both_endpoints() {
    let mut surface = bilinear_patch();
    surface.set_delta(0.1).unwrap();
    let points = surface.evaluate().unwrap();
    assert_eq!(points.len(), 121);
    assert_relative_eq!(points[0], Point3::new(0., 0., 0.), epsilon = 1e-12);
    assert_relative_eq!(points[120], Point3::new(1., 1., 0.), epsilon = 1e-12);
}

#[test]
fn bilinear_patch_midpoint() {
    let mut surface = bilinear_patch();
    surface.set_delta(0.5).unwrap();
    let points = surface.evaluate().unwrap();
    // v-major ordering: the middle of the 3x3 sample grid is (0.5, 0.5)
    assert_eq!(points.len(), 9);
    assert_relative_eq!(points[4], Point3::new(0.5, 0.5, 0.), epsilon = 1e-12);
}

#[test]
fn evaluate_is_idempotent() {
    let mut surface = biquadratic_patch();
    surface.set_delta(0.25).unwrap();
    let first = surface.evaluate().unwrap().to_vec();
    let second = surface.evaluate().unwrap().to_vec();
    assert_eq!(first, second);
}

#[test]
fn setters_invalidate_cached_points() {
    let mut surface = bilinear_patch();
    surface.set_delta(0.25).unwrap();
    surface.evaluate().unwrap();
    assert!(!surface.surface_points().is_empty());

    surface.set_delta(0.5).unwrap();
    assert!(surface.surface_points().is_empty());

    surface.evaluate().unwrap();
    surface.set_degree_u(1);
    assert!(surface.surface_points().is_empty());

    surface.evaluate().unwrap();
    surface.set_weights(vec![1.; 4]).unwrap();
    assert!(surface.surface_points().is_empty());
}

#[test]
fn rational_with_unit_weights_matches_nonrational() {
    let mut surface = biquadratic_patch();
    surface.set_delta(0.125).unwrap();
    let plain = surface.evaluate().unwrap().to_vec();
    let rational = surface.evaluate_rational().unwrap().to_vec();
    assert_eq!(plain.len(), rational.len());
    for (p, r) in plain.iter().zip(rational.iter()) {
        assert_relative_eq!(p, r, epsilon = 1e-12);
    }
}

#[test]
fn rational_is_invariant_under_uniform_weight_scaling() {
    let mut surface = biquadratic_patch();
    surface.set_delta(0.25).unwrap();
    let plain = surface.evaluate().unwrap().to_vec();
    surface.set_weights(vec![2.; 9]).unwrap();
    let rational = surface.evaluate_rational().unwrap().to_vec();
    for (p, r) in plain.iter().zip(rational.iter()) {
        assert_relative_eq!(p, r, epsilon = 1e-12);
    }
}

#[test]
fn rational_with_nonuniform_weights_pulls_toward_heavy_points() {
    let mut surface = biquadratic_patch();
    surface.set_delta(0.5).unwrap();
    let plain = surface.evaluate().unwrap().to_vec();
    let mut weights = vec![1.; 9];
    weights[4] = 10.; // central control point
    surface.set_weights(weights).unwrap();
    let rational = surface.evaluate_rational().unwrap().to_vec();
    // the midpoint sample moves toward the heavy bump control point
    assert!(rational[4].z > plain[4].z);
}

#[test]
fn derivative_table_order_zero_is_the_surface_point() {
    let mut surface = biquadratic_patch();
    surface.set_delta(0.5).unwrap();
    let points = surface.evaluate().unwrap().to_vec();
    let skl = surface.derivatives(0.5, 0.5, 2).unwrap();
    assert_relative_eq!(Point3::from(skl[0][0]), points[4], epsilon = 1e-12);
}

#[test]
fn derivative_table_is_triangularly_truncated() {
    let surface = biquadratic_patch();
    // order 1 on a biquadratic surface: the mixed entry stays zero
    let skl = surface.derivatives(0.25, 0.75, 1).unwrap();
    assert_eq!(skl.len(), 2);
    assert_eq!(skl[0].len(), 2);
    assert_eq!(skl[1][1], Vector3::zeros());

    // order 2: k = 2 leaves no room for l > 0
    let skl = surface.derivatives(0.25, 0.75, 2).unwrap();
    assert_ne!(skl[1][1], Vector3::zeros());
    assert_eq!(skl[2][1], Vector3::zeros());
    assert_eq!(skl[2][2], Vector3::zeros());
}

#[test]
fn tangent_of_bilinear_patch() {
    let surface = bilinear_patch();
    let (point, der_u, der_v) = surface.tangent(0.25, 0.75).unwrap();
    assert_relative_eq!(point, Point3::new(0.25, 0.75, 0.), epsilon = 1e-12);
    assert_relative_eq!(der_u, Vector3::new(1., 0., 0.), epsilon = 1e-12);
    assert_relative_eq!(der_v, Vector3::new(0., 1., 0.), epsilon = 1e-12);
}

#[test]
fn tangent_of_biquadratic_patch_at_center() {
    let surface = biquadratic_patch();
    let (point, der_u, der_v) = surface.tangent(0.5, 0.5).unwrap();
    assert_relative_eq!(point, Point3::new(1., 1., 0.25), epsilon = 1e-12);
    assert_relative_eq!(der_u, Vector3::new(2., 0., 0.), epsilon = 1e-12);
    assert_relative_eq!(der_v, Vector3::new(0., 2., 0.), epsilon = 1e-12);
}

#[test]
fn normal_of_flat_patch_is_constant() {
    let surface = bilinear_patch();
    for &(u, v) in &[(0.5, 0.5), (0.25, 0.75), (0.9, 0.1)] {
        let normal = surface.normal(u, v, true).unwrap();
        assert_relative_eq!(normal, Vector3::new(0., 0., 1.), epsilon = 1e-12);
    }
    // without normalization the cross product magnitude survives
    let normal = surface.normal(0.5, 0.5, false).unwrap();
    assert_relative_eq!(normal, Vector3::new(0., 0., 1.), epsilon = 1e-12);
}

#[test]
fn normal_rejects_boundary_parameters() {
    let surface = bilinear_patch();
    assert!(matches!(
        surface.normal(0.0, 0.5, true),
        Err(SurfoError::DomainError { .. })
    ));
    assert!(matches!(
        surface.normal(0.5, 1.0, true),
        Err(SurfoError::DomainError { .. })
    ));
    // within one delta of the boundary is rejected too
    assert!(matches!(
        surface.normal(0.005, 0.5, true),
        Err(SurfoError::DomainError { .. })
    ));
}

#[test]
fn normal_rejects_degenerate_cross_product() {
    let mut surface = Surface::new();
    surface.set_degree_u(1);
    surface.set_degree_v(1);
    surface.set_knot_vector_u(vec![0., 0., 1., 1.]).unwrap();
    surface.set_knot_vector_v(vec![0., 0., 1., 1.]).unwrap();
    // all control points on one line: the tangent vectors are parallel
    surface
        .set_control_net(vec![
            vec![Point3::new(0., 0., 0.), Point3::new(1., 0., 0.)],
            vec![Point3::new(1., 0., 0.), Point3::new(2., 0., 0.)],
        ])
        .unwrap();
    assert!(matches!(
        surface.normal(0.5, 0.5, true),
        Err(SurfoError::DegenerateNormal { .. })
    ));
}

#[test]
fn evaluation_requires_complete_configuration() {
    let mut surface = Surface::<f64>::new();
    assert!(matches!(
        surface.evaluate(),
        Err(SurfoError::PreconditionNotMet(_))
    ));

    surface.set_degree_u(1);
    surface.set_degree_v(1);
    assert!(matches!(
        surface.evaluate(),
        Err(SurfoError::PreconditionNotMet(_))
    ));
    assert!(matches!(
        surface.derivatives(0.5, 0.5, 1),
        Err(SurfoError::PreconditionNotMet(_))
    ));
}

#[test]
fn evaluation_rejects_mismatched_knot_vector_length() {
    let mut surface = bilinear_patch();
    // a knot vector sized for three control points, net only has two
    surface
        .set_knot_vector_u(vec![0., 0., 0.5, 1., 1.])
        .unwrap();
    assert!(matches!(
        surface.evaluate(),
        Err(SurfoError::PreconditionNotMet(_))
    ));
}

#[test]
fn control_net_must_fit_the_degrees() {
    let mut surface = Surface::new();
    surface.set_degree_u(2);
    surface.set_degree_v(2);
    let result = surface.set_control_net(vec![
        vec![Point3::new(0., 0., 0.), Point3::new(0., 1., 0.)],
        vec![Point3::new(1., 0., 0.), Point3::new(1., 1., 0.)],
    ]);
    assert!(matches!(result, Err(SurfoError::InvalidInput(_))));
}

#[test]
fn delta_must_lie_in_the_open_unit_interval() {
    let mut surface = bilinear_patch();
    assert!(surface.set_delta(0.).is_err());
    assert!(surface.set_delta(1.).is_err());
    assert!(surface.set_delta(-0.1).is_err());
    assert!(surface.set_delta(0.3).is_ok());
}

#[test]
fn derivatives_reject_out_of_domain_parameters() {
    let surface = bilinear_patch();
    assert!(matches!(
        surface.derivatives(1.5, 0.5, 1),
        Err(SurfoError::InvalidInput(_))
    ));
    assert!(matches!(
        surface.derivatives(0.5, -0.5, 1),
        Err(SurfoError::InvalidInput(_))
    ));
}

#[test]
fn homogeneous_control_net_round_trip() {
    let mut surface = Surface::new();
    surface.set_degree_u(1);
    surface.set_degree_v(1);
    surface.set_knot_vector_u(vec![0., 0., 1., 1.]).unwrap();
    surface.set_knot_vector_v(vec![0., 0., 1., 1.]).unwrap();
    surface
        .set_homogeneous_control_net(&[
            vec![Point4::new(0., 0., 0., 1.), Point4::new(0., 2., 0., 2.)],
            vec![Point4::new(1., 0., 0., 1.), Point4::new(3., 3., 0., 3.)],
        ])
        .unwrap();

    let net = surface.control_net().unwrap();
    assert_relative_eq!(*net.point(0, 1), Point3::new(0., 1., 0.), epsilon = 1e-12);
    assert_relative_eq!(*net.point(1, 1), Point3::new(1., 1., 0.), epsilon = 1e-12);
    assert_eq!(net.weight(1, 1), 3.);
}

#[test]
fn knot_vectors_are_normalized_on_assignment() {
    let mut surface = Surface::new();
    surface.set_degree_u(2);
    surface.set_knot_vector_u(vec![0., 0., 0., 2., 2., 2.]).unwrap();
    assert_eq!(
        surface.knot_vector_u().unwrap().to_vec(),
        vec![0., 0., 0., 1., 1., 1.]
    );
}
