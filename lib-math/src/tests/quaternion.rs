use core::f64::consts::PI;

use crate::*;

/// Quaternion for a rotation of `angle` radians around the given unit axis.
fn axis_angle(axis: [f64; 3], angle: f64) -> Quaternion {
    let s = libm::sin(angle / 2.0);
    Quaternion::new(libm::cos(angle / 2.0), axis[0] * s, axis[1] * s, axis[2] * s)
}

#[test]
fn test_identity_has_no_rotation() {
    assert_eq!(Quaternion::identity().rotation_angle(), 0.0);
}

#[test]
fn test_rotation_angle_within_full_turn() {
    let test_cases = vec![
        Quaternion::new(1.0, 2.0, 3.0, 4.0),
        Quaternion::new(-0.3, 0.1, -0.9, 0.2),
        Quaternion::new(-1.0, 0.0, 0.0, 0.0),
        Quaternion::new(0.0, 0.0, 0.0, 5.0),
        Quaternion::new(1e-12, -1e-12, 3.0, 0.0),
    ];

    for q in test_cases {
        let angle = q.normalize().unwrap().rotation_angle();
        assert!((0.0..=2.0 * PI).contains(&angle), "{:?} -> {}", q, angle);
    }
}

#[test]
fn test_rotation_angle_clamps_drift() {
    // Slightly more than one because of accumulated rounding.
    let q = Quaternion::new(1.0 + 1e-15, 0.0, 0.0, 0.0);
    assert_eq!(q.rotation_angle(), 0.0);

    let q = Quaternion::new(-1.0 - 1e-15, 0.0, 0.0, 0.0);
    assert!((q.rotation_angle() - 2.0 * PI).abs() < 1e-12);
}

#[test]
fn test_rotation_angle_of_axis_angle() {
    let q = axis_angle([0.0, 1.0, 0.0], radians(30.0));
    assert!((degrees(q.rotation_angle()) - 30.0).abs() < 1e-9);
}

#[test]
fn test_normalize_rejects_degenerate() {
    assert_eq!(
        Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize(),
        Err(MathError::DegenerateQuaternion)
    );
    assert_eq!(
        Quaternion::new(f64::NAN, 0.0, 0.0, 1.0).normalize(),
        Err(MathError::DegenerateQuaternion)
    );
    assert_eq!(
        Quaternion::new(f64::INFINITY, 0.0, 0.0, 1.0).normalize(),
        Err(MathError::DegenerateQuaternion)
    );
}

#[test]
fn test_normalize_gives_unit_magnitude() {
    let q = Quaternion::new(2.0, -4.0, 1.0, 3.0).normalize().unwrap();
    assert!((q.magnitude() - 1.0).abs() < 1e-12);
}

#[test]
fn test_multiply_normalizes_inputs() {
    let a = axis_angle([1.0, 0.0, 0.0], 0.4);
    let b = axis_angle([0.0, 0.0, 1.0], -1.1);

    let scaled = a.multiply(&(b * 7.5)).unwrap();
    let unit = a * b;

    assert!(scaled.approx_eq(&unit, 1e-12), "{:?} != {:?}", scaled, unit);
}

#[test]
fn test_multiply_composes_rotations_around_same_axis() {
    let a = axis_angle([0.0, 0.0, 1.0], radians(20.0));
    let b = axis_angle([0.0, 0.0, 1.0], radians(25.0));
    let product = a.multiply(&b).unwrap();
    assert!((degrees(product.rotation_angle()) - 45.0).abs() < 1e-9);
}

#[test]
fn test_multiply_with_conjugate_is_identity() {
    let q = Quaternion::new(0.7, -0.2, 0.4, 0.1);
    let product = q.multiply(&q.conjugate()).unwrap();
    assert!(product.approx_eq(&Quaternion::identity(), 1e-12));
}

#[test]
fn test_conjugate_keeps_scalar_part() {
    let q = Quaternion::new(0.5, 0.1, -0.2, 0.3).conjugate();
    assert_eq!(q.to_array(), [0.5, -0.1, 0.2, -0.3]);
}

#[test]
fn test_angular_separation_of_same_orientation() {
    let test_cases = vec![
        Quaternion::identity(),
        axis_angle([0.0, 1.0, 0.0], 1.3),
        Quaternion::new(0.5, 0.5, 0.5, 0.5),
    ];

    for q in test_cases {
        assert!(q.angular_separation(&q).unwrap().abs() < 1e-9);
        // q and -q describe the same rotation.
        assert!(q.angular_separation(&-q).unwrap().abs() < 1e-9);
    }
}

#[test]
fn test_angular_separation_between_axis_angles() {
    let a = axis_angle([1.0, 0.0, 0.0], radians(10.0));
    let b = axis_angle([1.0, 0.0, 0.0], radians(70.0));
    let separation = a.angular_separation(&b).unwrap();
    assert!((separation - 60.0).abs() < 1e-9, "{}", separation);
}

#[test]
fn test_angular_separation_ignores_scale() {
    let a = axis_angle([0.0, 1.0, 0.0], radians(15.0));
    let b = axis_angle([0.0, 1.0, 0.0], radians(-15.0));
    let unit = a.angular_separation(&b).unwrap();
    let scaled = (a * 3.0).angular_separation(&(b * 0.25)).unwrap();
    assert!((unit - scaled).abs() < 1e-9);
}

#[test]
fn test_angular_separation_rejects_zero() {
    let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
    assert_eq!(
        Quaternion::identity().angular_separation(&zero),
        Err(MathError::DegenerateQuaternion)
    );
}
