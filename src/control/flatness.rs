//! Differential flatness control law.
//!
//! A desired force fixes the thrust direction (body +Z) of the vehicle, and
//! the desired yaw fixes the remaining degree of freedom. The resulting
//! attitude is compared to the current one with the vee-map of the
//! antisymmetric error matrix, and the error is turned into body rates with a
//! proportional gain.

use crate::state::ControlCommand;
use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use num_traits::Float;

/// Norm below which a vector is treated as zero.
pub const EPSILON: f64 = 1e-9;

/// Calculate the desired force from the feedback correction,
/// the acceleration feed forward and gravity compensation.
///
/// `gravity` is the gravitational acceleration of the working frame,
/// e.g. `(0, 0, -9.81)` in ENU.
pub fn desired_force(
    force_error: Vector3<f64>,
    mass: f64,
    acceleration_reference: Vector3<f64>,
    gravity: Vector3<f64>,
) -> Vector3<f64> {
    force_error + mass * acceleration_reference - mass * gravity
}

/// Calculate the desired rotation matrix for a desired force and yaw angle (in radians).
///
/// The columns are the desired body axes in the working frame.
/// If the force vanishes the current thrust axis is kept, and if the heading
/// projection is parallel to the thrust axis the current heading is kept, so
/// the result is always a proper rotation.
pub fn desired_attitude(
    force: Vector3<f64>,
    yaw: f64,
    attitude: &UnitQuaternion<f64>,
) -> Matrix3<f64> {
    let rotation = attitude.to_rotation_matrix();
    let actual = rotation.matrix();

    let zb_des = force
        .try_normalize(EPSILON)
        .unwrap_or_else(|| actual.column(2).into_owned());

    // Desired heading projected on the horizontal plane
    let xc_des = Vector3::new(yaw.cos(), yaw.sin(), 0.);

    let yb_des = zb_des
        .cross(&xc_des)
        .try_normalize(EPSILON)
        .unwrap_or_else(|| hold_heading(&zb_des, actual));
    let xb_des = yb_des.cross(&zb_des).normalize();

    Matrix3::from_columns(&[xb_des, yb_des, zb_des])
}

/// The current body Y axis made orthogonal to `zb_des`.
fn hold_heading(zb_des: &Vector3<f64>, actual: &Matrix3<f64>) -> Vector3<f64> {
    let yb: Vector3<f64> = actual.column(1).into_owned();
    let xb: Vector3<f64> = actual.column(0).into_owned();

    (yb - zb_des * zb_des.dot(&yb))
        .try_normalize(EPSILON)
        .unwrap_or_else(|| zb_des.cross(&xb).normalize())
}

/// The vee-map converts a skew-symmetric matrix to a vector.
pub fn vee(mat: &Matrix3<f64>) -> Vector3<f64> {
    Vector3::new(mat[(2, 1)], mat[(0, 2)], mat[(1, 0)])
}

/// Rotation error between the desired and actual rotation matrices,
/// `vee(R_desᵀ R - Rᵀ R_des) / 2`.
pub fn rotation_error(desired: &Matrix3<f64>, actual: &Matrix3<f64>) -> Vector3<f64> {
    let error = desired.transpose() * actual - actual.transpose() * desired;
    vee(&error) / 2.
}

/// Body rate command opposing the rotation error.
pub fn rate_command(angular_gains: &Matrix3<f64>, rotation_error: Vector3<f64>) -> Vector3<f64> {
    -(angular_gains * rotation_error)
}

/// Calculate the body rates and the thrust along the current body +Z axis
/// that track the desired force with the desired yaw angle (in radians).
pub fn control(
    force: Vector3<f64>,
    yaw: f64,
    attitude: &UnitQuaternion<f64>,
    angular_gains: &Matrix3<f64>,
) -> ControlCommand {
    let rotation = attitude.to_rotation_matrix();
    let actual = rotation.matrix();

    let desired = desired_attitude(force, yaw, attitude);
    let error = rotation_error(&desired, actual);

    let thrust_axis: Vector3<f64> = actual.column(2).into_owned();

    ControlCommand {
        angular_rate: rate_command(angular_gains, error),
        thrust: force.dot(&thrust_axis.normalize()),
    }
}

/// The yaw angle (in radians) of an attitude.
pub fn yaw(attitude: &UnitQuaternion<f64>) -> f64 {
    attitude.euler_angles().2
}
