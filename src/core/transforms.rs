//! Wheel-to-body kinematic transforms for a three-wheel omnidirectional base.
//!
//! Both transforms share their first two rows, which project the three wheel
//! quantities onto the body x and y axes. The third row differs: velocities are
//! scaled by `1/(3L)` to give the yaw rate, currents are simply averaged.

use nalgebra::{Matrix3, Vector3};

use crate::config::KinematicsConfig;

/// Body-frame velocity: linear x/y in m/s and yaw rate in rad/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyVelocity {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

/// Wheel phase currents projected onto the body frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedCurrent {
    pub ix: f64,
    pub iy: f64,
    pub iphi: f64,
}

/// Velocity (or gyro) to current ratios used as torque-like features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorqueRatios {
    pub tx: f64,
    pub ty: f64,
    pub tphi: f64,
    pub tz: f64,
}

/// First two rows shared by both transforms.
fn planar_rows(alpha: f64, theta: f64) -> [[f64; 3]; 2] {
    let k = 2.0 / 3.0;
    [
        [-k * (alpha - theta).cos(), k * alpha.sin(), k * (alpha + theta).cos()],
        [-k * (alpha - theta).sin(), -k * alpha.cos(), k * (alpha + theta).sin()],
    ]
}

/// Matrix mapping wheel angular velocities to body velocity (before scaling by R).
///
/// `alpha` is the robot orientation and `theta` the wheel angle, both in radians;
/// `wheel_base` is the wheel-to-center distance L.
pub fn velocity_matrix(alpha: f64, theta: f64, wheel_base: f64) -> Matrix3<f64> {
    let [r0, r1] = planar_rows(alpha, theta);
    let yaw = 1.0 / (3.0 * wheel_base);
    Matrix3::new(
        r0[0], r0[1], r0[2],
        r1[0], r1[1], r1[2],
        yaw, yaw, yaw,
    )
}

/// Matrix projecting the three phase currents onto the body frame.
pub fn current_matrix(alpha: f64, theta: f64) -> Matrix3<f64> {
    let [r0, r1] = planar_rows(alpha, theta);
    let third = 1.0 / 3.0;
    Matrix3::new(
        r0[0], r0[1], r0[2],
        r1[0], r1[1], r1[2],
        third, third, third,
    )
}

/// Both transforms plus the scalar constants, built once per run.
#[derive(Debug, Clone)]
pub struct KinematicModel {
    m_vel: Matrix3<f64>,
    m_current: Matrix3<f64>,
    wheel_radius: f64,
    epsilon: f64,
}

impl KinematicModel {
    pub fn new(config: &KinematicsConfig) -> Self {
        let alpha = config.orientation_deg.to_radians();
        let theta = config.wheel_angle_deg.to_radians();
        Self {
            m_vel: velocity_matrix(alpha, theta, config.wheel_base_m),
            m_current: current_matrix(alpha, theta),
            wheel_radius: config.wheel_radius_m,
            epsilon: config.epsilon,
        }
    }

    #[inline]
    pub fn velocity_matrix(&self) -> &Matrix3<f64> {
        &self.m_vel
    }

    #[inline]
    pub fn current_matrix(&self) -> &Matrix3<f64> {
        &self.m_current
    }

    /// `R * (M_vel * [w1, w2, w3])`.
    pub fn body_velocity(&self, wheel_speeds: [f64; 3]) -> BodyVelocity {
        let res = (self.m_vel * Vector3::from(wheel_speeds)) * self.wheel_radius;
        BodyVelocity {
            vx: res[0],
            vy: res[1],
            omega: res[2],
        }
    }

    /// `M_current * [i1, i2, i3]`.
    pub fn projected_current(&self, phase_currents: [f64; 3]) -> ProjectedCurrent {
        let res = self.m_current * Vector3::from(phase_currents);
        ProjectedCurrent {
            ix: res[0],
            iy: res[1],
            iphi: res[2],
        }
    }

    /// Ratios with `epsilon` added to each denominator. Never fails; a zero
    /// current gives a large but finite value.
    pub fn torque_ratios(
        &self,
        velocity: &BodyVelocity,
        current: &ProjectedCurrent,
        gyro_z: f64,
    ) -> TorqueRatios {
        let eps = self.epsilon;
        TorqueRatios {
            tx: velocity.vx / (current.ix + eps),
            ty: velocity.vy / (current.iy + eps),
            tphi: velocity.omega / (current.iphi + eps),
            tz: gyro_z / (current.iphi + eps),
        }
    }
}

impl Default for KinematicModel {
    fn default() -> Self {
        Self::new(&KinematicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_wheel_speed_reference() {
        let model = KinematicModel::default();
        let v = model.body_velocity([1.0, 0.0, 0.0]);

        // R * column 0 of M_vel with theta = 30 deg, alpha = 0, L = 0.125
        assert_relative_eq!(v.vx, 0.04 * (-2.0 / 3.0) * 30f64.to_radians().cos(), epsilon = 1e-12);
        assert_relative_eq!(v.vx, -0.023_094_010_767_585, epsilon = 1e-12);
        assert_relative_eq!(v.vy, 0.013_333_333_333_333, epsilon = 1e-12);
        assert_relative_eq!(v.omega, 0.106_666_666_666_667, epsilon = 1e-12);
    }

    #[test]
    fn test_matrices_share_planar_rows() {
        let model = KinematicModel::default();
        let (mv, mc) = (model.velocity_matrix(), model.current_matrix());

        for row in 0..2 {
            for col in 0..3 {
                assert_eq!(mv[(row, col)], mc[(row, col)]);
            }
        }
        for col in 0..3 {
            assert_relative_eq!(mv[(2, col)], 1.0 / (3.0 * 0.125));
            assert_relative_eq!(mc[(2, col)], 1.0 / 3.0);
        }
    }

    #[test]
    fn test_matrix_entries_at_default_angles() {
        let m = current_matrix(0.0, 30f64.to_radians());
        let half_sqrt3 = 3f64.sqrt() / 2.0;

        assert_relative_eq!(m[(0, 0)], -2.0 / 3.0 * half_sqrt3, epsilon = 1e-12);
        assert_relative_eq!(m[(0, 1)], 0.0, epsilon = 1e-12);
        assert_relative_eq!(m[(0, 2)], 2.0 / 3.0 * half_sqrt3, epsilon = 1e-12);
        assert_relative_eq!(m[(1, 0)], 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m[(1, 1)], -2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(m[(1, 2)], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_projected_current_matches_direct_product() {
        let model = KinematicModel::default();
        let currents = [0.3, -0.7, 1.1];
        let c = model.projected_current(currents);
        let m = model.current_matrix();

        let expected_ix: f64 = (0..3).map(|j| m[(0, j)] * currents[j]).sum();
        assert_relative_eq!(c.ix, expected_ix, epsilon = 1e-12);
        assert_relative_eq!(c.iphi, (0.3 - 0.7 + 1.1) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tphi_and_tz_share_denominator() {
        let model = KinematicModel::default();
        let velocity = model.body_velocity([2.0, -1.0, 0.5]);
        let current = model.projected_current([0.4, 0.1, -0.2]);
        let gz = 0.75;

        let t = model.torque_ratios(&velocity, &current, gz);
        assert_relative_eq!(t.tphi / t.tz, velocity.omega / gz, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_current_is_guarded() {
        let model = KinematicModel::default();
        let velocity = BodyVelocity { vx: 1.0, vy: -1.0, omega: 0.0 };
        let current = ProjectedCurrent { ix: 0.0, iy: 0.0, iphi: 0.0 };

        let t = model.torque_ratios(&velocity, &current, 0.5);
        assert!(t.tx.is_finite());
        assert_relative_eq!(t.tx, 1e6, epsilon = 1e-3);
        assert_relative_eq!(t.ty, -1e6, epsilon = 1e-3);
        assert_eq!(t.tphi, 0.0);
        assert_relative_eq!(t.tz, 5e5, epsilon = 1e-3);
    }

    #[test]
    fn test_orientation_changes_projection() {
        let rotated = KinematicModel::new(&KinematicsConfig {
            orientation_deg: 90.0,
            ..KinematicsConfig::default()
        });
        let v = rotated.body_velocity([0.0, 1.0, 0.0]);

        // Column 1 at alpha = 90 deg: [2/3 * sin(90), -2/3 * cos(90), 1/(3L)]
        assert_relative_eq!(v.vx, 0.04 * 2.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(v.vy, 0.0, epsilon = 1e-12);
    }
}
