use nalgebra::Vector3;
use num_traits::Float;

/// Three axis PID on position and velocity error.
///
/// The proportional term acts on position error, the derivative term on
/// velocity error (low-pass filtered by `alpha`) and the integral term on the
/// accumulated position error.
#[derive(Clone, Debug, PartialEq)]
pub struct Pid3 {
    pub kp: Vector3<f64>,
    pub ki: Vector3<f64>,
    pub kd: Vector3<f64>,
    /// Limit on each axis of the integral contribution. Disabled if not positive.
    antiwindup_cte: f64,
    /// Derivative filter weight of the newest sample in [0, 1].
    alpha: f64,
    /// Zero an axis of the integrator when its position error changes sign.
    reset_integral: bool,
    integrator: Vector3<f64>,
    derivative: Vector3<f64>,
    last_error: Vector3<f64>,
    reset_filter: bool,
}

impl Default for Pid3 {
    fn default() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros(), Vector3::zeros())
    }
}

impl Pid3 {
    pub fn new(kp: Vector3<f64>, ki: Vector3<f64>, kd: Vector3<f64>) -> Self {
        Self {
            kp,
            ki,
            kd,
            antiwindup_cte: 0.,
            alpha: 1.,
            reset_integral: false,
            integrator: Vector3::zeros(),
            derivative: Vector3::zeros(),
            last_error: Vector3::zeros(),
            reset_filter: true,
        }
    }

    pub fn antiwindup(&self) -> f64 {
        self.antiwindup_cte
    }

    pub fn set_antiwindup(&mut self, antiwindup_cte: f64) {
        self.antiwindup_cte = antiwindup_cte;
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Set the derivative filter weight, clamped to [0, 1].
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha.max(0.).min(1.);
    }

    pub fn reset_integral(&self) -> bool {
        self.reset_integral
    }

    pub fn set_reset_integral(&mut self, reset_integral: bool) {
        self.reset_integral = reset_integral;
    }

    /// The accumulated position error.
    pub fn integrator(&self) -> Vector3<f64> {
        self.integrator
    }

    /// Clear the integrator and the derivative filter.
    pub fn reset(&mut self) {
        self.integrator = Vector3::zeros();
        self.derivative = Vector3::zeros();
        self.last_error = Vector3::zeros();
        self.reset_filter = true;
    }

    /// Calculate the force correction to move from the current position and
    /// velocity to the reference ones over a time step `dt` in seconds.
    pub fn compute_control(
        &mut self,
        dt: f64,
        pos_state: Vector3<f64>,
        pos_reference: Vector3<f64>,
        vel_state: Vector3<f64>,
        vel_reference: Vector3<f64>,
    ) -> Vector3<f64> {
        let pos_error = pos_reference - pos_state;
        let vel_error = vel_reference - vel_state;

        self.update_integral(pos_error, dt);

        if self.reset_filter {
            self.reset_filter = false;
            self.derivative = vel_error;
        } else {
            self.derivative += self.alpha * (vel_error - self.derivative);
        }
        self.last_error = pos_error;

        self.kp.component_mul(&pos_error)
            + self.ki.component_mul(&self.integrator)
            + self.kd.component_mul(&self.derivative)
    }

    fn update_integral(&mut self, error: Vector3<f64>, dt: f64) {
        if !(dt > 0.) || !dt.is_finite() {
            return;
        }

        for axis in 0..3 {
            if self.reset_integral && error[axis] * self.last_error[axis] < 0. {
                self.integrator[axis] = 0.;
            }

            self.integrator[axis] += error[axis] * dt;

            // Bound the contribution ki * integrator to the anti-windup limit
            let ki = self.ki[axis].abs();
            if self.antiwindup_cte > 0. && ki > 0. {
                let limit = self.antiwindup_cte / ki;
                self.integrator[axis] = self.integrator[axis].max(-limit).min(limit);
            }
        }
    }
}
