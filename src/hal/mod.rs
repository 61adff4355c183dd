use crate::{mode::ReferenceFrame, state::Stamped};
use embedded_time::Clock;
use nalgebra::Vector3;

/// Re-expresses a stamped velocity in another frame.
///
/// Implemented by the host's transform tree. Closures with the same
/// signature implement it as well.
pub trait VelocityTransform<C: Clock> {
    fn convert(
        &mut self,
        velocity: Stamped<Vector3<f64>, C>,
        target: ReferenceFrame,
    ) -> Stamped<Vector3<f64>, C>;
}

impl<C, F> VelocityTransform<C> for F
where
    C: Clock,
    F: FnMut(Stamped<Vector3<f64>, C>, ReferenceFrame) -> Stamped<Vector3<f64>, C>,
{
    fn convert(
        &mut self,
        velocity: Stamped<Vector3<f64>, C>,
        target: ReferenceFrame,
    ) -> Stamped<Vector3<f64>, C> {
        self(velocity, target)
    }
}
