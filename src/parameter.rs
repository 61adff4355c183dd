//! Named controller parameters and the gains they map onto.
//!
//! Parameters are addressed by dotted names such as `mass`,
//! `trajectory_control.kp.x` or `trajectory_control.roll_control.kp`.
//! Every known name resolves through a static table to a [`Parameter`],
//! which knows which field of the [`Gains`] or [`Pid3`] it writes.

use crate::control::Pid3;
use core::fmt;
use nalgebra::{Matrix3, Vector3};

/// Namespace of every parameter except `mass`.
pub const CONTROLLER_NAMESPACE: &str = "trajectory_control";

const MASS_NAME: &str = "mass";

/// A known controller parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parameter {
    Mass,
    ResetIntegral,
    AntiwindupCte,
    Alpha,
    KpX,
    KpY,
    KpZ,
    KiX,
    KiY,
    KiZ,
    KdX,
    KdY,
    KdZ,
    RollKp,
    PitchKp,
    YawKp,
}

/// Sub-names under [`CONTROLLER_NAMESPACE`].
const CONTROLLER_TABLE: [(&str, Parameter); 15] = [
    ("reset_integral", Parameter::ResetIntegral),
    ("antiwindup_cte", Parameter::AntiwindupCte),
    ("alpha", Parameter::Alpha),
    ("kp.x", Parameter::KpX),
    ("kp.y", Parameter::KpY),
    ("kp.z", Parameter::KpZ),
    ("ki.x", Parameter::KiX),
    ("ki.y", Parameter::KiY),
    ("ki.z", Parameter::KiZ),
    ("kd.x", Parameter::KdX),
    ("kd.y", Parameter::KdY),
    ("kd.z", Parameter::KdZ),
    ("roll_control.kp", Parameter::RollKp),
    ("pitch_control.kp", Parameter::PitchKp),
    ("yaw_control.kp", Parameter::YawKp),
];

impl Parameter {
    pub const ALL: [Parameter; 16] = [
        Parameter::Mass,
        Parameter::ResetIntegral,
        Parameter::AntiwindupCte,
        Parameter::Alpha,
        Parameter::KpX,
        Parameter::KpY,
        Parameter::KpZ,
        Parameter::KiX,
        Parameter::KiY,
        Parameter::KiZ,
        Parameter::KdX,
        Parameter::KdY,
        Parameter::KdZ,
        Parameter::RollKp,
        Parameter::PitchKp,
        Parameter::YawKp,
    ];

    /// Resolve a dotted parameter name.
    ///
    /// The name is split at its first `.` into a domain and a sub-name.
    /// `mass` is matched as a whole, anything else must live under
    /// [`CONTROLLER_NAMESPACE`] and have a sub-name from the setter table.
    /// ```
    /// use flatness_control::Parameter;
    ///
    /// assert_eq!(Parameter::from_name("trajectory_control.kd.y"), Some(Parameter::KdY));
    /// assert_eq!(Parameter::from_name("position_control.kp.x"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        if name == MASS_NAME {
            return Some(Parameter::Mass);
        }

        let (domain, sub_name) = name.split_once('.')?;
        if domain != CONTROLLER_NAMESPACE {
            return None;
        }

        CONTROLLER_TABLE
            .iter()
            .find(|(entry, _)| *entry == sub_name)
            .map(|(_, parameter)| *parameter)
    }

    /// The sub-name of this parameter, without the controller namespace.
    pub fn sub_name(self) -> &'static str {
        match self {
            Parameter::Mass => MASS_NAME,
            parameter => CONTROLLER_TABLE
                .iter()
                .find(|(_, entry)| *entry == parameter)
                .map(|(name, _)| *name)
                .unwrap_or_default(),
        }
    }

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Mass => f.write_str(MASS_NAME),
            parameter => write!(f, "{}.{}", CONTROLLER_NAMESPACE, parameter.sub_name()),
        }
    }
}

/// A fixed size set of [`Parameter`]s.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ParameterSet(u16);

impl ParameterSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Parameter::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, parameter: Parameter) {
        self.0 |= parameter.bit();
    }

    /// Remove `parameter`, returning `true` if it was present.
    pub fn remove(&mut self, parameter: Parameter) -> bool {
        let present = self.contains(parameter);
        self.0 &= !parameter.bit();
        present
    }

    pub fn contains(&self, parameter: Parameter) -> bool {
        self.0 & parameter.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Parameter> + '_ {
        Parameter::ALL
            .into_iter()
            .filter(move |parameter| self.contains(*parameter))
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut set = Self::empty();
        for parameter in iter {
            set.insert(parameter);
        }
        set
    }
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, parameter) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", parameter)?;
        }
        Ok(())
    }
}

/// A parameter value as delivered by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Double(f64),
}

impl ParamValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            ParamValue::Double(value) => Some(value),
            ParamValue::Integer(value) => Some(value as f64),
            ParamValue::Bool(_) => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            ParamValue::Bool(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Double(value)
    }
}

/// Vehicle mass and the proportional attitude gains.
///
/// The translational gains live in the [`Pid3`].
#[derive(Clone, Debug, PartialEq)]
pub struct Gains {
    /// Vehicle mass in kilograms.
    pub mass: f64,
    /// Diagonal roll, pitch and yaw gains on the rotation error.
    pub angular: Matrix3<f64>,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            mass: 1.,
            angular: Matrix3::from_diagonal(&Vector3::new(1., 1., 1.)),
        }
    }
}

impl Gains {
    /// Set the roll, pitch and yaw gains.
    pub fn set_angular(&mut self, gains: Vector3<f64>) {
        self.angular = Matrix3::from_diagonal(&gains);
    }

    /// The roll, pitch and yaw gains.
    pub fn angular_diagonal(&self) -> Vector3<f64> {
        self.angular.diagonal()
    }
}

/// Write `value` into the field named by `parameter`.
///
/// Returns `false` without touching anything if the value has the wrong type.
pub(crate) fn apply(
    parameter: Parameter,
    value: ParamValue,
    gains: &mut Gains,
    pid: &mut Pid3,
) -> bool {
    if let ParamValue::Bool(flag) = value {
        if parameter != Parameter::ResetIntegral {
            return false;
        }
        pid.set_reset_integral(flag);
        return true;
    }

    let value = match value.as_f64() {
        Some(value) => value,
        None => return false,
    };

    match parameter {
        Parameter::Mass => gains.mass = value,
        Parameter::ResetIntegral => return false,
        Parameter::AntiwindupCte => pid.set_antiwindup(value),
        Parameter::Alpha => pid.set_alpha(value),
        Parameter::KpX => pid.kp.x = value,
        Parameter::KpY => pid.kp.y = value,
        Parameter::KpZ => pid.kp.z = value,
        Parameter::KiX => pid.ki.x = value,
        Parameter::KiY => pid.ki.y = value,
        Parameter::KiZ => pid.ki.z = value,
        Parameter::KdX => pid.kd.x = value,
        Parameter::KdY => pid.kd.y = value,
        Parameter::KdZ => pid.kd.z = value,
        Parameter::RollKp => gains.angular[(0, 0)] = value,
        Parameter::PitchKp => gains.angular[(1, 1)] = value,
        Parameter::YawKp => gains.angular[(2, 2)] = value,
    }
    true
}

/// Outcome of a parameter update. Updates never fail as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetParametersResult {
    pub successful: bool,
    pub reason: &'static str,
    /// Entries that matched a parameter and were written.
    pub applied: usize,
    /// Entries with an unknown name or a mistyped value.
    pub ignored: usize,
}

impl Default for SetParametersResult {
    fn default() -> Self {
        Self {
            successful: true,
            reason: "success",
            applied: 0,
            ignored: 0,
        }
    }
}
