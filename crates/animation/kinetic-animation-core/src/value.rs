//! Typed property values built from blended channel components.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    /// Quaternion (x, y, z, w); renormalised after blending.
    Quat,
    /// Any number of components.
    Vector,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PropertyValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Quat([f32; 4]),
    Vector(Vec<f32>),
}

impl PropertyValue {
    #[inline]
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Vec2(_) => PropertyKind::Vec2,
            PropertyValue::Vec3(_) => PropertyKind::Vec3,
            PropertyValue::Vec4(_) => PropertyKind::Vec4,
            PropertyValue::Quat(_) => PropertyKind::Quat,
            PropertyValue::Vector(_) => PropertyKind::Vector,
        }
    }

    /// Flat component view, in channel order.
    pub fn components(&self) -> Vec<f32> {
        match self {
            PropertyValue::Float(x) => vec![*x],
            PropertyValue::Vec2(a) => a.to_vec(),
            PropertyValue::Vec3(a) => a.to_vec(),
            PropertyValue::Vec4(a) | PropertyValue::Quat(a) => a.to_vec(),
            PropertyValue::Vector(v) => v.clone(),
        }
    }

    /// Shape `components` as `kind`. Short input is zero-padded.
    pub fn from_components(kind: PropertyKind, components: &[f32]) -> Self {
        let at = |i: usize| components.get(i).copied().unwrap_or(0.0);
        match kind {
            PropertyKind::Float => PropertyValue::Float(at(0)),
            PropertyKind::Vec2 => PropertyValue::Vec2([at(0), at(1)]),
            PropertyKind::Vec3 => PropertyValue::Vec3([at(0), at(1), at(2)]),
            PropertyKind::Vec4 => PropertyValue::Vec4([at(0), at(1), at(2), at(3)]),
            PropertyKind::Quat => PropertyValue::Quat(normalize_quat([at(0), at(1), at(2), at(3)])),
            PropertyKind::Vector => PropertyValue::Vector(components.to_vec()),
        }
    }
}

/// Normalize a quaternion represented as [x,y,z,w]; degenerate input becomes identity.
fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let mag = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if mag == 0.0 || !mag.is_finite() {
        [0.0, 0.0, 0.0, 1.0]
    } else {
        [q[0] / mag, q[1] / mag, q[2] / mag, q[3] / mag]
    }
}
