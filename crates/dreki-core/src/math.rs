//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Trs`] is a plain translation/rotation/scale value
//! used when decomposing matrices and when persisting transforms.

pub use glam::{EulerRot, Mat3, Mat4, Quat, Vec3, Vec4};

use serde::{Deserialize, Serialize};

/// Euler order used for the cached Euler representation.
///
/// `YXZ` means the rotation is built as `yaw * pitch * roll`, so roll (Z) is
/// applied first, then pitch (X), then yaw (Y).
pub const EULER_ORDER: EulerRot = EulerRot::YXZ;

/// Default threshold below which a scale axis counts as collapsed.
pub const DEFAULT_SCALE_EPSILON: f32 = 1e-6;

/// A translation, rotation and scale triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trs {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Trs {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a value at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    /// Decompose an affine matrix. Shear is lost.
    pub fn from_matrix(matrix: Mat4) -> Self {
        Self::from_matrix_clamped(matrix, DEFAULT_SCALE_EPSILON)
    }

    /// Decompose an affine matrix whose basis may have collapsed axes.
    ///
    /// An axis shorter than `epsilon` gets scale 0, and the rotation is
    /// rebuilt from the axes that survive, so the result is always finite.
    pub fn from_matrix_clamped(matrix: Mat4, epsilon: f32) -> Self {
        let translation = matrix.w_axis.truncate();
        let axes = [
            matrix.x_axis.truncate(),
            matrix.y_axis.truncate(),
            matrix.z_axis.truncate(),
        ];
        if axes.iter().all(|a| a.length() >= epsilon) {
            let (scale, rotation, _) = matrix.to_scale_rotation_translation();
            if scale.is_finite() && rotation.is_finite() {
                return Self {
                    translation,
                    rotation: rotation.normalize(),
                    scale,
                };
            }
        }
        let scale = Vec3::new(axes[0].length(), axes[1].length(), axes[2].length());
        let scale = Vec3::select(scale.cmplt(Vec3::splat(epsilon)), Vec3::ZERO, scale);
        Self {
            translation,
            rotation: rotation_from_axes(axes, epsilon),
            scale,
        }
    }

    /// Compute the 4x4 affine matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Trs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Convert Euler angles in degrees (x = pitch, y = yaw, z = roll) to a quaternion.
pub fn euler_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EULER_ORDER,
        degrees.y.to_radians(),
        degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Convert a quaternion to Euler angles in degrees, each in `(-180, 180]`.
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EULER_ORDER);
    Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

/// Rotation of a basis with one or more collapsed axes. Missing axes are
/// completed with cross products; with fewer than two survivors the
/// shortest arc onto the remaining axis is used.
fn rotation_from_axes(axes: [Vec3; 3], epsilon: f32) -> Quat {
    let unit = |v: Vec3| (v.length() >= epsilon).then(|| v.normalize());
    let (x, y, z) = (unit(axes[0]), unit(axes[1]), unit(axes[2]));
    let basis = match (x, y, z) {
        (Some(x), Some(y), None) => Some((x, y, x.cross(y))),
        (Some(x), None, Some(z)) => Some((x, z.cross(x), z)),
        (None, Some(y), Some(z)) => Some((y.cross(z), y, z)),
        _ => None,
    };
    if let Some((x, y, z)) = basis {
        let rotation = Quat::from_mat3(&Mat3::from_cols(
            x.normalize_or_zero(),
            y.normalize_or_zero(),
            z.normalize_or_zero(),
        ));
        if rotation.is_finite() && rotation.length_squared() > 0.0 {
            return rotation.normalize();
        }
    }
    match (x, y, z) {
        (Some(x), _, _) => Quat::from_rotation_arc(Vec3::X, x),
        (_, Some(y), _) => Quat::from_rotation_arc(Vec3::Y, y),
        (_, _, Some(z)) => Quat::from_rotation_arc(Vec3::Z, z),
        _ => Quat::IDENTITY,
    }
}

/// Divide `value` by `scale` per axis. Axes whose scale magnitude is below
/// `epsilon` produce 0 instead of an infinity or NaN.
pub fn div_clamped(value: Vec3, scale: Vec3, epsilon: f32) -> Vec3 {
    let axis = |v: f32, s: f32| if s.abs() < epsilon { 0.0 } else { v / s };
    Vec3::new(
        axis(value.x, scale.x),
        axis(value.y, scale.y),
        axis(value.z, scale.z),
    )
}
