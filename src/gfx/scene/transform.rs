//! Object transforms
//!
//! Rotation is stored as Euler angles in degrees and composed as
//! `R = Rx * Ry * Rz`, so a vertex is rotated about Z first, then Y, then X.
//! The full model matrix is `T * R * S`.

use cgmath::{Deg, Matrix4, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    /// Euler angles in degrees
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn new(position: Vector3<f32>, rotation: Vector3<f32>, scale: Vector3<f32>) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Recomputes `T * R * S` from the current fields
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let translation = Matrix4::from_translation(self.position);
        let rotation = self.rotation_matrix();
        let scale = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        translation * rotation * scale
    }

    pub fn rotation_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_angle_x(Deg(self.rotation.x))
            * Matrix4::from_angle_y(Deg(self.rotation.y))
            * Matrix4::from_angle_z(Deg(self.rotation.z))
    }

    /// Adds `delta` degrees to each Euler angle, wrapping into [0, 360)
    pub fn rotate(&mut self, delta: Vector3<f32>) {
        self.rotation.x = (self.rotation.x + delta.x).rem_euclid(360.0);
        self.rotation.y = (self.rotation.y + delta.y).rem_euclid(360.0);
        self.rotation.z = (self.rotation.z + delta.z).rem_euclid(360.0);
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vector3::new(scale, scale, scale);
    }

    /// The X component, which the editor treats as the uniform scale
    pub fn uniform_scale(&self) -> f32 {
        self.scale.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector4};

    const EPSILON: f32 = 1e-5;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < EPSILON, "{} != {}", a, b);
    }

    fn assert_matrix_close(a: Matrix4<f32>, b: Matrix4<f32>) {
        for col in 0..4 {
            for row in 0..4 {
                assert_close(a[col][row], b[col][row]);
            }
        }
    }

    #[test]
    fn test_identity_by_default() {
        assert_matrix_close(Transform::default().model_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_translation_and_uniform_scale() {
        let mut transform = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        transform.set_uniform_scale(2.0);
        let m = transform.model_matrix();

        assert_close(m[3][0], 1.0);
        assert_close(m[3][1], 2.0);
        assert_close(m[3][2], 3.0);
        assert_close(m[3][3], 1.0);
        assert_close(m[0][0], 2.0);
        assert_close(m[1][1], 2.0);
        assert_close(m[2][2], 2.0);
        assert_close(m[0][1], 0.0);
        assert_close(m[1][0], 0.0);
    }

    #[test]
    fn test_scale_applies_before_rotation() {
        let transform = Transform::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 90.0, 0.0),
            Vector3::new(2.0, 1.0, 1.0),
        );
        // +X scaled to 2, then rotated 90 degrees about Y lands on -Z
        let p = transform.model_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_close(p.x, 0.0);
        assert_close(p.y, 0.0);
        assert_close(p.z, -2.0);
    }

    #[test]
    fn test_rotation_order_is_x_y_z() {
        let transform = Transform::new(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(90.0, 0.0, 90.0),
            Vector3::new(1.0, 1.0, 1.0),
        );
        // Rz takes +X to +Y, then Rx takes +Y to +Z
        let p = transform.model_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_close(p.x, 0.0);
        assert_close(p.y, 0.0);
        assert_close(p.z, 1.0);
    }

    #[test]
    fn test_incremental_rotation_accumulates_degrees() {
        let mut transform = Transform::default();
        for _ in 0..4 {
            transform.rotate(Vector3::new(0.0, 30.0, 0.0));
        }
        assert_close(transform.rotation.y, 120.0);

        let mut absolute = Transform::default();
        absolute.rotation.y = 120.0;
        assert_matrix_close(transform.model_matrix(), absolute.model_matrix());
    }

    #[test]
    fn test_rotation_wraps() {
        let mut transform = Transform::default();
        transform.rotate(Vector3::new(-30.0, 370.0, 0.0));
        assert_close(transform.rotation.x, 330.0);
        assert_close(transform.rotation.y, 10.0);
    }
}
