//! Matrix helpers for filling [`Uniforms`](crate::Uniforms).
//!
//! All matrices are right-handed and column-major with a [0, 1] clip depth
//! range (wgpu convention).

use glam::{Mat4, Vec3};

/// Rotation of `radians` around `axis`. The axis does not need to be normalized.
pub fn rotation(radians: f32, axis: Vec3) -> Mat4 {
    Mat4::from_axis_angle(axis.normalize(), radians)
}

pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

/// Right-handed perspective projection mapping depth to [0, 1].
pub fn perspective_rh(fovy_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fovy_radians, aspect, near, far)
}

pub fn radians_from_degrees(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Placement of a camera (or light) in the world.
///
/// The camera looks down its local -Z axis with `up` roughly along +Y.
pub fn camera_to_world(position: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    view_matrix(position, target, up).inverse()
}

/// World-to-view transform, the inverse of [`camera_to_world`].
pub fn view_matrix(position: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(position, target, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn test_perspective_matches_glam() {
        let ours = perspective_rh(radians_from_degrees(80.0), 16.0 / 9.0, 0.1, 100.0);
        let glam = Mat4::perspective_rh(80f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        assert!(ours.abs_diff_eq(glam, EPSILON));
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective_rh(1.0, 1.0, 0.1, 100.0);
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -0.1));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -100.0));
        assert!(near.z.abs() < EPSILON);
        assert!((far.z - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_view_matrix_matches_look_at() {
        let eye = Vec3::new(10.0, 20.0, 30.0);
        let ours = view_matrix(eye, Vec3::ZERO, Vec3::Y);
        let glam = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        assert!(ours.abs_diff_eq(glam, EPSILON));
    }

    #[test]
    fn test_light_view_with_tilted_up() {
        // Light straight above the scene needs an up vector off the Y axis.
        let eye = Vec3::new(0.0, 60.0, 10.0);
        let view = view_matrix(eye, Vec3::ZERO, Vec3::NEG_Z);
        let origin = view.transform_point3(Vec3::ZERO);
        assert!(origin.x.abs() < EPSILON);
        assert!(origin.y.abs() < EPSILON);
        assert!((origin.z + eye.length()).abs() < EPSILON);
    }

    #[test]
    fn test_rotation_normalizes_axis() {
        let a = rotation(0.7, Vec3::new(0.0, 5.0, 0.0));
        let b = Mat4::from_rotation_y(0.7);
        assert!(a.abs_diff_eq(b, EPSILON));
    }

    #[test]
    fn test_camera_to_world_places_camera() {
        let eye = Vec3::new(10.0, 20.0, 30.0);
        let placement = camera_to_world(eye, Vec3::ZERO, Vec3::Y);
        assert!(placement.transform_point3(Vec3::ZERO).abs_diff_eq(eye, EPSILON));

        // Local -Z points at the target.
        let forward = placement.transform_vector3(Vec3::NEG_Z);
        assert!(forward.abs_diff_eq(-eye.normalize(), EPSILON));
    }

    #[test]
    fn test_translation() {
        let m = translation(1.0, -2.0, 3.0);
        assert_eq!(m.transform_point3(Vec3::ZERO), Vec3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn test_radians_from_degrees() {
        assert!((radians_from_degrees(180.0) - std::f32::consts::PI).abs() < 1e-6);
    }
}
