//! Perspective camera and projection for the single character view.

use cgmath::{perspective, Deg, Matrix4, Point3, Rad, Vector3};

/// cgmath produces OpenGL clip space; wgpu wants x/y in [-1, 1] and z in
/// [0, 1], so every projection is corrected by this matrix.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    pub look_at: Point3<f32>,
    pub projection: Projection,
}

impl Camera {
    pub fn new(position: Point3<f32>, look_at: Point3<f32>, projection: Projection) -> Self {
        Self {
            position,
            look_at,
            projection,
        }
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.look_at, Vector3::unit_y())
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.projection.matrix() * self.view_matrix()
    }
}

#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    /// Scales the field of view like a lens zoom; 1.0 is neutral.
    zoom: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy: Deg<f32>, zoom: f32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            zoom,
            znear,
            zfar,
        }
    }

    /// Recompute the aspect ratio after a surface resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        let effective = Rad(2.0 * ((self.fovy.0 / 2.0).tan() / self.zoom).atan());
        perspective(effective, self.aspect, self.znear, self.zfar)
    }
}

/// Camera data as laid out for the shader uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_pos: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera) -> Self {
        Self {
            view_pos: [camera.position.x, camera.position.y, camera.position.z, 1.0],
            view_proj: camera.view_proj().into(),
        }
    }
}
