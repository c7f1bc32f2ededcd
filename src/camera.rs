//! Perspective camera, orbit controls and the camera uniform.
//!
//! The camera is a position plus a look-at target. [`OrbitControls`] rotate
//! the position around the target on a sphere, with exponential damping of
//! the user's drag. Zoom is locked and the polar angle is capped just above
//! the floor so the studio floor can never be looked at from below.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, SquareMatrix, Vector3, Vector4};
use wgpu::util::DeviceExt;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const EPS: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width.max(1) as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Project a world-space point to normalized device coordinates.
///
/// Returns `None` for points behind the camera.
pub fn project(camera: &Camera, projection: &Projection, point: Point3<f32>) -> Option<Vector3<f32>> {
    let clip = projection.calc_matrix()
        * camera.calc_matrix()
        * Vector4::new(point.x, point.y, point.z, 1.0);
    if clip.w <= EPS {
        return None;
    }
    Some(clip.truncate() / clip.w)
}

/// Spherical coordinates in three.js convention: `theta` around +Y starting
/// at +Z, `phi` down from +Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius < EPS {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pending_theta: f32,
    pending_phi: f32,
}

impl OrbitControls {
    pub fn new<T: Into<Point3<f32>>>(target: T) -> Self {
        Self {
            target: target.into(),
            damping_factor: 0.1,
            enable_zoom: false,
            min_polar_angle: 0.0,
            max_polar_angle: std::f32::consts::PI,
            rotate_speed: 1.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
        }
    }

    /// Queue a rotation from a pointer drag of `dx`, `dy` logical pixels.
    ///
    /// A drag across the full viewport height is one full turn.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let tau = std::f32::consts::TAU;
        self.pending_theta -= tau * dx / height * self.rotate_speed;
        self.pending_phi -= tau * dy / height * self.rotate_speed;
    }

    /// Zoom requests are ignored while zoom is locked; returns whether the
    /// request was applied.
    pub fn zoom(&mut self, camera: &mut Camera, factor: f32) -> bool {
        if !self.enable_zoom || factor <= 0.0 {
            return false;
        }
        let offset = (camera.position - self.target) * factor;
        camera.position = self.target + offset;
        true
    }

    pub fn is_settled(&self) -> bool {
        self.pending_theta.abs() < EPS && self.pending_phi.abs() < EPS
    }

    /// Drop any queued rotation, e.g. when the camera is being flown elsewhere.
    pub fn stop(&mut self) {
        self.pending_theta = 0.0;
        self.pending_phi = 0.0;
    }

    /// Apply one damped step of the queued rotation and keep the camera
    /// aimed at the target.
    pub fn update(&mut self, camera: &mut Camera) {
        camera.target = self.target;
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);
        let mut changed = false;

        if !self.is_settled() {
            spherical.theta += self.pending_theta * self.damping_factor;
            spherical.phi += self.pending_phi * self.damping_factor;
            self.pending_theta *= 1.0 - self.damping_factor;
            self.pending_phi *= 1.0 - self.damping_factor;
            if self.is_settled() {
                self.stop();
            }
            changed = true;
        }

        let min = self.min_polar_angle.max(EPS);
        let max = self.max_polar_angle.min(std::f32::consts::PI - EPS);
        if spherical.radius > EPS && (spherical.phi < min || spherical.phi > max) {
            spherical.phi = spherical.phi.clamp(min, max);
            changed = true;
        }

        if changed {
            camera.position = self.target + spherical.to_offset();
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
            inv_view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        self.view_proj = view_proj.into();
        self.inv_view_proj = view_proj
            .invert()
            .unwrap_or_else(Matrix4::identity)
            .into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera, projection: &Projection) {
        self.uniform.update_view_proj(camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
