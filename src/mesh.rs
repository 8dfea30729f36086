// mesh.rs — flat-colored geometry for the corridor, the panels and the cat placeholder

use crate::gallery::{hex_rgb, PanelDescriptor, HIT_SURFACE_DEPTH, HIT_SURFACE_SIZE};
use glam::{Mat4, Quat, Vec3};
use std::ops::Range;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

// Faces of a unit cube: (normal, u axis, v axis).
const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
];

impl Mesh {
    /// Quad facing +Z in local space, `size` = (width, height).
    pub fn push_quad(&mut self, transform: Mat4, size: [f32; 2], color: [f32; 3]) {
        let normal = transform.transform_vector3(Vec3::Z).normalize_or_zero();
        let [w, h] = [size[0] * 0.5, size[1] * 0.5];
        let corners = [
            Vec3::new(-w, -h, 0.0),
            Vec3::new(w, -h, 0.0),
            Vec3::new(w, h, 0.0),
            Vec3::new(-w, h, 0.0),
        ];
        self.push_face(corners.map(|c| transform.transform_point3(c)), normal, color);
    }

    pub fn push_box(&mut self, transform: Mat4, size: [f32; 3], color: [f32; 3]) {
        let half = Vec3::from(size) * 0.5;
        for (n, u, v) in FACES {
            let (n, u, v) = (Vec3::from(n), Vec3::from(u), Vec3::from(v));
            let center = n * half;
            let du = u * half;
            let dv = v * half;
            let corners = [
                center - du - dv,
                center + du - dv,
                center + du + dv,
                center - du + dv,
            ];
            let normal = transform.transform_vector3(n).normalize_or_zero();
            self.push_face(corners.map(|c| transform.transform_point3(c)), normal, color);
        }
    }

    fn push_face(&mut self, corners: [Vec3; 4], normal: Vec3, color: [f32; 3]) {
        let base = self.vertices.len() as u32;
        for c in corners {
            self.vertices.push(Vertex {
                position: c.to_array(),
                normal: normal.to_array(),
                color,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

fn at(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_translation(Vec3::new(x, y, z))
}

fn flat(x: f32, y: f32, z: f32) -> Mat4 {
    at(x, y, z) * Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

/// Floor, carpet, walls and ceiling of the 6 x 28 corridor.
pub fn build_corridor(mesh: &mut Mesh) {
    let gold = hex_rgb(0xd4af37);
    let wall = hex_rgb(0xf5f0e6);
    let dark = hex_rgb(0x1a1a1a);

    mesh.push_quad(flat(0.0, 0.0, 0.0), [6.0, 28.0], dark);
    mesh.push_quad(flat(-1.8, 0.005, 0.0), [0.02, 26.0], gold);
    mesh.push_quad(flat(1.8, 0.005, 0.0), [0.02, 26.0], gold);
    mesh.push_quad(flat(0.0, 0.01, 0.0), [1.5, 24.0], hex_rgb(0x1a0a0a));
    mesh.push_quad(flat(-0.77, 0.012, 0.0), [0.04, 24.0], gold);
    mesh.push_quad(flat(0.77, 0.012, 0.0), [0.04, 24.0], gold);

    mesh.push_box(at(-3.0, 2.5, 0.0), [0.3, 5.0, 28.0], wall);
    mesh.push_box(at(3.0, 2.5, 0.0), [0.3, 5.0, 28.0], wall);
    mesh.push_box(at(0.0, 2.5, -14.0), [6.0, 5.0, 0.3], wall);
    mesh.push_box(at(0.0, 5.0, 0.0), [6.0, 0.3, 28.0], hex_rgb(0x0a0a0a));

    mesh.push_box(at(0.0, 4.83, 0.0), [0.6, 0.05, 28.0], gold);
    mesh.push_box(at(-2.7, 4.83, 0.0), [0.15, 0.08, 28.0], gold);
    mesh.push_box(at(2.7, 4.83, 0.0), [0.15, 0.08, 28.0], gold);
    mesh.push_box(at(-2.75, 0.1, 0.0), [0.12, 0.2, 28.0], dark);
    mesh.push_box(at(2.75, 0.1, 0.0), [0.12, 0.2, 28.0], dark);
}

/// Gilded frame, mat, canvas and title plate for one panel. Returns the
/// canvas vertex range.
pub fn build_panel(mesh: &mut Mesh, panel: &PanelDescriptor) -> Range<usize> {
    let gold = hex_rgb(0xb8860b);
    let frame = Mat4::from_rotation_translation(Quat::from_rotation_y(panel.y_rotation), panel.position);

    mesh.push_box(frame, [2.4, 1.8, 0.1], gold);
    mesh.push_box(frame * at(0.0, 0.0, 0.05), [2.1, 1.5, 0.02], hex_rgb(0xf5f5dc));
    let canvas_start = mesh.vertices.len();
    mesh.push_quad(frame * at(0.0, 0.0, HIT_SURFACE_DEPTH), HIT_SURFACE_SIZE, panel.accent_color);
    let canvas = canvas_start..mesh.vertices.len();
    mesh.push_box(frame * at(0.0, -1.05, 0.06), [1.4, 0.22, 0.03], gold);
    canvas
}

/// Stand-in for the cat model, origin at the paws.
pub fn build_placeholder(mesh: &mut Mesh) {
    mesh.push_box(at(0.0, 0.15, 0.0), [0.4, 0.3, 0.6], hex_rgb(0xff8844));
    // Head, so the heading reads on screen.
    mesh.push_box(at(0.0, 0.32, -0.3), [0.22, 0.2, 0.2], hex_rgb(0xff8844));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_has_six_outward_faces() {
        let mut mesh = Mesh::default();
        mesh.push_box(Mat4::IDENTITY, [2.0, 2.0, 2.0], [1.0; 3]);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for v in &mesh.vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            assert!(p.dot(n) > 0.0);
        }
    }

    #[test]
    fn quads_wind_counter_clockwise_toward_their_normal() {
        let mut mesh = Mesh::default();
        mesh.push_quad(flat(0.0, 0.0, 0.0), [1.0, 1.0], [1.0; 3]);
        let p: Vec<Vec3> = mesh.vertices.iter().map(|v| Vec3::from(v.position)).collect();
        let n = Vec3::from(mesh.vertices[0].normal);
        let face = (p[1] - p[0]).cross(p[2] - p[0]);
        assert!(face.dot(n) > 0.0);
        assert!(n.distance(Vec3::Y) < 1e-5);
    }

    #[test]
    fn canvas_sits_on_the_panel_hit_surface() {
        let gallery = crate::gallery::Gallery::portfolio();
        let panel = gallery.get(2).unwrap();
        let mut mesh = Mesh::default();
        build_corridor(&mut mesh);
        let canvas = build_panel(&mut mesh, panel);
        assert_eq!(canvas.len(), 4);
        for v in &mesh.vertices[canvas] {
            assert!((v.position[0] - (panel.position.x + HIT_SURFACE_DEPTH)).abs() < 1e-4);
            assert_eq!(v.color, panel.accent_color);
        }
    }
}
