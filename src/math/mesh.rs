use std::f64::consts::PI;

use thiserror::Error;

use crate::math::differential::{DifferentialEstimator, StepScaling};
use crate::math::surface::{ShapeConstants, u_domain, v_domain};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("sample grid needs at least one cell per side")]
    EmptyGrid,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleGrid {
    n: u32,
}

impl Default for SampleGrid {
    fn default() -> Self {
        Self {
            n: Self::DEFAULT_RESOLUTION,
        }
    }
}

impl SampleGrid {
    pub const DEFAULT_RESOLUTION: u32 = 300;

    pub fn new(n: u32) -> Result<Self, MeshError> {
        if n == 0 {
            return Err(MeshError::EmptyGrid);
        }
        Ok(Self { n })
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn samples(&self) -> usize {
        let side = self.n as usize + 1;
        side * side
    }

    /// Two strip vertices per sample.
    pub fn vertex_count(&self) -> usize {
        self.samples() * 2
    }
}

/// Everything a surface rebuild depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeParams {
    pub constants: ShapeConstants,
    pub grid: SampleGrid,
    pub scale: f64,
    pub scaling: StepScaling,
}

/// Triangle-strip surface buffers, three floats per vertex for positions and
/// normals, two for texture coordinates.
#[derive(Clone, Debug, Default)]
pub struct StripMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub texcoords: Vec<f32>,
}

impl StripMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

pub struct TriangleMesh {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub texcoords: Vec<f32>,
    pub indices: Vec<u32>,
}

pub fn build_strip_mesh(params: &ShapeParams) -> StripMesh {
    let n = params.grid.n();
    let vertex_count = params.grid.vertex_count();
    let estimator = DifferentialEstimator::new(params.constants, params.scaling);
    let shape = &params.constants;
    let scale = params.scale;

    let mut positions = Vec::with_capacity(vertex_count * 3);
    let mut normals = Vec::with_capacity(vertex_count * 3);
    let mut texcoords = Vec::with_capacity(vertex_count * 2);

    for j in 0..=n {
        let row = j as f64 / n as f64;
        let u = u_domain(row);

        for i in 0..=n {
            let col = i as f64 / n as f64;
            let v = v_domain(col);

            for u_sample in [u, u + 1.0] {
                let p = shape.position(v, u_sample) * scale;
                positions.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);

                let nrm = estimator.normal(u_sample, v);
                normals.extend_from_slice(&[nrm.x as f32, nrm.y as f32, nrm.z as f32]);

                texcoords.extend_from_slice(&[col as f32, row as f32]);
            }
        }
    }

    StripMesh {
        positions,
        normals,
        texcoords,
    }
}

/// Indexed UV sphere centered on the origin.
pub fn build_sphere(radius: f32, stacks: u32, slices: u32) -> TriangleMesh {
    let stacks = stacks.max(2);
    let slices = slices.max(3);
    let ring = slices + 1;

    let mut vertices = Vec::with_capacity(((stacks + 1) * ring * 3) as usize);
    let mut normals = Vec::with_capacity(((stacks + 1) * ring * 3) as usize);
    let mut texcoords = Vec::with_capacity(((stacks + 1) * ring * 2) as usize);
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);

    for stack in 0..=stacks {
        let t = stack as f64 / stacks as f64;
        let phi = t * PI;

        for slice in 0..=slices {
            let s = slice as f64 / slices as f64;
            let theta = s * 2.0 * PI;

            let nx = (phi.sin() * theta.cos()) as f32;
            let ny = phi.cos() as f32;
            let nz = (phi.sin() * theta.sin()) as f32;

            vertices.extend_from_slice(&[nx * radius, ny * radius, nz * radius]);
            normals.extend_from_slice(&[nx, ny, nz]);
            texcoords.extend_from_slice(&[s as f32, t as f32]);
        }
    }

    for stack in 0..stacks {
        for slice in 0..slices {
            let tl = stack * ring + slice;
            let tr = tl + 1;
            let bl = tl + ring;
            let br = bl + 1;

            indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        }
    }

    TriangleMesh {
        vertices,
        normals,
        texcoords,
        indices,
    }
}

/// Background quad in the unit square, `[x, y, z, s, t]` per vertex. The
/// texture is mirrored horizontally so a front camera reads like a mirror.
pub const BACKGROUND_QUAD: [[f32; 5]; 6] = [
    [0.0, 0.0, 0.0, 1.0, 1.0],
    [1.0, 0.0, 0.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, 0.0, 0.0],
    [1.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 1.0],
];

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn params(n: u32) -> ShapeParams {
        ShapeParams {
            constants: ShapeConstants::new(1.0, 0.5),
            grid: SampleGrid::new(n).unwrap(),
            scale: 1.0,
            scaling: StepScaling::Degrees,
        }
    }

    #[test]
    fn zero_grid_is_rejected() {
        assert_eq!(SampleGrid::new(0), Err(MeshError::EmptyGrid));
    }

    #[test]
    fn buffer_lengths_follow_grid() {
        for n in [1, 2, 3, 7, 16] {
            let mesh = build_strip_mesh(&params(n));
            let side = (n as usize + 1) * (n as usize + 1);
            assert_eq!(mesh.positions.len(), 6 * side);
            assert_eq!(mesh.normals.len(), mesh.positions.len());
            assert_eq!(mesh.texcoords.len(), 4 * side);
            assert_eq!(mesh.vertex_count(), params(n).grid.vertex_count());
        }
    }

    #[test]
    fn small_grid_scenario() {
        let mesh = build_strip_mesh(&params(2));
        assert_eq!(mesh.positions.len(), 54);
        assert_eq!(mesh.normals.len(), 54);

        // first sample sits at u = 0, v = 0
        assert_relative_eq!(mesh.positions[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mesh.positions[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(mesh.positions[2], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn every_sample_emits_u_and_u_plus_one() {
        let p = params(4);
        let mesh = build_strip_mesh(&p);
        let shape = p.constants;

        let j = 3;
        let i = 1;
        let u = u_domain(j as f64 / 4.0);
        let v = v_domain(i as f64 / 4.0);
        let base = (j * 5 + i) * 2 * 3;

        let first = shape.position(v, u);
        let second = shape.position(v, u + 1.0);
        assert_relative_eq!(mesh.positions[base] as f64, first.x, epsilon = 1e-5);
        assert_relative_eq!(mesh.positions[base + 2] as f64, first.z, epsilon = 1e-5);
        assert_relative_eq!(mesh.positions[base + 3] as f64, second.x, epsilon = 1e-5);
        assert_relative_eq!(mesh.positions[base + 5] as f64, second.z, epsilon = 1e-5);
    }

    #[test]
    fn normals_come_from_the_estimator() {
        let p = params(3);
        let mesh = build_strip_mesh(&p);
        let est = DifferentialEstimator::new(p.constants, p.scaling);

        let (j, i) = (1, 2);
        let u = u_domain(j as f64 / 3.0);
        let v = v_domain(i as f64 / 3.0);
        let base = (j * 4 + i) * 2 * 3;

        let a = est.normal(u, v);
        let b = est.normal(u + 1.0, v);
        assert_relative_eq!(mesh.normals[base] as f64, a.x, max_relative = 1e-5, epsilon = 1e-3);
        assert_relative_eq!(mesh.normals[base + 1] as f64, a.y, max_relative = 1e-5, epsilon = 1e-3);
        assert_relative_eq!(mesh.normals[base + 3] as f64, b.x, max_relative = 1e-5, epsilon = 1e-3);
        assert_relative_eq!(mesh.normals[base + 5] as f64, b.z, max_relative = 1e-5, epsilon = 1e-3);
    }

    #[test]
    fn scale_is_uniform() {
        let mut scaled = params(2);
        scaled.scale = 3.0;
        let one = build_strip_mesh(&params(2));
        let three = build_strip_mesh(&scaled);

        for (a, b) in one.positions.iter().zip(&three.positions) {
            assert_relative_eq!(*b, *a * 3.0, epsilon = 1e-5);
        }
        assert_eq!(one.normals, three.normals);
    }

    #[test]
    fn sphere_is_closed_and_unit_normal() {
        let sphere = build_sphere(0.5, 8, 12);
        assert_eq!(sphere.vertices.len(), 9 * 13 * 3);
        assert_eq!(sphere.indices.len(), 8 * 12 * 6);
        let max = *sphere.indices.iter().max().unwrap() as usize;
        assert!(max < sphere.vertices.len() / 3);

        for n in sphere.normals.chunks(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert_relative_eq!(len, 1.0, epsilon = 1e-5);
        }
    }
}
