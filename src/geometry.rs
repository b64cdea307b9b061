use std::f32::consts::{PI, TAU};
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat3, Mat4, Vec2, Vec3};

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// Number of floats per interleaved GPU vertex: position, normal, uv, uv2.
pub const VERTEX_STRIDE: usize = 10;

/// Indexed triangle mesh produced by the primitive generators below.
#[derive(Debug, Clone)]
pub struct Geometry {
    id: u64,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub uv2: Option<Vec<Vec2>>,
    pub indices: Vec<u32>,
}

impl Geometry {
    fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> Self {
        Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            positions,
            normals,
            uvs,
            uv2: None,
            indices,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Copies the primary UV set into the secondary channel sampled by AO maps.
    pub fn duplicate_uv_channel(&mut self) {
        self.uv2 = Some(self.uvs.clone());
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.apply_matrix(Mat4::from_translation(offset));
    }

    pub fn rotate_x(&mut self, angle: f32) {
        self.apply_matrix(Mat4::from_rotation_x(angle));
    }

    /// Bakes `matrix` into positions and normals.
    pub fn apply_matrix(&mut self, matrix: Mat4) {
        let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
        for position in &mut self.positions {
            *position = matrix.transform_point3(*position);
        }
        for normal in &mut self.normals {
            *normal = (normal_matrix * *normal).normalize_or_zero();
        }
    }

    /// Interleaves attributes as `position.xyz normal.xyz uv.xy uv2.xy`.
    ///
    /// Meshes without a secondary channel get zeroed `uv2`.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.positions.len() * VERTEX_STRIDE);
        for (index, position) in self.positions.iter().enumerate() {
            let normal = self.normals.get(index).copied().unwrap_or(Vec3::Y);
            let uv = self.uvs.get(index).copied().unwrap_or(Vec2::ZERO);
            let uv2 = self
                .uv2
                .as_ref()
                .and_then(|set| set.get(index).copied())
                .unwrap_or(Vec2::ZERO);
            data.extend_from_slice(&position.to_array());
            data.extend_from_slice(&normal.to_array());
            data.extend_from_slice(&uv.to_array());
            data.extend_from_slice(&uv2.to_array());
        }
        data
    }

    /// Subdivided plane in the XY plane facing +Z, centred at the origin.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        for iy in 0..=grid_y {
            let y = iy as f32 * segment_height - height / 2.0;
            for ix in 0..=grid_x {
                let x = ix as f32 * segment_width - width / 2.0;
                positions.push(Vec3::new(x, -y, 0.0));
                normals.push(Vec3::Z);
                uvs.push(Vec2::new(
                    ix as f32 / grid_x as f32,
                    1.0 - iy as f32 / grid_y as f32,
                ));
            }
        }

        let row = grid_x + 1;
        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + row * iy;
                let b = ix + row * (iy + 1);
                let c = (ix + 1) + row * (iy + 1);
                let d = (ix + 1) + row * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        Self::new(positions, normals, uvs, indices)
    }

    /// Frustum along Y centred at the origin; a zero top radius gives a cone.
    pub fn cylinder(
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    ) -> Self {
        let radial = radial_segments.max(3);
        let rows = height_segments.max(1);
        let half = height / 2.0;
        let slope = (radius_bottom - radius_top) / height;

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        let mut indices = Vec::new();

        for y in 0..=rows {
            let v = y as f32 / rows as f32;
            let radius = v * (radius_bottom - radius_top) + radius_top;
            for x in 0..=radial {
                let u = x as f32 / radial as f32;
                let theta = u * TAU;
                let (sin, cos) = theta.sin_cos();
                positions.push(Vec3::new(radius * sin, -v * height + half, radius * cos));
                normals.push(Vec3::new(sin, slope, cos).normalize());
                uvs.push(Vec2::new(u, 1.0 - v));
            }
        }
        let row = radial + 1;
        for y in 0..rows {
            for x in 0..radial {
                let a = y * row + x;
                let b = (y + 1) * row + x;
                let c = (y + 1) * row + x + 1;
                let d = y * row + x + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        if !open_ended {
            if radius_top > 0.0 {
                push_cap(
                    &mut positions,
                    &mut normals,
                    &mut uvs,
                    &mut indices,
                    radius_top,
                    half,
                    radial,
                    true,
                );
            }
            if radius_bottom > 0.0 {
                push_cap(
                    &mut positions,
                    &mut normals,
                    &mut uvs,
                    &mut indices,
                    radius_bottom,
                    -half,
                    radial,
                    false,
                );
            }
        }
        Self::new(positions, normals, uvs, indices)
    }

    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self::cylinder(0.0, radius, height, radial_segments, 1, false)
    }

    /// Axis-aligned box centred at the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) / 2.0;
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, right, up) in faces {
            let base = positions.len() as u32;
            for (u, v) in [(0.0, 1.0), (1.0, 1.0), (0.0, 0.0), (1.0, 0.0)] {
                let corner = normal + right * (u * 2.0 - 1.0) + up * (v * 2.0 - 1.0);
                positions.push(corner * half);
                normals.push(normal);
                uvs.push(Vec2::new(u, v));
            }
            indices.extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
        }
        Self::new(positions, normals, uvs, indices)
    }

    /// Ring in the XY plane around the Z axis.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial = radial_segments.max(3);
        let tubular = tubular_segments.max(3);

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        for j in 0..=radial {
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let v = j as f32 / radial as f32 * TAU;
                let position = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                positions.push(position);
                normals.push((position - center).normalize_or_zero());
                uvs.push(Vec2::new(
                    i as f32 / tubular as f32,
                    j as f32 / radial as f32,
                ));
            }
        }

        let mut indices = Vec::new();
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = (tubular + 1) * j + i - 1;
                let b = (tubular + 1) * (j - 1) + i - 1;
                let c = (tubular + 1) * (j - 1) + i;
                let d = (tubular + 1) * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        Self::new(positions, normals, uvs, indices)
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let columns = width_segments.max(3);
        let rows = height_segments.max(2);

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        for iy in 0..=rows {
            let v = iy as f32 / rows as f32;
            for ix in 0..=columns {
                let u = ix as f32 / columns as f32;
                let normal = Vec3::new(
                    -(u * TAU).cos() * (v * PI).sin(),
                    (v * PI).cos(),
                    (u * TAU).sin() * (v * PI).sin(),
                );
                positions.push(normal * radius);
                normals.push(normal);
                uvs.push(Vec2::new(u, 1.0 - v));
            }
        }

        let row = columns + 1;
        let mut indices = Vec::new();
        for iy in 0..rows {
            for ix in 0..columns {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != rows - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }
        Self::new(positions, normals, uvs, indices)
    }

    /// Flat-shaded regular dodecahedron inscribed in a sphere of `radius`.
    pub fn dodecahedron(radius: f32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let r = 1.0 / t;
        #[rustfmt::skip]
        let corners = [
            [-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [-1.0, 1.0, 1.0],
            [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0],
            [0.0, -r, -t], [0.0, -r, t], [0.0, r, -t], [0.0, r, t],
            [-r, -t, 0.0], [-r, t, 0.0], [r, -t, 0.0], [r, t, 0.0],
            [-t, 0.0, -r], [t, 0.0, -r], [-t, 0.0, r], [t, 0.0, r],
        ];
        #[rustfmt::skip]
        let faces: [u32; 108] = [
            3, 11, 7, 3, 7, 15, 3, 15, 13,
            7, 19, 17, 7, 17, 6, 7, 6, 15,
            17, 4, 8, 17, 8, 10, 17, 10, 6,
            8, 0, 16, 8, 16, 2, 8, 2, 10,
            0, 12, 1, 0, 1, 18, 0, 18, 16,
            6, 10, 2, 6, 2, 13, 6, 13, 15,
            2, 16, 18, 2, 18, 3, 2, 3, 13,
            18, 1, 9, 18, 9, 11, 18, 11, 3,
            4, 14, 12, 4, 12, 0, 4, 0, 8,
            11, 9, 5, 11, 5, 19, 11, 19, 7,
            19, 5, 14, 19, 14, 4, 19, 4, 17,
            1, 12, 14, 1, 14, 5, 1, 5, 9,
        ];
        polyhedron(&corners, &faces, radius)
    }

    /// Flat-shaded regular icosahedron inscribed in a sphere of `radius`.
    pub fn icosahedron(radius: f32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        #[rustfmt::skip]
        let corners = [
            [-1.0, t, 0.0], [1.0, t, 0.0], [-1.0, -t, 0.0], [1.0, -t, 0.0],
            [0.0, -1.0, t], [0.0, 1.0, t], [0.0, -1.0, -t], [0.0, 1.0, -t],
            [t, 0.0, -1.0], [t, 0.0, 1.0], [-t, 0.0, -1.0], [-t, 0.0, 1.0],
        ];
        #[rustfmt::skip]
        let faces: [u32; 60] = [
            0, 11, 5, 0, 5, 1, 0, 1, 7, 0, 7, 10, 0, 10, 11,
            1, 5, 9, 5, 11, 4, 11, 10, 2, 10, 7, 6, 7, 1, 8,
            3, 9, 4, 3, 4, 2, 3, 2, 6, 3, 6, 8, 3, 8, 9,
            4, 9, 5, 2, 4, 11, 6, 2, 10, 8, 6, 7, 9, 8, 1,
        ];
        polyhedron(&corners, &faces, radius)
    }
}

#[allow(clippy::too_many_arguments)]
fn push_cap(
    positions: &mut Vec<Vec3>,
    normals: &mut Vec<Vec3>,
    uvs: &mut Vec<Vec2>,
    indices: &mut Vec<u32>,
    radius: f32,
    y: f32,
    radial: u32,
    top: bool,
) {
    let normal = if top { Vec3::Y } else { Vec3::NEG_Y };
    let center = positions.len() as u32;
    positions.push(Vec3::new(0.0, y, 0.0));
    normals.push(normal);
    uvs.push(Vec2::splat(0.5));

    let first = positions.len() as u32;
    for x in 0..=radial {
        let theta = x as f32 / radial as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        positions.push(Vec3::new(radius * sin, y, radius * cos));
        normals.push(normal);
        uvs.push(Vec2::new(cos * 0.5 + 0.5, sin * 0.5 + 0.5));
    }
    for x in 0..radial {
        let a = first + x;
        let b = first + x + 1;
        if top {
            indices.extend_from_slice(&[a, b, center]);
        } else {
            indices.extend_from_slice(&[b, a, center]);
        }
    }
}

/// Projects `corners` onto a sphere and emits one flat triangle per face,
/// wound so every face normal points away from the centre.
fn polyhedron(corners: &[[f32; 3]], faces: &[u32], radius: f32) -> Geometry {
    let projected: Vec<Vec3> = corners
        .iter()
        .map(|corner| Vec3::from_array(*corner).normalize() * radius)
        .collect();

    let mut positions = Vec::with_capacity(faces.len());
    let mut normals = Vec::with_capacity(faces.len());
    let mut uvs = Vec::with_capacity(faces.len());
    for triangle in faces.chunks_exact(3) {
        let mut a = projected[triangle[0] as usize];
        let b = projected[triangle[1] as usize];
        let mut c = projected[triangle[2] as usize];
        let mut normal = (b - a).cross(c - a).normalize_or_zero();
        if normal.dot(a + b + c) < 0.0 {
            std::mem::swap(&mut a, &mut c);
            normal = -normal;
        }
        for vertex in [a, b, c] {
            positions.push(vertex);
            normals.push(normal);
            uvs.push(spherical_uv(vertex));
        }
    }
    let indices = (0..positions.len() as u32).collect();
    Geometry::new(positions, normals, uvs, indices)
}

fn spherical_uv(point: Vec3) -> Vec2 {
    let direction = point.normalize_or_zero();
    let azimuth = direction.z.atan2(-direction.x);
    let inclination = (-direction.y).atan2((direction.x * direction.x + direction.z * direction.z).sqrt());
    Vec2::new(azimuth / TAU + 0.5, inclination / PI + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counter-clockwise triangles, so back-face culling keeps the outside.
    fn assert_wound_outwards(geometry: &Geometry) {
        for triangle in geometry.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| triangle[i] as usize);
            let [pa, pb, pc] = [a, b, c].map(|i| geometry.positions[i]);
            let face = (pb - pa).cross(pc - pa);
            if face.length() < 1e-6 {
                continue;
            }
            let normal = geometry.normals[a] + geometry.normals[b] + geometry.normals[c];
            assert!(face.dot(normal) > 0.0, "triangle {triangle:?} faces inwards");
        }
    }

    #[test]
    fn primitives_wind_counter_clockwise() {
        assert_wound_outwards(&Geometry::plane(4.0, 2.0, 3, 2));
        assert_wound_outwards(&Geometry::cylinder(0.15, 0.25, 4.0, 6, 2, false));
        assert_wound_outwards(&Geometry::cone(1.0, 2.0, 5));
        assert_wound_outwards(&Geometry::cuboid(1.0, 2.0, 3.0));
        assert_wound_outwards(&Geometry::torus(0.5, 0.05, 8, 16));
        assert_wound_outwards(&Geometry::sphere(0.1, 6, 6));
        assert_wound_outwards(&Geometry::dodecahedron(1.0));
        assert_wound_outwards(&Geometry::icosahedron(1.0));

        let mut ground = Geometry::plane(50.0, 50.0, 5, 5);
        ground.rotate_x(-std::f32::consts::FRAC_PI_2);
        assert_wound_outwards(&ground);
    }

    #[test]
    fn plane_has_expected_grid() {
        let plane = Geometry::plane(50.0, 50.0, 50, 50);
        assert_eq!(plane.vertex_count(), 51 * 51);
        assert_eq!(plane.triangle_count(), 50 * 50 * 2);
        let max_x = plane.positions.iter().map(|p| p.x).fold(f32::MIN, f32::max);
        assert!((max_x - 25.0).abs() < 1e-4);
        assert!(plane.uv2.is_none());
    }

    #[test]
    fn duplicated_uv_channel_matches_primary() {
        let mut plane = Geometry::plane(2.0, 2.0, 2, 2);
        plane.duplicate_uv_channel();
        assert_eq!(plane.uv2.as_ref(), Some(&plane.uvs));
        let interleaved = plane.interleaved();
        assert_eq!(interleaved.len(), plane.vertex_count() * VERTEX_STRIDE);
        assert_eq!(interleaved[6..8], interleaved[8..10]);
    }

    #[test]
    fn polyhedra_sit_on_their_sphere() {
        for (geometry, faces) in [
            (Geometry::dodecahedron(0.5), 36),
            (Geometry::icosahedron(0.5), 20),
        ] {
            assert_eq!(geometry.triangle_count(), faces);
            for position in &geometry.positions {
                assert!((position.length() - 0.5).abs() < 1e-5);
            }
            for (position, normal) in geometry.positions.iter().zip(&geometry.normals) {
                assert!(position.dot(*normal) > 0.0);
            }
        }
    }

    #[test]
    fn cone_apex_is_on_top() {
        let cone = Geometry::cone(1.2, 1.5, 32);
        let top = cone.positions.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        let bottom = cone.positions.iter().map(|p| p.y).fold(f32::MAX, f32::min);
        assert!((top - 0.75).abs() < 1e-5);
        assert!((bottom + 0.75).abs() < 1e-5);
    }

    #[test]
    fn open_cylinder_skips_caps() {
        let closed = Geometry::cylinder(1.0, 1.0, 2.0, 8, 1, false);
        let open = Geometry::cylinder(1.0, 1.0, 2.0, 8, 1, true);
        assert_eq!(open.triangle_count(), 16);
        assert_eq!(closed.triangle_count(), 32);
    }

    #[test]
    fn baked_transform_moves_positions_and_normals() {
        let mut cone = Geometry::cylinder(0.0, 1.0, 20.0, 8, 1, true);
        cone.translate(Vec3::new(0.0, -10.0, 0.0));
        cone.rotate_x(-std::f32::consts::FRAC_PI_2);
        let apex = cone.positions[0];
        assert!(apex.length() < 1e-4);
        let far_z = cone.positions.iter().map(|p| p.z).fold(f32::MIN, f32::max);
        assert!((far_z - 20.0).abs() < 1e-4);
        for normal in &cone.normals {
            assert!((normal.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn torus_and_box_counts() {
        let torus = Geometry::torus(1.05, 0.02, 8, 32);
        assert_eq!(torus.vertex_count(), 9 * 33);
        assert_eq!(torus.triangle_count(), 8 * 32 * 2);
        let cuboid = Geometry::cuboid(0.3, 0.5, 0.1);
        assert_eq!(cuboid.vertex_count(), 24);
        let max_y = cuboid.positions.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((max_y - 0.25).abs() < 1e-6);
    }
}
