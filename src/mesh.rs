//! Procedural geometry for the demo primitives.
//!
//! This module generates CPU-side vertex and index arrays for:
//!
//! - [`Mesh::triangle`]: the single "hello triangle"
//! - [`Mesh::cube`]: a flat-shaded cube, 24 vertices and 36 indices
//! - [`Mesh::sphere`]: a latitude/longitude (UV) sphere
//!
//! # Selecting Attributes
//!
//! Every generator takes an [`Attributes`] set naming the arrays to compute.
//! Arrays that are not requested are never allocated and come back as `None`;
//! the vertex and index counts are reported either way.
//!
//! ```
//! use tessera::{Attributes, Mesh};
//!
//! let sphere = Mesh::sphere(32, 1.0, Attributes::POSITIONS | Attributes::INDICES)?;
//! assert_eq!(sphere.vertex_count(), 17 * 33);
//! assert!(sphere.normals().is_none());
//! assert_eq!(sphere.indices().map(<[u16]>::len), Some(sphere.index_count() as usize));
//! # Ok::<(), tessera::MeshError>(())
//! ```
//!
//! # Buffer Layout
//!
//! Arrays are tightly packed and parallel, one entry per vertex:
//!
//! | Attribute  | Element    | Flat view                  |
//! |------------|------------|----------------------------|
//! | positions  | `[f32; 3]` | [`Mesh::positions_flat`]   |
//! | normals    | `[f32; 3]` | [`Mesh::normals_flat`]     |
//! | tex_coords | `[f32; 2]` | [`Mesh::tex_coords_flat`]  |
//! | colors     | `[f32; 3]` | [`Mesh::colors_flat`]      |
//!
//! Indices are `u16` and form an independent triangle list with
//! counter-clockwise front faces.

use std::f32::consts::PI;

use bitflags::bitflags;
use rand::Rng;

/// Largest vertex count addressable by 16-bit indices.
pub const MAX_VERTICES: u32 = u16::MAX as u32;

/// Fewest slices a sphere can have and still get a ring between its poles.
pub const MIN_SPHERE_SLICES: u32 = 4;

bitflags! {
    /// The vertex arrays a generator should compute.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        /// Vertex positions, three floats each.
        const POSITIONS = 1 << 0;
        /// Unit surface normals, three floats each.
        const NORMALS = 1 << 1;
        /// Texture coordinates in `[0, 1]`, two floats each.
        const TEX_COORDS = 1 << 2;
        /// The `u16` triangle index list.
        const INDICES = 1 << 3;
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::all()
    }
}

/// Errors raised while generating or decorating a mesh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    /// The sphere would need more vertices than 16-bit indices can address.
    #[error(
        "sphere with {slices} slices needs {vertices} vertices, more than the {limit} addressable by u16 indices"
    )]
    TooManyVertices { slices: u32, vertices: u64, limit: u32 },

    /// Too few slices to form a sphere.
    #[error("sphere needs at least {min} slices, got {slices}")]
    TooFewSlices { slices: u32, min: u32 },

    /// Caller-supplied per-vertex colours do not match the vertex count.
    #[error("mesh has {expected} vertices but {actual} colours were supplied")]
    ColorCountMismatch { expected: usize, actual: usize },
}

/// CPU-side geometry produced by the generators in this module.
///
/// A `Mesh` owns its arrays. Requested arrays are `Some` and hold exactly
/// [`vertex_count`](Self::vertex_count) entries (or
/// [`index_count`](Self::index_count) indices); skipped arrays are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertex_count: u32,
    index_count: u32,
    positions: Option<Vec<[f32; 3]>>,
    normals: Option<Vec<[f32; 3]>>,
    tex_coords: Option<Vec<[f32; 2]>>,
    colors: Option<Vec<[f32; 3]>>,
    indices: Option<Vec<u16>>,
}

/// Closed-form vertex and index counts of a UV sphere.
///
/// A sphere with `slices` longitude steps has `slices / 2` latitude steps.
/// Each of the `slices / 2 + 1` rings holds `slices + 1` vertices (the seam
/// column is duplicated so `u` can reach 1.0), and every ring-to-ring cell
/// contributes two triangles.
///
/// ```
/// use tessera::SphereLayout;
///
/// let layout = SphereLayout::new(350);
/// assert_eq!(layout.vertex_count(), 61_776);
/// assert_eq!(layout.index_count(), 367_500);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SphereLayout {
    slices: u32,
    parallels: u32,
}

impl SphereLayout {
    /// Layout for `slices` longitude steps. Nothing is checked until [`validate`](Self::validate).
    pub fn new(slices: u32) -> Self {
        Self {
            slices,
            parallels: slices / 2,
        }
    }

    /// Longitude steps around the equator.
    pub fn slices(&self) -> u32 {
        self.slices
    }

    /// Latitude steps from pole to pole.
    pub fn parallels(&self) -> u32 {
        self.parallels
    }

    /// Vertices per ring, including the duplicated seam vertex.
    pub fn ring_len(&self) -> u64 {
        u64::from(self.slices) + 1
    }

    /// `(parallels + 1) · (slices + 1)`, widened so oversized layouts can be rejected.
    pub fn vertex_count(&self) -> u64 {
        (u64::from(self.parallels) + 1) * self.ring_len()
    }

    /// Two triangles per quad: `parallels · slices · 6`.
    pub fn index_count(&self) -> u64 {
        u64::from(self.parallels) * u64::from(self.slices) * 6
    }

    /// Checks the layout against the slice minimum and the 16-bit index range.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.slices < MIN_SPHERE_SLICES {
            return Err(MeshError::TooFewSlices {
                slices: self.slices,
                min: MIN_SPHERE_SLICES,
            });
        }
        let vertices = self.vertex_count();
        if vertices > u64::from(MAX_VERTICES) {
            return Err(MeshError::TooManyVertices {
                slices: self.slices,
                vertices,
                limit: MAX_VERTICES,
            });
        }
        Ok(())
    }
}

/// One face of the cube: outward normal and its four corners, counter-clockwise
/// when seen from outside, on a cube of half-extent 1.
struct CubeFace {
    normal: [f32; 3],
    corners: [[f32; 3]; 4],
}

#[rustfmt::skip]
const CUBE_FACES: [CubeFace; 6] = [
    // Front (Z+)
    CubeFace { normal: [ 0.0,  0.0,  1.0], corners: [[-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0]] },
    // Back (Z-)
    CubeFace { normal: [ 0.0,  0.0, -1.0], corners: [[ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0]] },
    // Top (Y+)
    CubeFace { normal: [ 0.0,  1.0,  0.0], corners: [[-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0]] },
    // Bottom (Y-)
    CubeFace { normal: [ 0.0, -1.0,  0.0], corners: [[-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0]] },
    // Right (X+)
    CubeFace { normal: [ 1.0,  0.0,  0.0], corners: [[ 1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0]] },
    // Left (X-)
    CubeFace { normal: [-1.0,  0.0,  0.0], corners: [[-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0]] },
];

const FACE_TEX_COORDS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Two triangles per quad, sharing the 0-2 diagonal.
const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

impl Mesh {
    /// The "hello triangle": three vertices in the `z = 0` plane,
    /// facing `+Z`.
    pub fn triangle(attributes: Attributes) -> Self {
        let mut mesh = Self::with_counts(3, 3);

        if attributes.contains(Attributes::POSITIONS) {
            mesh.positions = Some(vec![[0.0, 0.5, 0.0], [-0.5, -0.5, 0.0], [0.5, -0.5, 0.0]]);
        }
        if attributes.contains(Attributes::NORMALS) {
            mesh.normals = Some(vec![[0.0, 0.0, 1.0]; 3]);
        }
        if attributes.contains(Attributes::TEX_COORDS) {
            mesh.tex_coords = Some(vec![[0.5, 0.0], [0.0, 1.0], [1.0, 1.0]]);
        }
        if attributes.contains(Attributes::INDICES) {
            mesh.indices = Some(vec![0, 1, 2]);
        }

        mesh
    }

    /// A cube centred at the origin spanning `[-scale/2, scale/2]` on each axis.
    ///
    /// Each face gets its own four vertices so that every vertex carries the
    /// face's normal (flat shading) and each face maps the full `[0, 1]`
    /// texture range. The mesh always has 24 vertices and 36 indices.
    ///
    /// ```
    /// use tessera::{Attributes, Mesh};
    ///
    /// let cube = Mesh::cube(2.0, Attributes::all());
    /// assert_eq!((cube.vertex_count(), cube.index_count()), (24, 36));
    /// ```
    pub fn cube(scale: f32, attributes: Attributes) -> Self {
        let mut mesh = Self::with_counts(24, 36);
        let half = 0.5 * scale;

        if attributes.contains(Attributes::POSITIONS) {
            mesh.positions = Some(
                CUBE_FACES
                    .iter()
                    .flat_map(|face| face.corners)
                    .map(|[x, y, z]| [x * half, y * half, z * half])
                    .collect(),
            );
        }
        if attributes.contains(Attributes::NORMALS) {
            mesh.normals = Some(
                CUBE_FACES
                    .iter()
                    .flat_map(|face| [face.normal; 4])
                    .collect(),
            );
        }
        if attributes.contains(Attributes::TEX_COORDS) {
            mesh.tex_coords = Some(CUBE_FACES.iter().flat_map(|_| FACE_TEX_COORDS).collect());
        }
        if attributes.contains(Attributes::INDICES) {
            mesh.indices = Some(
                (0..CUBE_FACES.len() as u16)
                    .flat_map(|face| QUAD_INDICES.map(|i| face * 4 + i))
                    .collect(),
            );
        }

        mesh
    }

    /// A UV sphere of the given radius centred at the origin.
    ///
    /// See [`SphereLayout`] for the vertex and index counts. Rings run from the
    /// north pole (`+Y`, `v = 0`) to the south pole (`-Y`, `v = 1`); samples
    /// within a ring run around the `Y` axis starting at `+Z` (`u = 0`).
    ///
    /// Both pole rings keep one vertex per longitude sample. They share a
    /// position and normal but have distinct `u`, so the triangles touching a
    /// pole have zero area. They are emitted anyway, which keeps the index
    /// count at its closed form.
    ///
    /// # Errors
    ///
    /// - [`MeshError::TooFewSlices`] if `slices < 4`.
    /// - [`MeshError::TooManyVertices`] if the vertex count exceeds
    ///   [`MAX_VERTICES`]. Checked before anything is allocated.
    pub fn sphere(slices: u32, radius: f32, attributes: Attributes) -> Result<Self, MeshError> {
        let layout = SphereLayout::new(slices);
        layout.validate()?;

        // Both counts fit in u32 once the vertex count fits in u16.
        let mut mesh = Self::with_counts(layout.vertex_count() as u32, layout.index_count() as u32);
        let parallels = layout.parallels();
        let ring_len = layout.ring_len() as usize;
        let vertex_count = mesh.vertex_count as usize;

        let wants_vertices = attributes
            .intersects(Attributes::POSITIONS | Attributes::NORMALS | Attributes::TEX_COORDS);
        if wants_vertices {
            let mut positions = attributes
                .contains(Attributes::POSITIONS)
                .then(|| Vec::with_capacity(vertex_count));
            let mut normals = attributes
                .contains(Attributes::NORMALS)
                .then(|| Vec::with_capacity(vertex_count));
            let mut tex_coords = attributes
                .contains(Attributes::TEX_COORDS)
                .then(|| Vec::with_capacity(vertex_count));

            let latitude_step = PI / parallels as f32;
            let longitude_step = 2.0 * PI / slices as f32;

            for ring in 0..=parallels {
                let (sin_phi, cos_phi) = (latitude_step * ring as f32).sin_cos();

                for sample in 0..=slices {
                    let (sin_theta, cos_theta) = (longitude_step * sample as f32).sin_cos();
                    let direction = [sin_phi * sin_theta, cos_phi, sin_phi * cos_theta];

                    if let Some(positions) = positions.as_mut() {
                        positions.push(direction.map(|c| c * radius));
                    }
                    if let Some(normals) = normals.as_mut() {
                        normals.push(direction);
                    }
                    if let Some(tex_coords) = tex_coords.as_mut() {
                        tex_coords
                            .push([sample as f32 / slices as f32, ring as f32 / parallels as f32]);
                    }
                }
            }

            mesh.positions = positions;
            mesh.normals = normals;
            mesh.tex_coords = tex_coords;
        }

        if attributes.contains(Attributes::INDICES) {
            let mut indices = Vec::with_capacity(mesh.index_count as usize);

            for ring in 0..parallels as usize {
                for sample in 0..slices as usize {
                    let current = (ring * ring_len + sample) as u16;
                    let below = ((ring + 1) * ring_len + sample) as u16;

                    indices.extend_from_slice(&[current, below, below + 1]);
                    indices.extend_from_slice(&[current, below + 1, current + 1]);
                }
            }

            mesh.indices = Some(indices);
        }

        log::info!(
            "created sphere: {} slices, {} vertices, {} indices",
            slices,
            mesh.vertex_count,
            mesh.index_count
        );

        Ok(mesh)
    }

    fn with_counts(vertex_count: u32, index_count: u32) -> Self {
        Self {
            vertex_count,
            index_count,
            ..Default::default()
        }
    }

    /// Number of vertices, whether or not any vertex array was computed.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of indices, whether or not the index array was computed.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Vertex positions, if requested at generation time.
    pub fn positions(&self) -> Option<&[[f32; 3]]> {
        self.positions.as_deref()
    }

    /// Unit normals, one per vertex.
    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    /// Texture coordinates in `[0, 1]`.
    pub fn tex_coords(&self) -> Option<&[[f32; 2]]> {
        self.tex_coords.as_deref()
    }

    /// Per-vertex colours, set by [`set_colors`](Self::set_colors) or the random helpers.
    pub fn colors(&self) -> Option<&[[f32; 3]]> {
        self.colors.as_deref()
    }

    /// Triangle list indices, counter-clockwise when seen from outside.
    pub fn indices(&self) -> Option<&[u16]> {
        self.indices.as_deref()
    }

    /// Positions as a flat `x, y, z, x, y, z, …` slice.
    pub fn positions_flat(&self) -> Option<&[f32]> {
        self.positions().map(bytemuck::cast_slice)
    }

    /// Normals as a flat `x, y, z, …` slice.
    pub fn normals_flat(&self) -> Option<&[f32]> {
        self.normals().map(bytemuck::cast_slice)
    }

    /// Texture coordinates as a flat `u, v, u, v, …` slice.
    pub fn tex_coords_flat(&self) -> Option<&[f32]> {
        self.tex_coords().map(bytemuck::cast_slice)
    }

    /// Colours as a flat `r, g, b, …` slice.
    pub fn colors_flat(&self) -> Option<&[f32]> {
        self.colors().map(bytemuck::cast_slice)
    }

    /// Attaches caller-supplied per-vertex colours.
    ///
    /// # Errors
    ///
    /// [`MeshError::ColorCountMismatch`] unless there is exactly one colour per
    /// vertex. The mesh is unchanged on error.
    pub fn set_colors(&mut self, colors: Vec<[f32; 3]>) -> Result<(), MeshError> {
        let expected = self.vertex_count as usize;
        if colors.len() != expected {
            return Err(MeshError::ColorCountMismatch {
                expected,
                actual: colors.len(),
            });
        }
        self.colors = Some(colors);
        Ok(())
    }

    /// Gives every vertex a random colour.
    ///
    /// Each channel is `k / 255` for a uniformly drawn `k` in `1..=255`, so no
    /// channel is ever fully black.
    pub fn with_random_colors<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        let colors = (0..self.vertex_count)
            .map(|_| [(); 3].map(|_| rng.random_range(1..=255u8) as f32 / 255.0))
            .collect();
        self.colors = Some(colors);
        self
    }

    /// Which arrays this mesh carries (colours are not an [`Attributes`] flag).
    pub fn attributes(&self) -> Attributes {
        let mut attributes = Attributes::empty();
        attributes.set(Attributes::POSITIONS, self.positions.is_some());
        attributes.set(Attributes::NORMALS, self.normals.is_some());
        attributes.set(Attributes::TEX_COORDS, self.tex_coords.is_some());
        attributes.set(Attributes::INDICES, self.indices.is_some());
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::SeedableRng;
    use rstest::rstest;

    fn triangle_normal(positions: &[[f32; 3]], tri: &[u16]) -> Vec3 {
        let a = Vec3::from(positions[tri[0] as usize]);
        let b = Vec3::from(positions[tri[1] as usize]);
        let c = Vec3::from(positions[tri[2] as usize]);
        (b - a).cross(c - a)
    }

    #[test]
    fn triangle_is_ccw_facing_z() {
        let mesh = Mesh::triangle(Attributes::all());
        let n = triangle_normal(mesh.positions().unwrap(), mesh.indices().unwrap());
        assert!(n.z > 0.0);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
    }

    #[rstest]
    #[case(0.01)]
    #[case(1.0)]
    #[case(2.0)]
    #[case(1000.0)]
    fn cube_counts_are_scale_invariant(#[case] scale: f32) {
        let cube = Mesh::cube(scale, Attributes::all());
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.positions().unwrap().len(), 24);
        assert_eq!(cube.indices().unwrap().len(), 36);

        for p in cube.positions().unwrap() {
            for c in p {
                assert!(c.abs() <= scale);
                assert_eq!(c.abs(), 0.5 * scale);
            }
        }
    }

    #[test]
    fn cube_faces_are_flat_and_outward() {
        let cube = Mesh::cube(1.0, Attributes::all());
        let positions = cube.positions().unwrap();
        let normals = cube.normals().unwrap();

        for tri in cube.indices().unwrap().chunks(3) {
            let face_normal = triangle_normal(positions, tri).normalize();
            for &i in tri {
                let n = Vec3::from(normals[i as usize]);
                assert!(face_normal.abs_diff_eq(n, 1e-6), "winding disagrees with normal");
                assert!(Vec3::from(positions[i as usize]).dot(n) > 0.0);
            }
        }
    }

    #[test]
    fn cube_tex_coords_span_each_face() {
        let cube = Mesh::cube(3.0, Attributes::TEX_COORDS);
        let tex = cube.tex_coords().unwrap();
        assert_eq!(tex.len(), 24);
        for face in tex.chunks(4) {
            assert_eq!(face, &FACE_TEX_COORDS[..]);
        }
        assert!(cube.positions().is_none());
        assert!(cube.indices().is_none());
    }

    #[test]
    fn cube_indices_stay_in_range() {
        let cube = Mesh::cube(1.0, Attributes::INDICES);
        assert!(cube.indices().unwrap().iter().all(|&i| u32::from(i) < cube.vertex_count()));
    }

    #[rstest]
    #[case(350, 61_776, 367_500)]
    #[case(4, 15, 48)]
    #[case(5, 18, 60)]
    #[case(20, 231, 1_200)]
    #[case(361, 65_522, 389_880)]
    fn sphere_count_oracle(#[case] slices: u32, #[case] vertices: u32, #[case] indices: u32) {
        let sphere = Mesh::sphere(slices, 1.0, Attributes::INDICES).unwrap();
        assert_eq!(sphere.vertex_count(), vertices);
        assert_eq!(sphere.index_count(), indices);
        assert_eq!(sphere.indices().unwrap().len(), indices as usize);
    }

    #[rstest]
    #[case(4, 2, 15, 48)]
    #[case(361, 180, 65_522, 389_880)]
    #[case(362, 181, 66_066, 393_132)]
    fn sphere_layout_counts(
        #[case] slices: u32,
        #[case] parallels: u32,
        #[case] vertices: u64,
        #[case] indices: u64,
    ) {
        let layout = SphereLayout::new(slices);
        assert_eq!(layout.parallels(), parallels);
        assert_eq!(layout.vertex_count(), vertices);
        assert_eq!(layout.index_count(), indices);
    }

    #[test]
    fn sphere_rejects_vertex_overflow() {
        let err = Mesh::sphere(362, 1.0, Attributes::all()).unwrap_err();
        assert_eq!(
            err,
            MeshError::TooManyVertices {
                slices: 362,
                vertices: 66_066,
                limit: 65_535
            }
        );
        assert!(err.to_string().contains("66066"));

        assert!(Mesh::sphere(361, 1.0, Attributes::all()).is_ok());
        assert!(Mesh::sphere(u32::MAX, 1.0, Attributes::empty()).is_err());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    fn sphere_rejects_too_few_slices(#[case] slices: u32) {
        assert_eq!(
            Mesh::sphere(slices, 1.0, Attributes::all()).unwrap_err(),
            MeshError::TooFewSlices { slices, min: 4 }
        );
    }

    #[test]
    fn sphere_geometry() {
        let radius = 2.5;
        let sphere = Mesh::sphere(24, radius, Attributes::all()).unwrap();
        let positions = sphere.positions().unwrap();
        let normals = sphere.normals().unwrap();
        let tex = sphere.tex_coords().unwrap();
        let n = sphere.vertex_count() as usize;
        assert_eq!((positions.len(), normals.len(), tex.len()), (n, n, n));

        for ((p, nrm), uv) in positions.iter().zip(normals).zip(tex) {
            let p = Vec3::from(*p);
            let nrm = Vec3::from(*nrm);
            assert!((nrm.length() - 1.0).abs() < 1e-5);
            assert!((p.length() - radius).abs() < 1e-4);
            assert!(p.abs_diff_eq(nrm * radius, 1e-5));
            assert!((0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]));
        }
    }

    #[test]
    fn sphere_normals_ignore_radius() {
        let small = Mesh::sphere(12, 0.5, Attributes::NORMALS).unwrap();
        let large = Mesh::sphere(12, 40.0, Attributes::NORMALS).unwrap();
        assert_eq!(small.normals(), large.normals());
    }

    #[test]
    fn sphere_poles_are_duplicated() {
        let slices = 16;
        let sphere = Mesh::sphere(slices, 1.0, Attributes::all()).unwrap();
        let ring_len = slices as usize + 1;
        let positions = sphere.positions().unwrap();
        let tex = sphere.tex_coords().unwrap();

        let north = &positions[..ring_len];
        let south = &positions[positions.len() - ring_len..];
        for p in north {
            assert!(Vec3::from(*p).abs_diff_eq(Vec3::Y, 1e-6));
        }
        for p in south {
            assert!(Vec3::from(*p).abs_diff_eq(-Vec3::Y, 1e-6));
        }

        // Same position, distinct u across the pole ring.
        let us: Vec<f32> = tex[..ring_len].iter().map(|uv| uv[0]).collect();
        assert_eq!(us.first(), Some(&0.0));
        assert_eq!(us.last(), Some(&1.0));
        assert!(us.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sphere_triangles_face_outward() {
        let sphere = Mesh::sphere(18, 1.0, Attributes::POSITIONS | Attributes::INDICES).unwrap();
        let positions = sphere.positions().unwrap();
        let indices = sphere.indices().unwrap();
        assert!(indices.iter().all(|&i| u32::from(i) < sphere.vertex_count()));

        let mut degenerate = 0;
        for tri in indices.chunks(3) {
            let n = triangle_normal(positions, tri);
            if n.length() < 1e-6 {
                degenerate += 1;
                continue;
            }
            let centroid = tri
                .iter()
                .map(|&i| Vec3::from(positions[i as usize]))
                .sum::<Vec3>();
            assert!(n.dot(centroid) > 0.0, "triangle {tri:?} faces inward");
        }
        // One zero-area triangle per cell on each pole row.
        assert_eq!(degenerate, 2 * 18);
    }

    #[test]
    fn skipped_attributes_are_not_allocated() {
        let sphere = Mesh::sphere(8, 1.0, Attributes::empty()).unwrap();
        assert_eq!(sphere.attributes(), Attributes::empty());
        assert_eq!(sphere.vertex_count(), 45);
        assert_eq!(sphere.index_count(), 192);
        assert!(sphere.positions_flat().is_none());

        let partial = Mesh::sphere(8, 1.0, Attributes::NORMALS | Attributes::TEX_COORDS).unwrap();
        assert_eq!(partial.attributes(), Attributes::NORMALS | Attributes::TEX_COORDS);
    }

    #[test]
    fn flat_views_match_counts() {
        let cube = Mesh::cube(1.0, Attributes::all());
        assert_eq!(cube.positions_flat().unwrap().len(), 24 * 3);
        assert_eq!(cube.normals_flat().unwrap().len(), 24 * 3);
        assert_eq!(cube.tex_coords_flat().unwrap().len(), 24 * 2);
    }

    #[test]
    fn colors_must_match_vertex_count() {
        let mut cube = Mesh::cube(1.0, Attributes::POSITIONS);
        let err = cube.set_colors(vec![[1.0, 0.0, 0.0]; 3]).unwrap_err();
        assert_eq!(
            err,
            MeshError::ColorCountMismatch {
                expected: 24,
                actual: 3
            }
        );
        assert!(cube.colors().is_none());

        cube.set_colors(vec![[0.0, 1.0, 0.0]; 24]).unwrap();
        assert_eq!(cube.colors_flat().unwrap().len(), 72);
    }

    #[test]
    fn random_colors_stay_in_range() {
        let mut rng = rand_pcg::Pcg32::seed_from_u64(7);
        let cube = Mesh::cube(1.0, Attributes::POSITIONS).with_random_colors(&mut rng);
        let colors = cube.colors().unwrap();
        assert_eq!(colors.len(), 24);
        for c in colors.iter().flatten() {
            assert!(*c >= 1.0 / 255.0 && *c <= 1.0);
        }
    }
}
