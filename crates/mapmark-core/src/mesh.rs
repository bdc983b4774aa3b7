//! Polygon meshes and the few geometric operations the composer needs

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// Segment count used for cylinder primitives
pub const CYLINDER_SEGMENTS: u32 = 32;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in points {
            bounds.min = bounds.min.min(*p);
            bounds.max = bounds.max.max(*p);
        }
        Some(bounds)
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }
}

/// A polygon mesh. Faces are vertex index loops, counter-clockwise when seen
/// from the side their normal points to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<DVec3>,
    pub faces: Vec<Vec<u32>>,
}

impl Mesh {
    /// Closed cylinder centered on the origin, axis along Z
    pub fn cylinder(radius: f64, depth: f64, segments: u32) -> Self {
        let segments = segments.max(3);
        let half = depth / 2.0;
        let mut vertices = Vec::with_capacity(segments as usize * 2);

        for i in 0..segments {
            let angle = TAU * f64::from(i) / f64::from(segments);
            let (sin, cos) = angle.sin_cos();
            vertices.push(DVec3::new(radius * cos, radius * sin, -half));
            vertices.push(DVec3::new(radius * cos, radius * sin, half));
        }

        let mut faces = Vec::with_capacity(segments as usize + 2);
        for i in 0..segments {
            let next = (i + 1) % segments;
            faces.push(vec![2 * i, 2 * next, 2 * next + 1, 2 * i + 1]);
        }
        faces.push((0..segments).rev().map(|i| 2 * i).collect());
        faces.push((0..segments).map(|i| 2 * i + 1).collect());

        Self { vertices, faces }
    }

    /// Flat rectangle in the XY plane centered on the origin, facing +Z
    pub fn plane(width: f64, height: f64) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self {
            vertices: vec![
                DVec3::new(-hw, -hh, 0.0),
                DVec3::new(hw, -hh, 0.0),
                DVec3::new(hw, hh, 0.0),
                DVec3::new(-hw, hh, 0.0),
            ],
            faces: vec![vec![0, 1, 2, 3]],
        }
    }

    /// Build a flat mesh with one face per closed outline
    pub fn from_outlines(outlines: &[Vec<DVec3>]) -> Self {
        let mut mesh = Self::default();
        for outline in outlines.iter().filter(|o| o.len() >= 3) {
            let start = mesh.vertices.len() as u32;
            mesh.vertices.extend_from_slice(outline);
            mesh.faces.push((start..start + outline.len() as u32).collect());
        }
        mesh
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// Size of the bounding box, zero for an empty mesh
    pub fn extents(&self) -> DVec3 {
        self.bounds().map(|b| b.size()).unwrap_or(DVec3::ZERO)
    }

    /// Unit normal of a face (Newell's method)
    pub fn face_normal(&self, face: usize) -> DVec3 {
        let Some(indices) = self.faces.get(face) else {
            return DVec3::ZERO;
        };

        let mut normal = DVec3::ZERO;
        for (i, &a) in indices.iter().enumerate() {
            let b = indices[(i + 1) % indices.len()];
            let (p, q) = (self.vertices[a as usize], self.vertices[b as usize]);
            normal.x += (p.y - q.y) * (p.z + q.z);
            normal.y += (p.z - q.z) * (p.x + q.x);
            normal.z += (p.x - q.x) * (p.y + q.y);
        }
        normal.normalize_or_zero()
    }

    /// Average normal over all faces
    pub fn mean_normal(&self) -> DVec3 {
        (0..self.faces.len())
            .map(|f| self.face_normal(f))
            .sum::<DVec3>()
            .normalize_or_zero()
    }

    /// Edges used by exactly one face, in the direction that face walks them
    fn boundary_edges(&self) -> Vec<(u32, u32)> {
        let mut uses: HashMap<(u32, u32), usize> = HashMap::new();
        for face in &self.faces {
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                *uses.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }

        self.faces
            .iter()
            .flat_map(|face| {
                (0..face.len()).map(move |i| (face[i], face[(i + 1) % face.len()]))
            })
            .filter(|&(a, b)| uses.get(&(a.min(b), a.max(b))) == Some(&1))
            .collect()
    }

    /// Extrude every face by `offset` into a closed solid.
    ///
    /// The original faces become the flipped bottom cap, a translated copy
    /// becomes the top cap, and each boundary edge gets a side quad.
    pub fn extrude(&self, offset: DVec3) -> Mesh {
        let n = self.vertices.len() as u32;

        let mut vertices = self.vertices.clone();
        vertices.extend(self.vertices.iter().map(|v| *v + offset));

        let mut faces = Vec::with_capacity(self.faces.len() * 2);
        faces.extend(self.faces.iter().map(|f| f.iter().rev().copied().collect()));
        faces.extend(self.faces.iter().map(|f| f.iter().map(|i| i + n).collect()));
        faces.extend(
            self.boundary_edges()
                .into_iter()
                .map(|(a, b)| vec![a, b, b + n, a + n]),
        );

        Mesh { vertices, faces }
    }
}
