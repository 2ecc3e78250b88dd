//! Face and vertex normal evaluation over a [`MeshModel`].
//!
//! Geometry is evaluated in `f64` so that large but finite coordinates do
//! not overflow the cross product. Triangles with a non-finite corner have
//! a zero normal, like triangles without area.

use crate::geometry_indices::{FaceIndex, VertexIndex};
use crate::mesh_model::MeshModel;
use crate::vector::Vector3f;

type Wide = [f64; 3];

fn widen(p: Vector3f) -> Wide {
    [f64::from(p.x), f64::from(p.y), f64::from(p.z)]
}

fn sub(a: Wide, b: Wide) -> Wide {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: Wide, b: Wide) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Wide, b: Wide) -> Wide {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Unit normal of a triangle with counter-clockwise winding, zero when the
/// triangle has no area or a corner is not finite.
pub fn triangle_normal(p0: Vector3f, p1: Vector3f, p2: Vector3f) -> Vector3f {
    if !(p0.is_finite() && p1.is_finite() && p2.is_finite()) {
        return Vector3f::ZERO;
    }
    let a = widen(p0);
    let n = cross(sub(widen(p1), a), sub(widen(p2), a));
    let len = dot(n, n).sqrt();
    if len > 0.0 && len.is_finite() {
        Vector3f::new((n[0] / len) as f32, (n[1] / len) as f32, (n[2] / len) as f32)
    } else {
        Vector3f::ZERO
    }
}

/// Interior angle at `p` between the edges towards `next` and `prev`.
fn corner_angle(p: Vector3f, next: Vector3f, prev: Vector3f) -> f32 {
    let a = sub(widen(next), widen(p));
    let b = sub(widen(prev), widen(p));
    let denom = dot(a, a).sqrt() * dot(b, b).sqrt();
    if denom > 0.0 && denom.is_finite() {
        (dot(a, b) / denom).clamp(-1.0, 1.0).acos() as f32
    } else {
        0.0
    }
}

pub fn face_normal(model: &MeshModel, face: FaceIndex) -> Vector3f {
    let [p0, p1, p2] = model.face_positions(face);
    triangle_normal(p0, p1, p2)
}

/// One normal per face, indexed like [`MeshModel::faces`].
pub fn face_normals(model: &MeshModel) -> Vec<Vector3f> {
    (0..model.face_count())
        .map(|i| face_normal(model, FaceIndex::from(i)))
        .collect()
}

/// Angle-weighted vertex normals.
///
/// Each vertex sums the unit normals of its non-degenerate incident faces,
/// weighted by the interior angle at that vertex. The sum is zero for
/// vertices touched only by degenerate faces and for faces that cancel
/// out, such as two triangles back to back; see [`corner_normals`].
pub fn vertex_normals(model: &MeshModel) -> Vec<Vector3f> {
    let flat = face_normals(model);
    model
        .vertices()
        .iter()
        .enumerate()
        .map(|(i, vertex)| {
            let index = VertexIndex::from(i);
            let mut sum = Vector3f::ZERO;
            for &face in vertex.incident_faces() {
                if model.face(face).is_degenerate() {
                    continue;
                }
                let Some(corner) = model.face(face).vertices().iter().position(|&v| v == index)
                else {
                    continue;
                };
                let p = model.face_positions(face);
                let angle = corner_angle(p[corner], p[(corner + 1) % 3], p[(corner + 2) % 3]);
                sum += flat[face.index()] * angle;
            }
            sum.normalized()
        })
        .collect()
}

/// Smooth normals for the three corners of `face`.
///
/// A corner whose vertex normal is zero takes the face normal instead, so
/// every corner of a non-degenerate face gets a unit normal. Degenerate
/// faces get three zero normals.
pub fn corner_normals(
    model: &MeshModel,
    face: FaceIndex,
    vertex_normals: &[Vector3f],
) -> [Vector3f; 3] {
    if model.face(face).is_degenerate() {
        return [Vector3f::ZERO; 3];
    }
    let mut flat = None;
    model.face(face).vertices().map(|v| {
        let n = vertex_normals[v.index()];
        if n.is_finite() && n != Vector3f::ZERO {
            n
        } else {
            *flat.get_or_insert_with(|| face_normal(model, face))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_indices::VertexIndex;

    fn approx(a: Vector3f, b: Vector3f) -> bool {
        (a - b).length() < 1e-5
    }

    fn model(positions: Vec<Vector3f>, faces: &[[u32; 3]]) -> MeshModel {
        let mut model = MeshModel::new();
        model.set_vertices(positions).unwrap();
        model.begin_faces(faces.len()).unwrap();
        for f in faces {
            model.add_face(*f, 0).unwrap();
        }
        model
    }

    #[test]
    fn test_flat_normal_follows_winding() {
        let m = model(
            vec![
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1.0, 0.0, 0.0),
                Vector3f::new(0.0, 0.0, -1.0),
            ],
            &[[0, 1, 2]],
        );
        assert!(approx(face_normal(&m, FaceIndex(0)), Vector3f::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_degenerate_face_normal_is_zero() {
        let m = model(
            vec![
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1.0, 0.0, 0.0),
                Vector3f::new(2.0, 0.0, 0.0),
            ],
            &[[0, 1, 2]],
        );
        assert_eq!(face_normals(&m), vec![Vector3f::ZERO]);
        assert_eq!(vertex_normals(&m), vec![Vector3f::ZERO; 3]);
    }

    #[test]
    fn test_smooth_normal_of_planar_fan() {
        let m = model(
            vec![
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1.0, 0.0, 0.0),
                Vector3f::new(1.0, 1.0, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        );
        for n in vertex_normals(&m) {
            assert!(approx(n, Vector3f::new(0.0, 0.0, 1.0)));
        }
    }

    #[test]
    fn test_angle_weighting_on_edge_of_box() {
        // Two perpendicular quads meeting along the x axis.
        let m = model(
            vec![
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1.0, 0.0, 0.0),
                Vector3f::new(1.0, 1.0, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
                Vector3f::new(0.0, 0.0, 1.0),
                Vector3f::new(1.0, 0.0, 1.0),
            ],
            &[[0, 1, 2], [0, 2, 3], [0, 4, 5], [0, 5, 1]],
        );
        let normals = vertex_normals(&m);
        // Vertex 0 sees 90 degrees of each plane, so the result bisects them.
        let expected = Vector3f::new(0.0, 1.0, 1.0).normalized();
        assert!(approx(normals[VertexIndex(0).index()], expected));
        // Vertex 3 only touches the z-up plane.
        assert!(approx(normals[3], Vector3f::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_back_to_back_faces_keep_face_normals() {
        let m = model(
            vec![
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1.0, 0.0, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 1]],
        );
        assert!(!m.face(FaceIndex(0)).is_degenerate());
        assert!(!m.face(FaceIndex(1)).is_degenerate());

        let smooth = vertex_normals(&m);
        assert_eq!(smooth, vec![Vector3f::ZERO; 3]);
        assert_eq!(
            corner_normals(&m, FaceIndex(0), &smooth),
            [Vector3f::new(0.0, 0.0, 1.0); 3]
        );
        assert_eq!(
            corner_normals(&m, FaceIndex(1), &smooth),
            [Vector3f::new(0.0, 0.0, -1.0); 3]
        );
    }

    #[test]
    fn test_corner_normals_are_unit_for_every_kept_face() {
        let m = model(
            vec![
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1.0, 0.0, 0.0),
                Vector3f::new(1.0, 1.0, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
                Vector3f::new(0.0, 0.0, 1.0),
                Vector3f::new(2.0, 0.0, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3], [0, 4, 1], [0, 1, 4], [1, 3, 2], [0, 1, 5]],
        );
        let smooth = vertex_normals(&m);
        for i in 0..m.face_count() {
            let face = FaceIndex::from(i);
            for n in corner_normals(&m, face, &smooth) {
                if m.face(face).is_degenerate() {
                    assert_eq!(n, Vector3f::ZERO);
                } else {
                    assert!((n.length() - 1.0).abs() < 1e-5, "face {} corner {:?}", i, n);
                }
            }
        }
    }

    #[test]
    fn test_large_coordinates_do_not_overflow() {
        let n = triangle_normal(
            Vector3f::new(0.0, 0.0, 0.0),
            Vector3f::new(1e20, 0.0, 0.0),
            Vector3f::new(0.0, 1e20, 0.0),
        );
        assert_eq!(n, Vector3f::new(0.0, 0.0, 1.0));

        let n = triangle_normal(
            Vector3f::new(-3e38, 0.0, 0.0),
            Vector3f::new(3e38, 0.0, 0.0),
            Vector3f::new(0.0, 3e38, 0.0),
        );
        assert_eq!(n, Vector3f::new(0.0, 0.0, 1.0));

        let m = model(
            vec![
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1e20, 0.0, 0.0),
                Vector3f::new(0.0, 1e20, 0.0),
            ],
            &[[0, 1, 2]],
        );
        for n in vertex_normals(&m) {
            assert!(approx(n, Vector3f::new(0.0, 0.0, 1.0)));
        }
    }

    #[test]
    fn test_non_finite_corner_gives_zero_normal() {
        for bad in [f32::NAN, f32::INFINITY] {
            let n = triangle_normal(
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1.0, 0.0, 0.0),
                Vector3f::new(bad, 1.0, 0.0),
            );
            assert_eq!(n, Vector3f::ZERO);
        }
    }
}
