//! Decorative and contact shapes, and fitting analytic shapes to meshes

use glam::{DMat4, DVec3, DVec4};
use serde::{Deserialize, Serialize};

/// A shape attached to a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Sphere {
        radius: f64,
    },
    Brick {
        half_lengths: [f64; 3],
    },
    Ellipsoid {
        radii: [f64; 3],
    },
    Cylinder {
        radius: f64,
        half_height: f64,
    },
    /// A triangle mesh loaded from `file`. Vertices are kept inline so that
    /// fitting works without the mesh loader.
    Mesh {
        file: String,
        #[serde(default = "unit_scale")]
        scale_factors: [f64; 3],
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        vertices: Vec<[f64; 3]>,
    },
}

fn unit_scale() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Sphere { .. } => "Sphere",
            Shape::Brick { .. } => "Brick",
            Shape::Ellipsoid { .. } => "Ellipsoid",
            Shape::Cylinder { .. } => "Cylinder",
            Shape::Mesh { .. } => "Mesh",
        }
    }

    /// Mesh vertices with scale factors applied, `None` for analytic shapes
    pub fn scaled_vertices(&self) -> Option<Vec<DVec3>> {
        match self {
            Shape::Mesh {
                scale_factors,
                vertices,
                ..
            } => {
                let scale = DVec3::from_array(*scale_factors);
                Some(vertices.iter().map(|v| DVec3::from_array(*v) * scale).collect())
            }
            _ => None,
        }
    }

    /// Rough extent of the shape, used for scale-factor recommendations
    pub fn characteristic_size(&self) -> f64 {
        match self {
            Shape::Sphere { radius } => 2.0 * radius,
            Shape::Brick { half_lengths } => 2.0 * half_lengths.iter().cloned().fold(0.0, f64::max),
            Shape::Ellipsoid { radii } => 2.0 * radii.iter().cloned().fold(0.0, f64::max),
            Shape::Cylinder { radius, half_height } => 2.0 * radius.max(*half_height),
            Shape::Mesh { .. } => {
                let verts = self.scaled_vertices().unwrap_or_default();
                let Some(first) = verts.first() else {
                    return 0.0;
                };
                let (min, max) = verts
                    .iter()
                    .fold((*first, *first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
                (max - min).max_element()
            }
        }
    }
}

/// A sphere fitted to a point cloud
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedSphere {
    pub origin: DVec3,
    pub radius: f64,
}

/// Least-squares sphere fit.
///
/// Solves `x² + y² + z² = 2ax + 2by + 2cz + d` for the center `(a, b, c)`
/// and `r² = d + a² + b² + c²`. Returns `None` for fewer than four points or
/// a degenerate (e.g. coplanar) point set.
pub fn fit_sphere(points: &[DVec3]) -> Option<FittedSphere> {
    if points.len() < 4 {
        return None;
    }

    let mut ata = DMat4::ZERO;
    let mut atb = DVec4::ZERO;
    for p in points {
        let row = DVec4::new(2.0 * p.x, 2.0 * p.y, 2.0 * p.z, 1.0);
        let rhs = p.length_squared();
        // column-major accumulation of row * row^T
        ata.x_axis += row * row.x;
        ata.y_axis += row * row.y;
        ata.z_axis += row * row.z;
        ata.w_axis += row * row.w;
        atb += row * rhs;
    }

    let det = ata.determinant();
    if !det.is_finite() || det.abs() < 1e-12 {
        return None;
    }

    let solution = ata.inverse() * atb;
    let origin = solution.truncate();
    let r2 = solution.w + origin.length_squared();
    if !(r2 > 0.0) {
        return None;
    }

    Some(FittedSphere {
        origin,
        radius: r2.sqrt(),
    })
}

/// An ellipsoid fitted to a point cloud. `axes` form a right-handed
/// orthonormal basis, longest radius first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedEllipsoid {
    pub origin: DVec3,
    pub radii: [f64; 3],
    pub axes: [DVec3; 3],
}

/// A plane through `origin` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedPlane {
    pub origin: DVec3,
    pub normal: DVec3,
}

const JACOBI_SWEEPS: usize = 32;
const DEGENERATE: f64 = 1e-12;

fn centroid(points: &[DVec3]) -> DVec3 {
    points.iter().copied().sum::<DVec3>() / points.len() as f64
}

/// Eigen-decomposition of the covariance of `points` about `center`,
/// largest eigenvalue first
fn principal_axes(points: &[DVec3], center: DVec3) -> [(f64, DVec3); 3] {
    let mut a = [[0.0f64; 3]; 3];
    for p in points {
        let d = (*p - center).to_array();
        for (i, row) in a.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v += d[i] * d[j];
            }
        }
    }
    let n = points.len() as f64;
    a.iter_mut().flatten().for_each(|v| *v /= n);

    // cyclic Jacobi rotations; `v` accumulates eigenvectors as columns
    let mut v = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    for _ in 0..JACOBI_SWEEPS {
        let off = a[0][1].powi(2) + a[0][2].powi(2) + a[1][2].powi(2);
        if off < 1e-30 {
            break;
        }
        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            if a[p][q].abs() < 1e-300 {
                continue;
            }
            let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;
            for row in a.iter_mut() {
                let (kp, kq) = (row[p], row[q]);
                row[p] = c * kp - s * kq;
                row[q] = s * kp + c * kq;
            }
            for k in 0..3 {
                let (pk, qk) = (a[p][k], a[q][k]);
                a[p][k] = c * pk - s * qk;
                a[q][k] = s * pk + c * qk;
            }
            for row in v.iter_mut() {
                let (kp, kq) = (row[p], row[q]);
                row[p] = c * kp - s * kq;
                row[q] = s * kp + c * kq;
            }
        }
    }

    let mut pairs = [0, 1, 2].map(|i| (a[i][i], DVec3::new(v[0][i], v[1][i], v[2][i]).normalize()));
    pairs.sort_by(|x, y| y.0.total_cmp(&x.0));
    pairs
}

/// Principal-axis ellipsoid fit.
///
/// The axes are the principal directions of the point cloud. Along each axis
/// the radius is half the point cloud's extent and the origin sits midway
/// between its extremes. Returns `None` for fewer than four points or a
/// flat point set.
pub fn fit_ellipsoid(points: &[DVec3]) -> Option<FittedEllipsoid> {
    if points.len() < 4 {
        return None;
    }
    let center = centroid(points);
    let [(_, a0), (_, a1), _] = principal_axes(points, center);
    let axes = [a0, a1, a0.cross(a1)];

    let mut origin = center;
    let mut radii = [0.0; 3];
    for (radius, axis) in radii.iter_mut().zip(axes) {
        let (lo, hi) = points
            .iter()
            .map(|p| (*p - center).dot(axis))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)));
        *radius = 0.5 * (hi - lo);
        origin += 0.5 * (hi + lo) * axis;
    }
    if radii.iter().any(|r| !(*r > DEGENERATE)) {
        return None;
    }
    Some(FittedEllipsoid { origin, radii, axes })
}

/// Least-squares plane through the centroid. The normal is the direction of
/// least spread. Returns `None` for fewer than three points or a collinear
/// point set.
pub fn fit_plane(points: &[DVec3]) -> Option<FittedPlane> {
    if points.len() < 3 {
        return None;
    }
    let origin = centroid(points);
    let [_, (middle, _), (_, normal)] = principal_axes(points, origin);
    if !(middle > DEGENERATE) {
        return None;
    }
    Some(FittedPlane { origin, normal })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere_points(center: DVec3, r: f64) -> Vec<DVec3> {
        let mut pts = Vec::new();
        for i in 0..8 {
            for j in 1..8 {
                let theta = i as f64 * std::f64::consts::TAU / 8.0;
                let phi = j as f64 * std::f64::consts::PI / 8.0;
                pts.push(
                    center
                        + r * DVec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos()),
                );
            }
        }
        pts
    }

    #[test]
    fn test_fit_sphere_recovers_center_and_radius() {
        let center = DVec3::new(0.5, -1.0, 2.0);
        let fit = fit_sphere(&sphere_points(center, 0.75)).unwrap();
        assert!((fit.origin - center).length() < 1e-6);
        assert!((fit.radius - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_fit_sphere_rejects_too_few_points() {
        assert!(fit_sphere(&[DVec3::ZERO, DVec3::X, DVec3::Y]).is_none());
    }

    #[test]
    fn test_fit_sphere_rejects_coplanar_points() {
        let pts: Vec<DVec3> = (0..10)
            .map(|i| DVec3::new(i as f64, (i * i) as f64, 0.0))
            .collect();
        assert!(fit_sphere(&pts).is_none());
    }

    #[test]
    fn test_mesh_scale_factors_apply_to_vertices() {
        let shape = Shape::Mesh {
            file: "bone.obj".into(),
            scale_factors: [2.0, 1.0, 1.0],
            vertices: vec![[1.0, 1.0, 1.0]],
        };
        assert_eq!(shape.scaled_vertices().unwrap(), vec![DVec3::new(2.0, 1.0, 1.0)]);
        assert_eq!(shape.characteristic_size(), 0.0);
    }

    #[test]
    fn test_shape_serde_tag() {
        let json = serde_json::to_string(&Shape::Sphere { radius: 0.1 }).unwrap();
        assert!(json.contains(r#""shape":"sphere""#));
    }

    #[test]
    fn test_fit_ellipsoid_recovers_axes_and_radii() {
        let origin = DVec3::new(1.0, 1.0, 1.0);
        let pts: Vec<DVec3> = [
            DVec3::new(2.0, 0.0, 0.0),
            DVec3::new(-2.0, 0.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::new(0.0, -1.0, 0.0),
            DVec3::new(0.0, 0.0, 0.5),
            DVec3::new(0.0, 0.0, -0.5),
        ]
        .iter()
        .map(|p| origin + *p)
        .collect();

        let fit = fit_ellipsoid(&pts).unwrap();
        assert!((fit.origin - origin).length() < 1e-9);
        for (r, want) in fit.radii.iter().zip([2.0, 1.0, 0.5]) {
            assert!((r - want).abs() < 1e-9);
        }
        assert!(fit.axes[0].dot(DVec3::X).abs() > 1.0 - 1e-9);
        assert!(fit.axes[2].dot(DVec3::Z).abs() > 1.0 - 1e-9);
        assert!((fit.axes[0].cross(fit.axes[1]) - fit.axes[2]).length() < 1e-9);
    }

    #[test]
    fn test_fit_ellipsoid_rejects_flat_points() {
        let pts: Vec<DVec3> = (0..9)
            .map(|i| DVec3::new((i % 3) as f64, (i / 3) as f64, 0.0))
            .collect();
        assert!(fit_ellipsoid(&pts).is_none());
    }

    #[test]
    fn test_fit_plane_through_tilted_grid() {
        let normal = DVec3::new(0.0, 1.0, 1.0).normalize();
        let (u, v) = (DVec3::X, DVec3::new(0.0, 1.0, -1.0).normalize());
        let origin = DVec3::new(0.0, 2.0, 0.0);
        let pts: Vec<DVec3> = (0..16)
            .map(|i| origin + ((i % 4) as f64 - 1.5) * u + ((i / 4) as f64 - 1.5) * 0.5 * v)
            .collect();

        let fit = fit_plane(&pts).unwrap();
        assert!((fit.origin - origin).length() < 1e-9);
        assert!(fit.normal.dot(normal).abs() > 1.0 - 1e-9);
    }

    #[test]
    fn test_fit_plane_rejects_collinear_points() {
        let pts: Vec<DVec3> = (0..5).map(|i| DVec3::new(i as f64, 0.0, 0.0)).collect();
        assert!(fit_plane(&pts).is_none());
    }
}
