use glam::{DMat4, DVec3, DVec4};

use regen_core::Position;

use crate::topology::Connectivity;

fn point(p: Position) -> DVec3 {
    DVec3::new(p[0] as f64, p[1] as f64, p[2] as f64)
}

fn plane_quadric(normal: DVec3, on_plane: DVec3) -> DMat4 {
    let plane = normal.extend(-normal.dot(on_plane));
    DMat4::from_cols(plane * plane.x, plane * plane.y, plane * plane.z, plane * plane.w)
}

/// Garland-Heckbert plane quadrics, one per vertex.
///
/// Border edges add a constraint plane through the edge, perpendicular to
/// its face, scaled by `boundary_weight`.
pub(crate) fn vertex_quadrics(conn: &Connectivity, boundary_weight: f64) -> Vec<DMat4> {
    let mut quadrics = vec![DMat4::ZERO; conn.positions.len()];

    for (fi, f) in conn.faces.iter().enumerate() {
        if !conn.face_alive[fi] {
            continue;
        }
        let p = [point(conn.position(f[0])), point(conn.position(f[1])), point(conn.position(f[2]))];
        let normal = (p[1] - p[0]).cross(p[2] - p[0]).normalize_or_zero();
        if normal == DVec3::ZERO {
            continue;
        }

        let q = plane_quadric(normal, p[0]);
        for &v in f {
            quadrics[v as usize] += q;
        }

        for i in 0..3 {
            let (a, b) = (f[i], f[(i + 1) % 3]);
            if conn.edge_faces(a, b).len() != 1 {
                continue;
            }
            let edge = p[(i + 1) % 3] - p[i];
            let border_normal = edge.cross(normal).normalize_or_zero();
            if border_normal == DVec3::ZERO {
                continue;
            }
            let bq = plane_quadric(border_normal, p[i]) * boundary_weight;
            quadrics[a as usize] += bq;
            quadrics[b as usize] += bq;
        }
    }
    quadrics
}

pub(crate) fn cost(quadric: &DMat4, p: Position) -> f64 {
    let v = DVec4::new(p[0] as f64, p[1] as f64, p[2] as f64, 1.0);
    v.dot(*quadric * v).max(0.0)
}
