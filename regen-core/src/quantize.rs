use glam::DVec3;

use crate::{Face, Mesh, Position, RegenError, RegenResult};

/// Largest supported grid resolution. Keeps every coordinate, and the
/// integer geometry the engine derives from it, far from overflow.
pub const MAX_POS_TOKENS: u32 = 1 << 20;

/// Centres the vertices on their bounding-box midpoint and scales them
/// uniformly so the largest axis extent becomes `2 * bound`.
pub fn normalize(vertices: &[[f64; 3]], bound: f64) -> RegenResult<Vec<[f64; 3]>> {
    if vertices.is_empty() {
        return Err(RegenError::DegenerateBounds);
    }

    let mut min_p = DVec3::splat(f64::MAX);
    let mut max_p = DVec3::splat(f64::MIN);
    for v in vertices {
        let p = DVec3::from_array(*v);
        min_p = min_p.min(p);
        max_p = max_p.max(p);
    }

    let center = (min_p + max_p) / 2.0;
    let max_dim = (max_p - min_p).max_element();
    if !max_dim.is_finite() || max_dim <= 0.0 {
        return Err(RegenError::DegenerateBounds);
    }
    let scale = 2.0 * bound / max_dim;

    Ok(vertices
        .iter()
        .map(|v| ((DVec3::from_array(*v) - center) * scale).to_array())
        .collect())
}

/// Maps normalized points in `[-1, 1]` onto the integer grid
/// `[0, num_pos_tokens - 1]`. Error bound is `1 / (2 * num_pos_tokens)`.
pub fn quantize(normalized: &[[f64; 3]], num_pos_tokens: u32) -> RegenResult<Vec<Position>> {
    if num_pos_tokens == 0 {
        return Err(RegenError::InvalidConfig(
            "num_pos_tokens must be at least 1".into(),
        ));
    }
    if num_pos_tokens > MAX_POS_TOKENS {
        return Err(RegenError::InvalidConfig(format!(
            "num_pos_tokens {} exceeds the maximum of {}",
            num_pos_tokens, MAX_POS_TOKENS
        )));
    }
    let n = num_pos_tokens as f64;
    let max_bin = (num_pos_tokens - 1) as f64;

    Ok(normalized
        .iter()
        .map(|p| {
            let p = (DVec3::from_array(*p) + 1.0) / 2.0;
            let q = (p * n).floor();
            // NaN survives clamp and saturates to 0 in the cast
            [
                q.x.clamp(0.0, max_bin) as u32,
                q.y.clamp(0.0, max_bin) as u32,
                q.z.clamp(0.0, max_bin) as u32,
            ]
        })
        .collect())
}

/// Lossy inverse of [`quantize`], returning bin midpoints.
pub fn dequantize(quantized: &[Position], num_pos_tokens: u32) -> Vec<[f64; 3]> {
    let n = num_pos_tokens as f64;
    quantized
        .iter()
        .map(|q| {
            let p = DVec3::new(q[0] as f64, q[1] as f64, q[2] as f64);
            ((p + 0.5) / n * 2.0 - 1.0).to_array()
        })
        .collect()
}

/// Normalizes to the unit bound and quantizes in one step.
pub fn quantize_mesh(vertices: &[[f64; 3]], faces: &[Face], num_pos_tokens: u32) -> RegenResult<Mesh> {
    let normalized = normalize(vertices, 1.0)?;
    let quantized = quantize(&normalized, num_pos_tokens)?;
    let mesh = Mesh::new(quantized, faces.to_vec());
    mesh.validate()?;
    Ok(mesh)
}
