/// Similarity layout: ranked embeddings → 3D targets.
///
/// Converts a query embedding and the room's node set into per-node targets
/// for position, scale, opacity and colour.
///
/// Architecture:
///   - `LayoutConfig`: every tunable constant (band size, spiral, shells)
///   - `plan_layout` : rank, partition, place
///   - `NodeTarget`  : one planned node, in rank order
///
/// Placement:
///   - Near band (top K)  → 3D spiral: angle and radius grow with rank,
///                          height offset around the band midpoint
///   - Far band (rest)    → spherical shells, golden-angle spacing,
///                          radius grows with (1 − similarity)²
///
/// Far shells always start past the outermost spiral slot, so no far node
/// can sit inside the near band.
use serde::Deserialize;

use crate::error::Result;
use crate::fast_math::{clamp01, Vec3, GOLDEN_ANGLE};
use crate::render::color::Rgba;
use crate::similarity::rank;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LayoutConfig
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Configuration for similarity layout
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Number of top-ranked nodes placed on the spiral
    pub near_band: usize,
    /// Spiral angle increment per rank (radians)
    pub spiral_angle_step: f32,
    /// Spiral radius at rank 0
    pub spiral_base_radius: f32,
    /// Spiral radius increment per rank
    pub spiral_radius_step: f32,
    /// Vertical offset per rank away from the band midpoint
    pub spiral_height_step: f32,
    /// Clearance between the outermost spiral slot and the innermost shell
    pub shell_gap: f32,
    /// Shell radius added per unit of (1 − similarity)²
    pub shell_spread: f32,
    pub scale_base: f32,
    /// Scale added at similarity 1 (weighted by similarity²)
    pub scale_range: f32,
    pub opacity_base: f32,
    /// Opacity added at similarity 1 (weighted linearly)
    pub opacity_range: f32,
    /// Label opacity as a fraction of body opacity
    pub label_opacity_ratio: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            near_band: 20,
            spiral_angle_step: 0.5,
            spiral_base_radius: 3.0,
            spiral_radius_step: 1.2,
            spiral_height_step: 0.3,
            shell_gap: 4.0,
            shell_spread: 30.0,
            scale_base: 1.2,
            scale_range: 1.3,
            opacity_base: 0.1,
            opacity_range: 0.9,
            label_opacity_ratio: 0.9,
        }
    }
}

impl LayoutConfig {
    /// Spiral slot for `rank` (0-based, must be < `near_band`).
    pub fn spiral_position(&self, rank: usize) -> Vec3 {
        let r = rank as f32;
        let angle = r * self.spiral_angle_step;
        let radius = self.spiral_radius(rank);
        let midpoint = self.near_band as f32 * 0.5;
        [
            radius * angle.cos(),
            (r - midpoint) * self.spiral_height_step,
            radius * angle.sin(),
        ]
    }

    /// Horizontal spiral radius for `rank`.
    #[inline]
    pub fn spiral_radius(&self, rank: usize) -> f32 {
        self.spiral_base_radius + rank as f32 * self.spiral_radius_step
    }

    /// Largest distance from the origin of the first `occupied` spiral slots
    /// (never more than `near_band`).
    pub fn near_extent(&self, occupied: usize) -> f32 {
        (0..self.near_band.min(occupied))
            .map(|rank| {
                let [x, y, z] = self.spiral_position(rank);
                (x * x + y * y + z * z).sqrt()
            })
            .fold(0.0_f32, f32::max)
    }

    /// Shell radius for a far-band node of the given similarity.
    #[inline]
    pub fn shell_radius(&self, similarity: f32, near_extent: f32) -> f32 {
        let d = 1.0 - similarity;
        near_extent + self.shell_gap + d * d * self.shell_spread
    }

    #[inline]
    pub fn target_scale(&self, similarity: f32) -> f32 {
        let s = clamp01(similarity);
        self.scale_base + s * s * self.scale_range
    }

    #[inline]
    pub fn target_opacity(&self, similarity: f32) -> f32 {
        clamp01(self.opacity_base + clamp01(similarity) * self.opacity_range)
    }

    /// Colour applied immediately at planning time (not animated).
    pub fn target_color(&self, similarity: f32) -> Rgba {
        let s = clamp01(similarity);
        Rgba::from_hsl(s, 0.7 + s * 0.3, 0.4 + s * 0.2)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Plan output
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which placement policy a node received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Near,
    Far,
}

/// Planned targets for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTarget {
    /// Index into the embedding slice passed to [`plan_layout`]
    pub index: usize,
    /// 0 = most similar
    pub rank: usize,
    pub band: Band,
    pub similarity: f32,
    pub position: Vec3,
    pub scale: f32,
    pub opacity: f32,
    pub label_opacity: f32,
    pub color: Rgba,
}

/// A full plan, in rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub targets: Vec<NodeTarget>,
}

impl LayoutPlan {
    /// The `n` most similar targets.
    pub fn top(&self, n: usize) -> &[NodeTarget] {
        &self.targets[..n.min(self.targets.len())]
    }

    pub fn average_similarity(&self) -> f32 {
        if self.targets.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.targets.iter().map(|t| t.similarity).sum();
        sum / self.targets.len() as f32
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Public API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Rank `embeddings` against `query` and place each one.
///
/// Pure: the same inputs always give the same plan. Fails before any
/// placement if the query is empty, zero-norm, or of the wrong dimension.
pub fn plan_layout<E>(query: &[f32], embeddings: &[E], config: &LayoutConfig) -> Result<LayoutPlan>
where
    E: AsRef<[f32]> + Sync,
{
    let ranked = rank(query, embeddings)?;
    let total = ranked.len();
    let near = config.near_band.min(total);
    let far_count = total - near;
    let near_extent = config.near_extent(near);

    let targets = ranked
        .iter()
        .enumerate()
        .map(|(rank, scored)| {
            let similarity = scored.similarity;
            let (band, position) = if rank < near {
                (Band::Near, config.spiral_position(rank))
            } else {
                // far_count >= 1 whenever this branch runs
                let j = rank - near;
                (
                    Band::Far,
                    shell_position(config.shell_radius(similarity, near_extent), j, far_count),
                )
            };
            let opacity = config.target_opacity(similarity);
            NodeTarget {
                index: scored.index,
                rank,
                band,
                similarity,
                position,
                scale: config.target_scale(similarity),
                opacity,
                label_opacity: opacity * config.label_opacity_ratio,
                color: config.target_color(similarity),
            }
        })
        .collect();

    Ok(LayoutPlan { targets })
}

/// Golden-angle point `j` of `count` on a sphere of `radius`.
fn shell_position(radius: f32, j: usize, count: usize) -> Vec3 {
    let cos_phi = (1.0 - 2.0 * (j as f32 + 1.0) / count as f32).clamp(-1.0, 1.0);
    let phi = cos_phi.acos();
    let theta = j as f32 * GOLDEN_ANGLE;
    let sin_phi = phi.sin();
    [
        radius * sin_phi * theta.cos(),
        radius * sin_phi * theta.sin(),
        radius * cos_phi,
    ]
}
