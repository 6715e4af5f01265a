//! Software 3D renderer for the pipe field
//!
//! Cylinder cross-sections tessellated into strips with cosine-falloff
//! lighting, matching what gluCylinder does in OpenGL. Gradient-shaded
//! sphere joints at bends. The whole scene slowly tumbles around the
//! origin; a reset snaps the view back to the default look-at.

use std::collections::HashMap;
use std::f32::consts::PI;

use crate::display::PixelBuffer;
use crate::math3d::Vec3;
use crate::pipes::{GridCoord, GroupId, JointKind, PipeRenderer, PipeStyle};
use crate::util::hsv_to_rgb;

/// World-space distance between adjacent grid cells
const GRID_STEP: f32 = 50.0;
/// Pipe radius, 0.2 of a grid cell like the classic screensaver
const PIPE_RADIUS: f32 = GRID_STEP * 0.2;
const BALL_JOINT_RADIUS: f32 = PIPE_RADIUS * 1.5;
/// Number of strips around the cylinder circumference (front-facing half)
const CYLINDER_STRIPS: usize = 8;

#[derive(Clone)]
struct Segment {
    a: Vec3,
    b: Vec3,
    /// Position along the pipe, drives striped texture styles
    index: usize,
}

#[derive(Clone)]
struct Joint {
    kind: JointKind,
    at: Vec3,
}

/// Mesh group for one pipe: everything attached between spawn and reset
struct Group {
    segments: Vec<Segment>,
    joints: Vec<Joint>,
    hue: f32,
    candy_cane: bool,
}

pub struct SceneRenderer {
    groups: HashMap<GroupId, Group>,
    next_group: u32,
    rotation: Vec3,
}

fn to_world(c: GridCoord) -> Vec3 {
    Vec3::new(
        c.x as f32 * GRID_STEP,
        c.y as f32 * GRID_STEP,
        c.z as f32 * GRID_STEP,
    )
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self {
            groups: HashMap::new(),
            next_group: 0,
            rotation: Vec3::zero(),
        }
    }

    /// Slow orbit so the structure reads as 3D even between bends
    pub fn update(&mut self, dt: f32) {
        self.rotation.x += dt * 0.08;
        self.rotation.y += dt * 0.12;
    }

    pub fn render(&self, buffer: &mut PixelBuffer) {
        let w = buffer.width() as f32;
        let h = buffer.height() as f32;
        let cx = w / 2.0;
        let cy = h / 2.0;
        let scale = h.min(w) / 480.0;
        let fov = 500.0 * scale;
        let camera_offset = Vec3::new(0.0, 0.0, 1400.0);
        let light_dir = Vec3::new(0.4, -0.6, -0.7).normalize();

        buffer.clear(5, 5, 12);

        // Project everything and collect for depth sorting
        let mut items: Vec<DrawItem> = Vec::new();
        let rotation = &self.rotation;

        for group in self.groups.values() {
            for seg in &group.segments {
                let a = seg.a.rotate_x(rotation.x).rotate_y(rotation.y) + camera_offset;
                let b = seg.b.rotate_x(rotation.x).rotate_y(rotation.y) + camera_offset;

                if a.z <= 1.0 || b.z <= 1.0 {
                    continue;
                }

                let sa = (cx + a.x * fov / a.z, cy + a.y * fov / a.z);
                let sb = (cx + b.x * fov / b.z, cy + b.y * fov / b.z);

                let dx = sb.0 - sa.0;
                let dy = sb.1 - sa.1;
                let len = (dx * dx + dy * dy).sqrt().max(0.001);
                let nx = -dy / len;
                let ny = dx / len;

                let seg_dir = (b - a).normalize();
                let base_light = 0.2 + 0.6 * seg_dir.dot(&light_dir).abs();

                items.push(DrawItem::Segment(ProjSeg {
                    sa,
                    sb,
                    nx,
                    ny,
                    wa: PIPE_RADIUS * fov / a.z,
                    wb: PIPE_RADIUS * fov / b.z,
                    base_light,
                    color_of: ColorRef {
                        hue: group.hue,
                        candy_cane: group.candy_cane,
                        index: seg.index,
                    },
                    z: (a.z + b.z) * 0.5,
                }));
            }

            for joint in &group.joints {
                let p = joint.at.rotate_x(rotation.x).rotate_y(rotation.y) + camera_offset;
                if p.z <= 1.0 {
                    continue;
                }
                let world_radius = match joint.kind {
                    JointKind::Elbow => PIPE_RADIUS,
                    JointKind::Ball | JointKind::Teapot => BALL_JOINT_RADIUS,
                };
                items.push(DrawItem::Joint(ProjJoint {
                    sx: cx + p.x * fov / p.z,
                    sy: cy + p.y * fov / p.z,
                    radius: world_radius * fov / p.z,
                    kind: joint.kind,
                    color_of: ColorRef {
                        hue: group.hue,
                        candy_cane: group.candy_cane,
                        index: 0,
                    },
                    z: p.z,
                }));
            }
        }

        // Sort back-to-front
        items.sort_by(|a, b| {
            b.z()
                .partial_cmp(&a.z())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for item in &items {
            match item {
                DrawItem::Segment(ps) => self.draw_segment(buffer, ps),
                DrawItem::Joint(pj) => self.draw_joint(buffer, pj),
            }
        }
    }

    /// Render one segment as tessellated cylinder strips.
    /// Each strip's brightness follows cosine falloff from the surface normal.
    fn draw_segment(&self, buffer: &mut PixelBuffer, ps: &ProjSeg) {
        for i in 0..CYLINDER_STRIPS {
            let theta0 = PI * (i as f32 / CYLINDER_STRIPS as f32);
            let theta1 = PI * ((i + 1) as f32 / CYLINDER_STRIPS as f32);

            // Position along perpendicular: cos(theta) maps [-1, 1]
            let offset0 = theta0.cos();
            let offset1 = theta1.cos();

            // Surface normal for this strip (how much it faces the viewer)
            let mid_theta = (theta0 + theta1) * 0.5;
            let facing = mid_theta.sin(); // 1.0 at center, 0.0 at edges

            // Diffuse + ambient lighting
            let strip_bright = (ps.base_light * (0.3 + 0.7 * facing)).min(1.0);
            // Desaturate toward edges for a more plastic/metallic look
            let strip_sat = 0.55 + 0.15 * facing;

            let (r, g, b) = ps.color_of.resolve(strip_sat, strip_bright);

            // Quad vertices: two points on this edge at endpoint A, two at B
            let verts = [
                (
                    ps.sa.0 + ps.nx * ps.wa * offset0,
                    ps.sa.1 + ps.ny * ps.wa * offset0,
                ),
                (
                    ps.sb.0 + ps.nx * ps.wb * offset0,
                    ps.sb.1 + ps.ny * ps.wb * offset0,
                ),
                (
                    ps.sb.0 + ps.nx * ps.wb * offset1,
                    ps.sb.1 + ps.ny * ps.wb * offset1,
                ),
                (
                    ps.sa.0 + ps.nx * ps.wa * offset1,
                    ps.sa.1 + ps.ny * ps.wa * offset1,
                ),
            ];
            buffer.fill_polygon(&verts, r, g, b);
        }
    }

    fn draw_joint(&self, buffer: &mut PixelBuffer, pj: &ProjJoint) {
        let (r, g, b) = pj.color_of.resolve(0.5, 0.9);
        buffer.fill_circle_gradient(
            pj.sx as i32,
            pj.sy as i32,
            pj.radius as i32,
            r,
            g,
            b,
            1.8,
        );
        if pj.kind == JointKind::Teapot {
            // A real teapot mesh is beyond a scanline rasterizer; a lid knob
            // and a stubby spout sell the silhouette.
            let knob_r = (pj.radius * 0.35) as i32;
            buffer.fill_circle_gradient(
                pj.sx as i32,
                (pj.sy - pj.radius * 0.95) as i32,
                knob_r,
                r,
                g,
                b,
                1.4,
            );
            buffer.fill_circle_gradient(
                (pj.sx + pj.radius * 0.95) as i32,
                pj.sy as i32,
                knob_r,
                r,
                g,
                b,
                1.4,
            );
        }
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PipeRenderer for SceneRenderer {
    fn attach(&mut self, style: &PipeStyle) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        let candy_cane = style
            .texture_path
            .as_deref()
            .is_some_and(|p| p.contains("candycane"));
        self.groups.insert(
            id,
            Group {
                segments: Vec::new(),
                joints: Vec::new(),
                hue: style.hue,
                candy_cane,
            },
        );
        id
    }

    fn pipe_line(&mut self, group: GroupId, from: GridCoord, to: GridCoord) {
        if let Some(g) = self.groups.get_mut(&group) {
            let index = g.segments.len();
            g.segments.push(Segment {
                a: to_world(from),
                b: to_world(to),
                index,
            });
        }
    }

    fn pipe_joint(&mut self, group: GroupId, kind: JointKind, at: GridCoord) {
        if let Some(g) = self.groups.get_mut(&group) {
            g.joints.push(Joint {
                kind,
                at: to_world(at),
            });
        }
    }

    fn detach(&mut self, group: GroupId) {
        self.groups.remove(&group);
    }

    fn reset_view(&mut self) {
        self.rotation = Vec3::zero();
    }
}

/// How a draw item resolves its final color at shade time
#[derive(Clone, Copy)]
struct ColorRef {
    hue: f32,
    candy_cane: bool,
    index: usize,
}

impl ColorRef {
    fn resolve(&self, sat: f32, bright: f32) -> (u8, u8, u8) {
        if self.candy_cane {
            if self.index % 2 == 0 {
                hsv_to_rgb(0.0, (sat + 0.3).min(0.85), bright)
            } else {
                hsv_to_rgb(0.0, 0.05, bright)
            }
        } else {
            hsv_to_rgb(self.hue, sat, bright)
        }
    }
}

/// Projected segment data ready for rendering
struct ProjSeg {
    /// Screen positions at each endpoint
    sa: (f32, f32),
    sb: (f32, f32),
    /// Screen-space perpendicular direction
    nx: f32,
    ny: f32,
    /// Projected radii at each endpoint
    wa: f32,
    wb: f32,
    /// Base lighting intensity for this segment
    base_light: f32,
    color_of: ColorRef,
    z: f32,
}

struct ProjJoint {
    sx: f32,
    sy: f32,
    radius: f32,
    kind: JointKind,
    color_of: ColorRef,
    z: f32,
}

enum DrawItem {
    Segment(ProjSeg),
    Joint(ProjJoint),
}

impl DrawItem {
    fn z(&self) -> f32 {
        match self {
            DrawItem::Segment(s) => s.z,
            DrawItem::Joint(j) => j.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_detach_lifecycle() {
        let mut renderer = SceneRenderer::new();
        let style = PipeStyle {
            ball_joint_chance: 1.0,
            teapot_chance: 0.0,
            texture_path: None,
            hue: 200.0,
        };
        let a = renderer.attach(&style);
        let b = renderer.attach(&style);
        assert_ne!(a, b);

        renderer.pipe_line(a, GridCoord::new(0, 0, 0), GridCoord::new(1, 0, 0));
        renderer.pipe_joint(a, JointKind::Ball, GridCoord::new(0, 0, 0));
        assert_eq!(renderer.groups[&a].segments.len(), 1);
        assert_eq!(renderer.groups[&a].joints.len(), 1);

        renderer.detach(a);
        assert!(!renderer.groups.contains_key(&a));
        // Calls against a detached group are silently dropped
        renderer.pipe_line(a, GridCoord::new(0, 0, 0), GridCoord::new(1, 0, 0));
        assert!(renderer.groups.contains_key(&b));
    }

    #[test]
    fn test_render_draws_something() {
        let mut renderer = SceneRenderer::new();
        let style = PipeStyle {
            ball_joint_chance: 1.0,
            teapot_chance: 0.0,
            texture_path: None,
            hue: 0.0,
        };
        let g = renderer.attach(&style);
        renderer.pipe_joint(g, JointKind::Ball, GridCoord::new(0, 0, 0));
        renderer.pipe_line(g, GridCoord::new(0, 0, 0), GridCoord::new(1, 0, 0));

        let mut buffer = PixelBuffer::with_size(320, 240);
        renderer.render(&mut buffer);

        // Background plus some lit pipe pixels near the center
        let lit = (0..240)
            .flat_map(|y| (0..320).map(move |x| (x, y)))
            .filter(|&(x, y)| buffer.get_pixel(x, y) != Some((5, 5, 12)))
            .count();
        assert!(lit > 0, "nothing rendered");
    }

    #[test]
    fn test_reset_view_restores_default() {
        let mut renderer = SceneRenderer::new();
        renderer.update(1.0);
        assert!(renderer.rotation.x != 0.0);
        renderer.reset_view();
        assert_eq!(renderer.rotation, Vec3::zero());
    }
}
