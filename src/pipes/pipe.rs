//! A single pipe: one growth automaton walking the grid one cell per tick.

use crate::util::Rng;

use super::grid::{Bounds, Direction, GridCoord, OccupancyGrid, PipeId};
use super::growth::{self, JointKind};
use super::{GroupId, PipeRenderer};

/// Immutable per-pipe styling, fixed at spawn for the pipe's lifetime
#[derive(Debug, Clone)]
pub struct PipeStyle {
    /// Probability a bend gets a ball joint (after the teapot draw misses)
    pub ball_joint_chance: f32,
    /// Probability a bend gets a teapot
    pub teapot_chance: f32,
    /// Texture to render with; None means a plain colored material
    pub texture_path: Option<String>,
    /// Base hue in degrees for untextured pipes
    pub hue: f32,
}

/// One growing pipe. Owns its key-point history; all mesh construction is
/// delegated to the renderer through the group handle acquired at spawn.
pub struct Pipe {
    current: GridCoord,
    key_points: Vec<GridCoord>,
    style: PipeStyle,
    group: GroupId,
}

impl Pipe {
    /// Spawn a pipe at a random unclaimed-or-not coordinate within bounds,
    /// claim that cell, and place the unconditional seed ball joint.
    pub fn spawn(
        id: PipeId,
        bounds: &Bounds,
        grid: &mut OccupancyGrid,
        style: PipeStyle,
        rng: &mut Rng,
        renderer: &mut dyn PipeRenderer,
    ) -> Self {
        let start = bounds.random_coord(rng);
        let group = renderer.attach(&style);
        grid.set(start, id);
        renderer.pipe_joint(group, JointKind::Ball, start);
        Self {
            current: start,
            key_points: vec![start],
            style,
            group,
        }
    }

    /// Head of growth
    pub fn current_position(&self) -> GridCoord {
        self.current
    }

    /// Every coordinate visited, in visitation order
    pub fn key_points(&self) -> &[GridCoord] {
        &self.key_points
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn style(&self) -> &PipeStyle {
        &self.style
    }

    /// Direction of the most recent step, derived from the last two key points
    pub fn last_direction(&self) -> Option<Direction> {
        if self.key_points.len() > 1 {
            let prev = self.key_points[self.key_points.len() - 2];
            Direction::between(prev, self.current)
        } else {
            None
        }
    }

    /// One growth attempt. Blocked steps (out of bounds or occupied cell)
    /// are silent no-ops; the pipe retries with a fresh direction next tick.
    ///
    /// A pipe boxed in on all six sides stalls indefinitely until the next
    /// field reset; there is no exhaustive search over the direction set.
    pub fn step(
        &mut self,
        id: PipeId,
        bounds: &Bounds,
        grid: &mut OccupancyGrid,
        rng: &mut Rng,
        renderer: &mut dyn PipeRenderer,
    ) {
        let last = self.last_direction();
        let dir = growth::choose_direction(rng, last);
        let candidate = self.current.step(dir);

        if !bounds.contains(candidate) {
            return;
        }
        if grid.get(candidate).is_some() {
            return;
        }
        grid.set(candidate, id);

        // Joint at the pre-move position on a direction change.
        // The seed joint at spawn is handled in spawn().
        if let Some(last) = last {
            if last != dir {
                let kind = growth::choose_joint(rng, &self.style);
                renderer.pipe_joint(self.group, kind, self.current);
            }
        }

        renderer.pipe_line(self.group, self.current, candidate);

        self.current = candidate;
        self.key_points.push(candidate);
    }
}
