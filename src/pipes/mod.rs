//! The pipe field: occupancy grid, growth automaton, lifecycle orchestrator.

pub mod field;
pub mod grid;
pub mod growth;
pub mod pipe;

pub use field::PipeField;
pub use grid::{Bounds, Direction, GridCoord, OccupancyGrid, PipeId};
pub use growth::JointKind;
pub use pipe::{Pipe, PipeStyle};

/// Handle to a pipe's visual group inside the renderer's scene.
/// Issued by `PipeRenderer::attach`, returned to `detach` on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u32);

/// Boundary to the rendering layer. Everything here is fire-and-forget:
/// the simulation never reads renderer state back, and renderer failures
/// (e.g. a missing texture) must not stall the tick.
pub trait PipeRenderer {
    /// Create a mesh group for a new pipe, parented to the scene
    fn attach(&mut self, style: &PipeStyle) -> GroupId;

    /// Materialize one straight segment between two grid points
    fn pipe_line(&mut self, group: GroupId, from: GridCoord, to: GridCoord);

    /// Materialize a joint mesh at a grid point
    fn pipe_joint(&mut self, group: GroupId, kind: JointKind, at: GridCoord);

    /// Remove a pipe's mesh group from the scene
    fn detach(&mut self, group: GroupId);

    /// Restore the default camera look-at
    fn reset_view(&mut self);
}
