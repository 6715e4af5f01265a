//! Dissolve transition: a randomized tile wipe that covers the viewport,
//! masking the discontinuity of a field reset. Independent of the 3D pipes;
//! works for any "wipe to black, do something, clear" transition.
//!
//! Frame driven: `start` shuffles a grid of ~20px tiles, each `advance`
//! paints a batch of them opaque onto the overlay, and the overlay is
//! composited over the scene by the frame loop.

use crate::display::PixelBuffer;
use crate::util::Rng;

/// Tile edge length in device pixels
const TILE_SIZE: u32 = 20;
/// The duration is converted to frames assuming the vsync rate
const ASSUMED_FPS: f32 = 60.0;

pub struct DissolveTransition {
    /// Tile grid coordinates in shuffled visitation order
    tiles: Vec<(u32, u32)>,
    /// Next tile to reveal; None while inactive
    cursor: Option<usize>,
    tiles_per_row: u32,
    tiles_per_col: u32,
    total_frames: u32,
    width: u32,
    height: u32,
    rng: Rng,
}

impl DissolveTransition {
    pub fn new(width: u32, height: u32, rng: Rng) -> Self {
        Self {
            tiles: Vec::new(),
            cursor: None,
            tiles_per_row: 0,
            tiles_per_col: 0,
            total_frames: 0,
            width,
            height,
            rng,
        }
    }

    pub fn is_active(&self) -> bool {
        self.cursor.is_some()
    }

    /// Tiles painted so far
    pub fn revealed(&self) -> usize {
        self.cursor.unwrap_or(0)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Begin (or restart) a wipe across `seconds`. Rebuilds the tile grid
    /// from the current viewport and reshuffles the visitation order.
    pub fn start(&mut self, seconds: f32) {
        self.tiles_per_row = self.width.div_ceil(TILE_SIZE);
        self.tiles_per_col = self.height.div_ceil(TILE_SIZE);
        let count = self.tiles_per_row * self.tiles_per_col;
        self.tiles = (0..count)
            .map(|i| (i % self.tiles_per_row, i / self.tiles_per_row))
            .collect();
        self.rng.shuffle(&mut self.tiles);
        self.cursor = Some(0);
        self.total_frames = ((seconds * ASSUMED_FPS) as u32).max(1);
    }

    /// Advance one frame while active: paint this frame's batch of tiles
    /// onto the overlay. Returns true exactly once, on the frame the last
    /// tile lands; the overlay is cleared back to transparent at that point.
    /// No-op (false) while inactive.
    pub fn advance(&mut self, overlay: &mut PixelBuffer) -> bool {
        let Some(mut cursor) = self.cursor else {
            return false;
        };

        // floor(count / frames) tiles per frame, as a whole-frame batch.
        // Clamped to at least one tile so a duration longer than the tile
        // count finishes early instead of never.
        let per_frame = (self.tiles.len() / self.total_frames as usize).max(1);
        let end = (cursor + per_frame).min(self.tiles.len());
        for i in cursor..end {
            let (tx, ty) = self.tiles[i];
            self.paint_tile(overlay, tx, ty);
        }
        cursor = end;

        if cursor == self.tiles.len() {
            overlay.clear_rgba(0, 0, 0, 0);
            self.cursor = None;
            return true;
        }
        self.cursor = Some(cursor);
        false
    }

    /// Note a viewport size change. The tile grid dimensions stay fixed for
    /// a wipe already in flight; call `repaint` to restore revealed tiles
    /// onto a freshly sized overlay.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Repaint every already-revealed tile (after the overlay was recreated)
    pub fn repaint(&mut self, overlay: &mut PixelBuffer) {
        let Some(cursor) = self.cursor else {
            return;
        };
        for i in 0..cursor {
            let (tx, ty) = self.tiles[i];
            self.paint_tile(overlay, tx, ty);
        }
    }

    fn paint_tile(&self, overlay: &mut PixelBuffer, tx: u32, ty: u32) {
        // Tiles stretch to cover the viewport exactly; floor/ceil so edges
        // overlap rather than leak.
        let tile_w = overlay.width() as f32 / self.tiles_per_row as f32;
        let tile_h = overlay.height() as f32 / self.tiles_per_col as f32;
        overlay.fill_rect(
            (tx as f32 * tile_w).floor() as i32,
            (ty as f32 * tile_h).floor() as i32,
            tile_w.ceil() as u32,
            tile_h.ceil() as u32,
            0,
            0,
            0,
        );
    }
}
