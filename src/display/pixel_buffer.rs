use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

// ============================================================================
// Utility Functions
// ============================================================================

/// Alpha blend a single color channel
/// Uses fast approximation: (x + 1 + (x >> 8)) >> 8 instead of x / 255
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

/// Write ABGR pixel to slice (RGBA8888 little-endian byte order)
#[inline]
fn write_pixel(dest: &mut [u8], r: u8, g: u8, b: u8) {
    dest[0] = 255; // A
    dest[1] = b; // B
    dest[2] = g; // G
    dest[3] = r; // R
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// RGBA8888 pixel buffer for software rendering
/// The 3D scene and the dissolve overlay both draw into one of these
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Create a new pixel buffer with the default resolution (1024x768)
    pub fn new() -> Self {
        Self::with_size(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }

    /// Create a new pixel buffer with custom resolution
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; (width * height * 4) as usize],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * 4) as usize
    }

    /// Clear to a solid opaque color
    /// Optimized: uses u32 fill for maximum speed
    pub fn clear(&mut self, r: u8, g: u8, b: u8) {
        self.clear_rgba(r, g, b, 255);
    }

    /// Clear to a solid color with custom alpha (for overlay buffers)
    pub fn clear_rgba(&mut self, r: u8, g: u8, b: u8, a: u8) {
        let pixel = u32::from_ne_bytes([a, b, g, r]);
        let ptr = self.pixels.as_mut_ptr() as *mut u32;
        let len = self.pixels.len() / 4;
        for i in 0..len {
            // Safety: pixels.len() is always divisible by 4 (width * height
            // * 4), and i < len keeps the write in bounds. write_unaligned
            // avoids assuming alignment of Vec<u8>.
            unsafe {
                ptr.add(i).write_unaligned(pixel);
            }
        }
    }

    /// Set a single pixel (bounds checked)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            write_pixel(&mut self.pixels[idx..idx + 4], r, g, b);
        }
    }

    /// Read a pixel from the buffer (bounds checked)
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((
                self.pixels[idx + 3], // R
                self.pixels[idx + 2], // G
                self.pixels[idx + 1], // B
            ))
        } else {
            None
        }
    }

    /// Read all 4 channels of a pixel (bounds checked)
    /// Returns (r, g, b, a) or None if out of bounds
    #[inline]
    pub fn get_pixel_rgba(&self, x: i32, y: i32) -> Option<(u8, u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((
                self.pixels[idx + 3], // R
                self.pixels[idx + 2], // G
                self.pixels[idx + 1], // B
                self.pixels[idx],     // A
            ))
        } else {
            None
        }
    }

    /// Additive blend a pixel (colors saturate at 255)
    /// Used for the soft-shaded joint spheres
    #[inline]
    pub fn blend_pixel_additive(&mut self, x: i32, y: i32, r: u8, g: u8, b: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            self.pixels[idx + 1] = self.pixels[idx + 1].saturating_add(b);
            self.pixels[idx + 2] = self.pixels[idx + 2].saturating_add(g);
            self.pixels[idx + 3] = self.pixels[idx + 3].saturating_add(r);
        }
    }

    /// Draw a horizontal line (clipped)
    pub fn hline(&mut self, x1: i32, x2: i32, y: i32, r: u8, g: u8, b: u8) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };
        let start = x1.max(0);
        let end = x2.min(self.width as i32 - 1);
        if start > end {
            return;
        }

        // Compute starting index once, then increment by 4 per pixel
        let mut idx = self.pixel_index(start as u32, y as u32);
        let count = (end - start + 1) as usize;
        for _ in 0..count {
            write_pixel(&mut self.pixels[idx..idx + 4], r, g, b);
            idx += 4;
        }
    }

    /// Fill a rectangle (clipped)
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, r: u8, g: u8, b: u8) {
        for row in 0..h as i32 {
            self.hline(x, x + w as i32 - 1, y + row, r, g, b);
        }
    }

    /// Fill a circle with radial brightness falloff (soft sphere shading)
    pub fn fill_circle_gradient(
        &mut self,
        cx: i32,
        cy: i32,
        radius: i32,
        r: u8,
        g: u8,
        b: u8,
        falloff: f32,
    ) {
        if radius <= 0 {
            return;
        }
        let r_sq = (radius * radius) as f32;
        let r_f = radius as f32;

        let y_start = (cy - radius).max(0);
        let y_end = (cy + radius).min(self.height as i32 - 1);
        let x_start = (cx - radius).max(0);
        let x_end = (cx + radius).min(self.width as i32 - 1);

        for y in y_start..=y_end {
            let dy = (y - cy) as f32;
            let dy_sq = dy * dy;
            for x in x_start..=x_end {
                let dx = (x - cx) as f32;
                let dist_sq = dx * dx + dy_sq;
                if dist_sq > r_sq {
                    continue;
                }

                let dist = dist_sq.sqrt();
                let t = (1.0 - dist / r_f).powf(falloff);
                self.blend_pixel_additive(
                    x,
                    y,
                    (r as f32 * t) as u8,
                    (g as f32 * t) as u8,
                    (b as f32 * t) as u8,
                );
            }
        }
    }

    /// Fill a polygon using scanline algorithm
    /// Optimized: preallocates intersection buffer outside loop
    pub fn fill_polygon(&mut self, vertices: &[(f32, f32)], r: u8, g: u8, b: u8) {
        if vertices.len() < 3 {
            return;
        }

        // Find bounding box
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for (_, y) in vertices {
            min_y = min_y.min(*y);
            max_y = max_y.max(*y);
        }

        let min_y = (min_y as i32).max(0);
        let max_y = (max_y as i32).min(self.height as i32 - 1);

        // Preallocate intersection buffer (reused per scanline)
        let mut intersections = Vec::with_capacity(vertices.len());
        let n = vertices.len();

        // Scanline fill
        for y in min_y..=max_y {
            intersections.clear(); // Reuse allocation
            let yf = y as f32 + 0.5;

            // Find all edge intersections with this scanline
            for i in 0..n {
                let (x1, y1) = vertices[i];
                let (x2, y2) = vertices[(i + 1) % n];

                // Check if edge crosses this scanline
                if (y1 <= yf && y2 > yf) || (y2 <= yf && y1 > yf) {
                    // Calculate x intersection
                    let x = x1 + (yf - y1) / (y2 - y1) * (x2 - x1);
                    intersections.push(x as i32);
                }
            }

            // Sort intersections and fill between pairs
            intersections.sort_unstable();
            for pair in intersections.chunks_exact(2) {
                self.hline(pair[0], pair[1], y, r, g, b);
            }
        }
    }

    /// Composite another same-sized buffer over this one with source-over
    /// alpha blending. Used to lay the dissolve overlay onto the scene.
    pub fn composite_over(&mut self, src: &PixelBuffer) {
        debug_assert_eq!(self.pixels.len(), src.pixels.len());
        let len = self.pixels.len().min(src.pixels.len());

        for i in (0..len).step_by(4) {
            let sa = src.pixels[i]; // alpha channel (ABGR[0])
            if sa == 0 {
                continue;
            }
            let sr = src.pixels[i + 3];
            let sg = src.pixels[i + 2];
            let sb = src.pixels[i + 1];

            if sa == 255 {
                // Fully opaque, direct copy
                write_pixel(&mut self.pixels[i..i + 4], sr, sg, sb);
            } else {
                let alpha = sa as u16;
                self.pixels[i] = 255;
                self.pixels[i + 1] = blend_channel(sb, self.pixels[i + 1], alpha);
                self.pixels[i + 2] = blend_channel(sg, self.pixels[i + 2], alpha);
                self.pixels[i + 3] = blend_channel(sr, self.pixels[i + 3], alpha);
            }
        }
    }

    /// Raw bytes for SDL texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_and_read_back() {
        let mut buf = PixelBuffer::with_size(4, 4);
        buf.clear(10, 20, 30);
        assert_eq!(buf.get_pixel(0, 0), Some((10, 20, 30)));
        assert_eq!(buf.get_pixel_rgba(3, 3), Some((10, 20, 30, 255)));
        assert_eq!(buf.get_pixel(4, 0), None);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut buf = PixelBuffer::with_size(8, 8);
        buf.clear(0, 0, 0);
        buf.fill_rect(-2, -2, 4, 4, 255, 0, 0);
        assert_eq!(buf.get_pixel(1, 1), Some((255, 0, 0)));
        assert_eq!(buf.get_pixel(2, 2), Some((0, 0, 0)));
    }

    #[test]
    fn test_composite_over_respects_alpha() {
        let mut dst = PixelBuffer::with_size(2, 1);
        dst.clear(100, 100, 100);

        let mut src = PixelBuffer::with_size(2, 1);
        src.clear_rgba(0, 0, 0, 0);
        src.set_pixel(0, 0, 255, 0, 0); // opaque

        dst.composite_over(&src);
        assert_eq!(dst.get_pixel(0, 0), Some((255, 0, 0)));
        // Transparent source pixel leaves destination alone
        assert_eq!(dst.get_pixel(1, 0), Some((100, 100, 100)));
    }

    #[test]
    fn test_fill_polygon_covers_interior() {
        let mut buf = PixelBuffer::with_size(10, 10);
        buf.clear(0, 0, 0);
        let square = [(1.0, 1.0), (8.0, 1.0), (8.0, 8.0), (1.0, 8.0)];
        buf.fill_polygon(&square, 0, 255, 0);
        assert_eq!(buf.get_pixel(4, 4), Some((0, 255, 0)));
        assert_eq!(buf.get_pixel(0, 0), Some((0, 0, 0)));
    }
}
