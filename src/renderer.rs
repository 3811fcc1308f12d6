use crate::sim::field;
use crate::sim::{ExperimentMode, FrameSnapshot, Xor128};

/// Background and apparatus palette.
const BG: [u8; 3] = [0x0A, 0x0C, 0x14];
const WALL: [u8; 3] = [0x3A, 0x3A, 0x3A];
const SURFACE: [u8; 3] = [0x2E, 0x4A, 0x5E];
const STREAMLINE: [f64; 3] = [100.0, 180.0, 210.0];

/// Particle core colors for adaptive contrast against the background.
const CORE_BRIGHT: [f64; 3] = [240.0, 240.0, 220.0];
const CORE_DARK: [f64; 3] = [8.0, 8.0, 8.0];

/// Status bar layout constants.
pub(crate) const FONT_WIDTH: usize = 5;
pub(crate) const FONT_HEIGHT: usize = 7;
const STATUS_PAD_TOP: usize = 3;
const STATUS_PAD_BOTTOM: usize = 2;
pub(crate) const STATUS_BAR_HEIGHT: usize = STATUS_PAD_TOP + FONT_HEIGHT + STATUS_PAD_BOTTOM;

/// Pipe/channel wall thickness, px.
const WALL_THICKNESS: usize = 4;
/// Venturi duct inset at the throat relative to domain height.
const VENTURI_INSET_FRAC: f64 = 0.28;

/// Streamline tracing: seeds down the left edge, Euler steps along the field.
const STREAMLINE_SEEDS: usize = 14;
const STREAMLINE_STEPS: usize = 600;
const STREAMLINE_STEP_PX: f64 = 2.0;

/// 5x7 bitmap font glyph lookup. Each row is a u8 with lower 5 bits = pixels (bit4=left).
const fn glyph(ch: u8) -> [u8; FONT_HEIGHT] {
    match ch {
        b' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        b'.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00],
        b',' => [0x00, 0x00, 0x00, 0x00, 0x04, 0x04, 0x08],
        b'-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        b'>' => [0x10, 0x08, 0x04, 0x02, 0x04, 0x08, 0x10],
        b'=' => [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00],
        b'|' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        b'/' => [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10],
        b'0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        b'1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        b'2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        b'3' => [0x0E, 0x11, 0x01, 0x06, 0x01, 0x11, 0x0E],
        b'4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        b'5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        b'6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        b'7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        b'8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        b'9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        b'a' => [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F],
        b'b' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E],
        b'c' => [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E],
        b'd' => [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F],
        b'e' => [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E],
        b'f' => [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08],
        b'g' => [0x00, 0x00, 0x0F, 0x11, 0x0F, 0x01, 0x0E],
        b'h' => [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11],
        b'i' => [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E],
        b'j' => [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C],
        b'k' => [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12],
        b'l' => [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        b'm' => [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11],
        b'n' => [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11],
        b'o' => [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E],
        b'p' => [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10],
        b'q' => [0x00, 0x00, 0x0D, 0x13, 0x0F, 0x01, 0x01],
        b'r' => [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10],
        b's' => [0x00, 0x00, 0x0E, 0x10, 0x0E, 0x01, 0x1E],
        b't' => [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06],
        b'u' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D],
        b'v' => [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04],
        b'w' => [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A],
        b'x' => [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11],
        b'y' => [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E],
        b'z' => [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F],
        _ => [0x00; FONT_HEIGHT],
    }
}

fn draw_char(buf: &mut [u8], frame_width: usize, x: usize, y: usize, ch: u8, color: [u8; 3]) {
    let g = glyph(ch);
    for row in 0..FONT_HEIGHT {
        let bits = g[row];
        for col in 0..FONT_WIDTH {
            if bits & (1 << (FONT_WIDTH - 1 - col)) != 0 {
                let offset = ((y + row) * frame_width + x + col) * 4;
                if offset + 3 < buf.len() {
                    buf[offset] = color[0];
                    buf[offset + 1] = color[1];
                    buf[offset + 2] = color[2];
                    buf[offset + 3] = 255;
                }
            }
        }
    }
}

/// Draw a string of text at (x, y). Returns the x position after the last character.
pub(crate) fn draw_text(
    buf: &mut [u8],
    frame_width: usize,
    x: usize,
    y: usize,
    text: &str,
    color: [u8; 3],
) -> usize {
    let char_step = FONT_WIDTH + 1;
    let mut cx = x;
    for &ch in text.as_bytes() {
        draw_char(buf, frame_width, cx, y, ch, color);
        cx += char_step;
    }
    cx
}

/// Draw a character resized to (cw × ch) pixels via nearest-neighbor.
fn draw_char_sized(
    buf: &mut [u8],
    frame_width: usize,
    x: usize,
    y: usize,
    ch_code: u8,
    color: [u8; 3],
    cw: usize,
    ch: usize,
) {
    let g = glyph(ch_code);
    for py in 0..ch {
        let src_row = py * FONT_HEIGHT / ch;
        let bits = g[src_row];
        for px in 0..cw {
            let src_col = px * FONT_WIDTH / cw;
            if bits & (1 << (FONT_WIDTH - 1 - src_col)) != 0 {
                let offset = ((y + py) * frame_width + x + px) * 4;
                if offset + 3 < buf.len() {
                    buf[offset] = color[0];
                    buf[offset + 1] = color[1];
                    buf[offset + 2] = color[2];
                    buf[offset + 3] = 255;
                }
            }
        }
    }
}

/// Draw text with each character sized to (cw × ch) pixels.
pub(crate) fn draw_text_sized(
    buf: &mut [u8],
    frame_width: usize,
    x: usize,
    y: usize,
    text: &str,
    color: [u8; 3],
    cw: usize,
    ch: usize,
) -> usize {
    let char_step = cw + cw / 5 + 1;
    let mut cx = x;
    for &byte in text.as_bytes() {
        draw_char_sized(buf, frame_width, cx, y, byte, color, cw, ch);
        cx += char_step;
    }
    cx
}

/// Render layout computed from the window size. The display area maps 1:1 to
/// the simulation domain; the status bar hangs below it.
pub struct RenderConfig {
    pub display_width: usize,
    pub display_height: usize,
    pub frame_width: usize,
    pub frame_height: usize,
}

impl RenderConfig {
    pub fn fit(pixel_width: usize, pixel_height: usize) -> Self {
        let display_width = pixel_width.max(200);
        let display_height = pixel_height.saturating_sub(STATUS_BAR_HEIGHT).max(200);
        Self {
            display_width,
            display_height,
            frame_width: display_width,
            frame_height: display_height + STATUS_BAR_HEIGHT,
        }
    }
}

/// Screen-space alpha blend of a single pixel toward `color`.
fn blend_px(buf: &mut [u8], offset: usize, color: [f64; 3], alpha: f64) {
    if offset + 3 >= buf.len() {
        return;
    }
    let a = alpha.clamp(0.0, 1.0);
    for c in 0..3 {
        let bg = buf[offset + c] as f64;
        buf[offset + c] = (bg + (color[c] - bg) * a) as u8;
    }
    buf[offset + 3] = 255;
}

fn fill_rect(
    buf: &mut [u8],
    frame_width: usize,
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
    color: [u8; 3],
) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let offset = (y * frame_width + x) * 4;
            if offset + 3 < buf.len() {
                buf[offset] = color[0];
                buf[offset + 1] = color[1];
                buf[offset + 2] = color[2];
                buf[offset + 3] = 255;
            }
        }
    }
}

/// Mode-specific apparatus underlay: duct walls, cylinder disc, channel bed.
fn draw_apparatus(buf: &mut [u8], snap: &FrameSnapshot, cfg: &RenderConfig) {
    let dw = cfg.display_width;
    let dh = cfg.display_height;
    let fw = cfg.frame_width;
    match snap.params.mode {
        ExperimentMode::Uniform => {}

        ExperimentMode::Venturi => {
            // Duct walls converge toward the throat following the same
            // Gaussian the field uses, so the drawn geometry matches the flow.
            let (throat_x, sigma) = field::venturi_geometry(&snap.domain, snap.params.diameter);
            let inset_max = snap.domain.height * VENTURI_INSET_FRAC;
            for x in 0..dw {
                let dx = x as f64 - throat_x;
                let g = (-dx * dx / (2.0 * sigma * sigma)).exp();
                let inset = (inset_max * g) as usize;
                fill_rect(buf, fw, x, 0, 1, inset + WALL_THICKNESS, WALL);
                let lower_top = dh.saturating_sub(inset + WALL_THICKNESS);
                fill_rect(buf, fw, x, lower_top, 1, dh - lower_top, WALL);
            }
        }

        ExperimentMode::Cylinder => {
            let (cx, cy, radius) = field::cylinder_geometry(&snap.domain, snap.params.diameter);
            let x0 = (cx - radius - 1.0).max(0.0) as usize;
            let x1 = ((cx + radius + 2.0) as usize).min(dw);
            let y0 = (cy - radius - 1.0).max(0.0) as usize;
            let y1 = ((cy + radius + 2.0) as usize).min(dh);
            let wall = [WALL[0] as f64, WALL[1] as f64, WALL[2] as f64];
            for y in y0..y1 {
                for x in x0..x1 {
                    let dx = x as f64 - cx;
                    let dy = y as f64 - cy;
                    let dist = (dx * dx + dy * dy).sqrt();
                    let offset = (y * fw + x) * 4;
                    if dist < radius - 0.5 {
                        blend_px(buf, offset, wall, 1.0);
                    } else if dist < radius + 0.5 {
                        // Anti-aliased rim.
                        let a = 1.0 - (dist - (radius - 0.5)).clamp(0.0, 1.0);
                        blend_px(buf, offset, wall, a);
                    }
                }
            }
        }

        ExperimentMode::PipeProfile => {
            fill_rect(buf, fw, 0, 0, dw, WALL_THICKNESS, WALL);
            fill_rect(buf, fw, 0, dh.saturating_sub(WALL_THICKNESS), dw, WALL_THICKNESS, WALL);
        }

        ExperimentMode::OpenChannel => {
            // Free surface line on top, hatched bed at the bottom.
            fill_rect(buf, fw, 0, 0, dw, 2, SURFACE);
            let bed_top = dh.saturating_sub(WALL_THICKNESS);
            fill_rect(buf, fw, 0, bed_top, dw, WALL_THICKNESS, WALL);
            for x in (0..dw).step_by(12) {
                let w = 6.min(dw - x);
                fill_rect(buf, fw, x, bed_top.saturating_sub(2), w, 2, WALL);
            }
        }
    }
}

/// Trace streamlines through the analytic field from seeds on the inflow edge.
fn draw_streamlines(buf: &mut [u8], snap: &FrameSnapshot, cfg: &RenderConfig, rng: &mut Xor128) {
    let dw = cfg.display_width as f64;
    let dh = cfg.display_height as f64;
    for seed in 0..STREAMLINE_SEEDS {
        let mut x = 1.0;
        let mut y = (seed as f64 + 0.5) / STREAMLINE_SEEDS as f64 * snap.domain.height;
        for _ in 0..STREAMLINE_STEPS {
            let (u, v) = field::velocity_at(x, y, &snap.domain, &snap.params, rng);
            let mag = (u * u + v * v).sqrt();
            if mag < 1e-9 {
                break;
            }
            x += u / mag * STREAMLINE_STEP_PX;
            y += v / mag * STREAMLINE_STEP_PX;
            if x < 0.0 || x >= dw || y < 0.0 || y >= dh {
                break;
            }
            let offset = (y as usize * cfg.frame_width + x as usize) * 4;
            blend_px(buf, offset, STREAMLINE, 0.35);
        }
    }
}

/// Diamond particle footprint: core pixel plus four blended neighbors.
const DIAMOND: [(isize, isize, bool); 5] = [
    (0, -1, false),
    (-1, 0, false),
    (0, 0, true),
    (1, 0, false),
    (0, 1, false),
];

fn draw_particle(buf: &mut [u8], cfg: &RenderConfig, x: f64, y: f64, alpha: f64) {
    let dw = cfg.display_width;
    let dh = cfg.display_height;
    let cx = x as isize;
    let cy = y as isize;
    if cx < 0 || cy < 0 || cx as usize >= dw || cy as usize >= dh {
        return;
    }

    // Adaptive contrast: light core on dark ground, dark core on light.
    let bg_off = (cy as usize * cfg.frame_width + cx as usize) * 4;
    let lum =
        buf[bg_off] as f64 * 0.3 + buf[bg_off + 1] as f64 * 0.59 + buf[bg_off + 2] as f64 * 0.11;
    let t = ((lum - 80.0) / 100.0).clamp(0.0, 1.0);
    let core = [
        CORE_BRIGHT[0] + t * (CORE_DARK[0] - CORE_BRIGHT[0]),
        CORE_BRIGHT[1] + t * (CORE_DARK[1] - CORE_BRIGHT[1]),
        CORE_BRIGHT[2] + t * (CORE_DARK[2] - CORE_BRIGHT[2]),
    ];

    for &(dx, dy, is_core) in &DIAMOND {
        let px = cx + dx;
        let py = cy + dy;
        if px >= 0 && py >= 0 && (px as usize) < dw && (py as usize) < dh {
            let offset = (py as usize * cfg.frame_width + px as usize) * 4;
            let a = if is_core { alpha } else { alpha * 0.5 };
            blend_px(buf, offset, core, a);
        }
    }
}

/// Render one frame into a pre-allocated RGBA buffer (resized as needed):
/// background, apparatus, optional streamlines, fading trails, particles.
pub fn render_into(
    buf: &mut Vec<u8>,
    snap: &FrameSnapshot,
    cfg: &RenderConfig,
    stream_rng: &mut Xor128,
) {
    let total = cfg.frame_width * cfg.frame_height * 4;
    buf.resize(total, 0);
    for pixel in buf.chunks_exact_mut(4) {
        pixel[0] = BG[0];
        pixel[1] = BG[1];
        pixel[2] = BG[2];
        pixel[3] = 255;
    }

    draw_apparatus(buf, snap, cfg);

    if snap.params.show_streamlines {
        draw_streamlines(buf, snap, cfg, stream_rng);
    }

    // Trails, oldest first so newer positions draw on top.
    let fade = snap.params.trail_fade;
    if fade > 0.0 {
        let count = snap.trail_xs.len();
        for (i, (xs, ys)) in snap.trail_xs.iter().zip(&snap.trail_ys).enumerate() {
            let age_frac = (i + 1) as f64 / count.max(1) as f64;
            let alpha = fade * age_frac * 0.45;
            for (&x, &y) in xs.iter().zip(ys) {
                let px = x as isize;
                let py = y as isize;
                if px >= 0
                    && py >= 0
                    && (px as usize) < cfg.display_width
                    && (py as usize) < cfg.display_height
                {
                    let offset = (py as usize * cfg.frame_width + px as usize) * 4;
                    blend_px(buf, offset, CORE_BRIGHT, alpha);
                }
            }
        }
    }

    for (&x, &y) in snap.particles_x.iter().zip(&snap.particles_y) {
        draw_particle(buf, cfg, x, y, 1.0);
    }

    if !snap.running {
        draw_text_sized(buf, cfg.frame_width, 8, 8, "paused", [0xFF, 0xCC, 0x44], 10, 14);
    }
}

/// Draw status text at the bottom of the frame buffer.
pub fn render_status(buf: &mut [u8], cfg: &RenderConfig, text: &str) {
    let fw = cfg.frame_width;
    let y_start = cfg.display_height;

    for y in y_start..cfg.frame_height {
        for x in 0..fw {
            let offset = (y * fw + x) * 4;
            if offset + 3 < buf.len() {
                buf[offset] = 0x0D;
                buf[offset + 1] = 0x0D;
                buf[offset + 2] = 0x0D;
                buf[offset + 3] = 255;
            }
        }
    }

    // Separator line
    for x in 0..fw {
        let offset = (y_start * fw + x) * 4;
        if offset + 3 < buf.len() {
            buf[offset] = 0x33;
            buf[offset + 1] = 0x33;
            buf[offset + 2] = 0x33;
            buf[offset + 3] = 255;
        }
    }

    let text_y = y_start + STATUS_PAD_TOP;
    let text_color: [u8; 3] = [0x88, 0x88, 0x88];
    let char_step = FONT_WIDTH + 1;
    let mut cx = 4;
    for &ch in text.as_bytes() {
        if cx + FONT_WIDTH > fw {
            break;
        }
        draw_char(buf, fw, cx, text_y, ch, text_color);
        cx += char_step;
    }
}
