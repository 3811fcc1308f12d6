use crate::renderer::{self, FONT_HEIGHT};
use crate::sim::{ExperimentMode, SimParams};

/// Number of adjustable parameters.
const PARAM_COUNT: usize = 7;

/// Panel layout constants.
const GAUGE_WIDTH: usize = 8;

/// Overlay panel state.
pub struct OverlayState {
    pub visible: bool,
    pub selected: usize,
}

impl OverlayState {
    pub fn new() -> Self {
        Self {
            visible: false,
            selected: 0,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn navigate(&mut self, delta: isize) {
        let count = PARAM_COUNT as isize;
        self.selected = ((self.selected as isize + delta).rem_euclid(count)) as usize;
    }
}

/// Definition of an adjustable parameter.
pub struct ParamDef {
    pub name: &'static str,
    pub short: &'static str,
    pub desc: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub fine_step: f64,
    pub get: fn(&SimParams) -> f64,
    pub set: fn(&mut SimParams, f64),
}

/// All 7 adjustable parameters. Booleans and counts ride the same f64 table.
pub const PARAM_DEFS: [ParamDef; PARAM_COUNT] = [
    ParamDef {
        name: "speed",
        short: "flow speed",
        desc: "free-stream flow speed, m/s",
        min: 0.05,
        max: 6.0,
        step: 0.05,
        fine_step: 0.01,
        get: |p| p.flow_speed,
        set: |p, v| p.flow_speed = v,
    },
    ParamDef {
        name: "visc",
        short: "viscosity",
        desc: "dynamic viscosity, pa.s",
        min: 0.0001,
        max: 2.0,
        step: 0.005,
        fine_step: 0.0005,
        get: |p| p.viscosity,
        set: |p, v| p.viscosity = v,
    },
    ParamDef {
        name: "dens",
        short: "density",
        desc: "fluid density, kg/m3",
        min: 1.0,
        max: 13600.0,
        step: 50.0,
        fine_step: 5.0,
        get: |p| p.density,
        set: |p, v| p.density = v,
    },
    ParamDef {
        name: "diam",
        short: "diameter",
        desc: "characteristic diameter, m",
        min: 0.02,
        max: 1.0,
        step: 0.02,
        fine_step: 0.005,
        get: |p| p.diameter,
        set: |p, v| p.diameter = v,
    },
    ParamDef {
        name: "part",
        short: "particles",
        desc: "tracer particle population",
        min: 0.0,
        max: 4000.0,
        step: 50.0,
        fine_step: 10.0,
        get: |p| p.particle_count as f64,
        set: |p, v| p.particle_count = v.round().max(0.0) as usize,
    },
    ParamDef {
        name: "fade",
        short: "trail fade",
        desc: "trail strength, 0 disables trails",
        min: 0.0,
        max: 0.95,
        step: 0.05,
        fine_step: 0.01,
        get: |p| p.trail_fade,
        set: |p, v| p.trail_fade = v,
    },
    ParamDef {
        name: "line",
        short: "streamlines",
        desc: "streamline traces on/off",
        min: 0.0,
        max: 1.0,
        step: 1.0,
        fine_step: 1.0,
        get: |p| {
            if p.show_streamlines {
                1.0
            } else {
                0.0
            }
        },
        set: |p, v| p.show_streamlines = v >= 0.5,
    },
];

/// Adjust a parameter by delta steps (positive = increase, negative = decrease).
/// If `fine` is true, use fine_step instead of step.
/// Returns true if the value actually changed.
pub fn adjust_param(params: &mut SimParams, selected: usize, delta: i32, fine: bool) -> bool {
    let def = &PARAM_DEFS[selected];
    let old = (def.get)(params);
    let step = if fine { def.fine_step } else { def.step };
    let new_val = (old + delta as f64 * step).clamp(def.min, def.max);
    (def.set)(params, new_val);
    ((def.get)(params) - old).abs() > f64::EPSILON
}

/// Reset a parameter to its value in the mode's preset.
pub fn reset_param(params: &mut SimParams, selected: usize, mode: ExperimentMode) {
    let def = &PARAM_DEFS[selected];
    let preset = SimParams::preset(mode);
    (def.set)(params, (def.get)(&preset));
}

/// Colors used in the overlay panel.
mod colors {
    pub const BORDER: [u8; 3] = [0x44, 0x44, 0x44];
    pub const HEADER: [u8; 3] = [0x00, 0xBB, 0xBB];
    pub const LABEL_NORMAL: [u8; 3] = [0x88, 0x88, 0x88];
    pub const LABEL_SELECTED: [u8; 3] = [0xFF, 0xFF, 0xFF];
    pub const VALUE: [u8; 3] = [0xCC, 0xCC, 0xCC];
    pub const DESC_NORMAL: [u8; 3] = [0x66, 0x66, 0x66];
    pub const DESC_SELECTED: [u8; 3] = [0xAA, 0xAA, 0xAA];
    pub const HINT: [u8; 3] = [0x44, 0x88, 0x88];
    pub const CURSOR: [u8; 3] = [0x00, 0xFF, 0xFF];
}

/// Darken a rectangular region of the buffer by multiplying RGB by `factor`.
fn darken_rect(
    buf: &mut [u8],
    frame_width: usize,
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
    factor: f64,
) {
    for dy in 0..h {
        let y = y0 + dy;
        for dx in 0..w {
            let x = x0 + dx;
            let off = (y * frame_width + x) * 4;
            if off + 3 < buf.len() {
                buf[off] = (buf[off] as f64 * factor) as u8;
                buf[off + 1] = (buf[off + 1] as f64 * factor) as u8;
                buf[off + 2] = (buf[off + 2] as f64 * factor) as u8;
            }
        }
    }
}

/// Draw a 1px border rectangle.
fn draw_rect_border(
    buf: &mut [u8],
    frame_width: usize,
    x0: usize,
    y0: usize,
    w: usize,
    h: usize,
    color: [u8; 3],
) {
    for dx in 0..w {
        for &y in &[y0, y0 + h - 1] {
            let off = (y * frame_width + x0 + dx) * 4;
            if off + 3 < buf.len() {
                buf[off] = color[0];
                buf[off + 1] = color[1];
                buf[off + 2] = color[2];
                buf[off + 3] = 255;
            }
        }
    }
    for dy in 0..h {
        for &x in &[x0, x0 + w - 1] {
            let off = ((y0 + dy) * frame_width + x) * 4;
            if off + 3 < buf.len() {
                buf[off] = color[0];
                buf[off + 1] = color[1];
                buf[off + 2] = color[2];
                buf[off + 3] = 255;
            }
        }
    }
}

/// Draw a gauge bar with teal gradient fill at custom pixel dimensions.
fn draw_gauge_scaled(
    buf: &mut [u8],
    frame_width: usize,
    x: usize,
    y: usize,
    ratio: f64,
    width_chars: usize,
    char_step: usize,
    height: usize,
) {
    let total_px = width_chars * char_step;
    let filled_px = ((ratio * total_px as f64).round() as usize).min(total_px);

    for dy in 0..height {
        for dx in 0..total_px {
            let off = ((y + dy) * frame_width + x + dx) * 4;
            if off + 3 < buf.len() {
                if dx < filled_px {
                    let t = dx as f64 / total_px as f64;
                    buf[off] = 0;
                    buf[off + 1] = (0x55 as f64 + t * (0xCC - 0x55) as f64) as u8;
                    buf[off + 2] = (0x55 as f64 + t * (0xCC - 0x55) as f64) as u8;
                } else {
                    buf[off] = 0x22;
                    buf[off + 1] = 0x22;
                    buf[off + 2] = 0x22;
                }
                buf[off + 3] = 255;
            }
        }
    }
}

/// Render the overlay panel onto the frame buffer.
/// Does nothing if `state.visible` is false.
pub fn render_overlay(
    buf: &mut [u8],
    frame_width: usize,
    display_width: usize,
    display_height: usize,
    state: &OverlayState,
    params: &SimParams,
) {
    if !state.visible {
        return;
    }

    // Font: 7×9 pixels (nearest-neighbor resize from 5×7)
    let cw: usize = 7;
    let ch: usize = 9;
    let sc = cw + cw / 5 + 1;
    let row_h = ch + 4;
    let pad = 10;

    let content_chars = 35;
    let panel_w = content_chars * sc + pad * 2;

    let panel_h = pad
        + row_h                         // header
        + 4
        + PARAM_COUNT * row_h
        + 6
        + row_h                         // description
        + 4
        + (FONT_HEIGHT + 2)             // hints at 1x
        + pad;

    let panel_w = panel_w.min(display_width.saturating_sub(4));
    let panel_h = panel_h.min(display_height.saturating_sub(4));
    let px = display_width.saturating_sub(panel_w) / 2;
    let py = display_height.saturating_sub(panel_h) / 2;

    darken_rect(buf, frame_width, px, py, panel_w, panel_h, 0.25);
    draw_rect_border(buf, frame_width, px, py, panel_w, panel_h, colors::BORDER);

    let left = px + pad;
    let mut cy = py + pad;

    let header = format!("{} parameters", params.mode.label());
    renderer::draw_text_sized(buf, frame_width, left, cy, &header, colors::HEADER, cw, ch);
    cy += row_h + 4;

    for (i, def) in PARAM_DEFS.iter().enumerate() {
        let is_sel = i == state.selected;
        let label_color = if is_sel {
            colors::LABEL_SELECTED
        } else {
            colors::LABEL_NORMAL
        };
        let desc_color = if is_sel {
            colors::DESC_SELECTED
        } else {
            colors::DESC_NORMAL
        };

        let mut cx = left;
        if is_sel {
            renderer::draw_text_sized(buf, frame_width, cx, cy, ">", colors::CURSOR, cw, ch);
        }
        cx += 2 * sc;

        renderer::draw_text_sized(buf, frame_width, cx, cy, def.name, label_color, cw, ch);
        cx = left + 8 * sc;

        let val = (def.get)(params);
        let ratio = if (def.max - def.min).abs() > f64::EPSILON {
            ((val - def.min) / (def.max - def.min)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        draw_gauge_scaled(buf, frame_width, cx, cy, ratio, GAUGE_WIDTH, sc, ch);
        cx += GAUGE_WIDTH * sc + sc;

        let val_str = if def.step >= 1.0 {
            format!("{:.0}", val)
        } else if def.step >= 0.05 {
            format!("{:.2}", val)
        } else if def.step >= 0.001 {
            format!("{:.3}", val)
        } else {
            format!("{:.4}", val)
        };
        cx = renderer::draw_text_sized(buf, frame_width, cx, cy, &val_str, colors::VALUE, cw, ch);
        cx += sc;

        renderer::draw_text_sized(buf, frame_width, cx, cy, def.short, desc_color, cw, ch);

        cy += row_h;
    }

    cy += 6;

    let sel_def = &PARAM_DEFS[state.selected];
    renderer::draw_text_sized(buf, frame_width, left, cy, sel_def.desc, colors::DESC_SELECTED, cw, ch);
    cy += row_h + 4;

    renderer::draw_text(
        buf,
        frame_width,
        left,
        cy,
        "space=close  ud=nav  lr=adj  ,.=fine  r=reset",
        colors::HINT,
    );
}
