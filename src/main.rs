mod config;
mod export;
mod overlay;
mod renderer;
mod sim;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use minifb::{Key, KeyRepeat, Window, WindowOptions};

use sim::{Command, Domain, Engine, ExperimentMode, FrameSnapshot, SimParams, Xor128};

/// Per-mode parameter storage with save/restore on mode switch.
struct ModeParams {
    uniform: SimParams,
    venturi: SimParams,
    cylinder: SimParams,
    pipe: SimParams,
    channel: SimParams,
}

impl ModeParams {
    fn new(initial: SimParams) -> Self {
        let mut mp = Self {
            uniform: SimParams::preset(ExperimentMode::Uniform),
            venturi: SimParams::preset(ExperimentMode::Venturi),
            cylinder: SimParams::preset(ExperimentMode::Cylinder),
            pipe: SimParams::preset(ExperimentMode::PipeProfile),
            channel: SimParams::preset(ExperimentMode::OpenChannel),
        };
        let mode = initial.mode;
        *mp.slot_mut(mode) = initial;
        mp
    }

    fn slot_mut(&mut self, mode: ExperimentMode) -> &mut SimParams {
        match mode {
            ExperimentMode::Uniform => &mut self.uniform,
            ExperimentMode::Venturi => &mut self.venturi,
            ExperimentMode::Cylinder => &mut self.cylinder,
            ExperimentMode::PipeProfile => &mut self.pipe,
            ExperimentMode::OpenChannel => &mut self.channel,
        }
    }

    fn get(&self, mode: ExperimentMode) -> &SimParams {
        match mode {
            ExperimentMode::Uniform => &self.uniform,
            ExperimentMode::Venturi => &self.venturi,
            ExperimentMode::Cylinder => &self.cylinder,
            ExperimentMode::PipeProfile => &self.pipe,
            ExperimentMode::OpenChannel => &self.channel,
        }
    }

    /// Save current params under their mode, cycle to the next mode, and
    /// return the restored params for it.
    fn save_and_switch(&mut self, current: &SimParams) -> SimParams {
        let next = current.mode.next();
        *self.slot_mut(current.mode) = current.clone();
        self.get(next).clone()
    }
}

/// Channels connecting the main (render) thread to the physics thread.
struct PhysicsChannels {
    cmd_tx: mpsc::Sender<Command>,
    snap_rx: mpsc::Receiver<FrameSnapshot>,
    snap_return_tx: mpsc::Sender<FrameSnapshot>,
}

/// Spawn the physics simulation thread and return its channels + join handle.
/// The bounded snapshot channel paces the physics loop to the render loop.
fn spawn_physics_thread(
    params: SimParams,
    domain: Domain,
    running: Arc<AtomicBool>,
) -> (PhysicsChannels, std::thread::JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    let (snap_tx, snap_rx) = mpsc::sync_channel::<FrameSnapshot>(1);
    let (snap_return_tx, snap_return_rx) = mpsc::channel::<FrameSnapshot>();

    let handle = std::thread::spawn(move || {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(42);
        let count = params.particle_count;
        let mut engine = Engine::new(params, domain, seed);
        let mut snap_buf = FrameSnapshot::new_empty(count);
        let mut last_tick = Instant::now();

        while running.load(Ordering::SeqCst) {
            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    Command::Params(p) => engine.apply_params(p),
                    Command::Pause(paused) => {
                        engine.set_running(!paused);
                        log::info!(
                            "simulation {}",
                            if engine.is_running() { "resumed" } else { "paused" }
                        );
                    }
                    Command::Reset => {
                        engine.reset();
                        log::info!(
                            "{} experiment reset, {} particles respawned (re={})",
                            engine.params().mode.label(),
                            engine.population(),
                            engine.readouts().reynolds as i64,
                        );
                    }
                    Command::Domain(d) => engine.set_domain(d),
                    Command::ExportCsv(path) => {
                        match export::write_readout_csv(engine.readout_log(), &path) {
                            Ok(()) => log::info!("readout log written to {}", path.display()),
                            Err(e) => log::error!("csv export failed: {e}"),
                        }
                    }
                }
            }

            let now = Instant::now();
            let dt = now.duration_since(last_tick).as_secs_f64();
            last_tick = now;
            engine.step(dt);

            engine.snapshot_into(&mut snap_buf);
            if snap_tx.send(snap_buf).is_err() {
                break;
            }
            snap_buf = snap_return_rx
                .try_recv()
                .unwrap_or_else(|_| FrameSnapshot::new_empty(engine.population()));
        }
    });

    let channels = PhysicsChannels {
        cmd_tx,
        snap_rx,
        snap_return_tx,
    };
    (channels, handle)
}

fn format_status(snap: &FrameSnapshot, panel_visible: bool, paused: bool) -> String {
    if panel_visible {
        return "space=close  ud=nav  lr=adj  ,.=fine  r=reset".to_string();
    }
    let r = snap.readouts;
    let p = &snap.params;
    let state = if paused { " | paused" } else { "" };
    format!(
        "{}{} | re={} v={:.2} m/s q={:.3} kpa | u={:.2} visc={:.3} d={:.2} | p={} | space=params m=mode",
        p.mode.label(),
        state,
        r.reynolds as i64,
        r.avg_velocity,
        r.dynamic_pressure,
        p.flow_speed,
        p.viscosity,
        p.diameter,
        p.particle_count,
    )
}

/// Timestamped export path in the working directory.
fn export_path(prefix: &str, ext: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    PathBuf::from(format!("{prefix}-{stamp}.{ext}"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cfg = config::load();
    let mut current_params = cfg.initial_params();
    log::info!(
        "starting {} experiment with {} particles",
        current_params.mode.label(),
        current_params.particle_count
    );

    let mut render_cfg = renderer::RenderConfig::fit(cfg.display.width, cfg.display.height);
    let mut w = render_cfg.frame_width;
    let mut h = render_cfg.frame_height;

    let mut window = Window::new(
        "flowlab",
        w,
        h,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .expect("Failed to create window");

    window.set_target_fps(cfg.display.target_fps);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let domain = Domain::new(render_cfg.display_width, render_cfg.display_height);
    let (channels, physics_thread) =
        spawn_physics_thread(current_params.clone(), domain, running.clone());
    let PhysicsChannels {
        cmd_tx,
        snap_rx,
        snap_return_tx,
    } = channels;

    let mut mode_params = ModeParams::new(current_params.clone());
    let mut overlay_state = overlay::OverlayState::new();
    let mut paused = false;

    let mut framebuf = vec![0u32; w * h];
    let mut rgba_buf: Vec<u8> = Vec::new();
    let mut stream_rng = Xor128::new(7);
    let mut frame_count = 0u32;
    let mut last_fps_time = Instant::now();
    let mut last_snap: Option<FrameSnapshot> = None;

    while window.is_open() && running.load(Ordering::SeqCst) {
        // --- Keyboard handling ---

        // Escape: close panel first, then quit app
        if window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            if overlay_state.visible {
                overlay_state.visible = false;
            } else {
                break;
            }
        }

        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            overlay_state.toggle();
        }

        if overlay_state.visible {
            if window.is_key_pressed(Key::Up, KeyRepeat::Yes) {
                overlay_state.navigate(-1);
            }
            if window.is_key_pressed(Key::Down, KeyRepeat::Yes) {
                overlay_state.navigate(1);
            }

            let adjust = |delta: i32, fine: bool, params: &mut SimParams| {
                if overlay::adjust_param(params, overlay_state.selected, delta, fine) {
                    let _ = cmd_tx.send(Command::Params(params.clone()));
                }
            };
            if window.is_key_pressed(Key::Left, KeyRepeat::Yes) {
                adjust(-1, false, &mut current_params);
            }
            if window.is_key_pressed(Key::Right, KeyRepeat::Yes) {
                adjust(1, false, &mut current_params);
            }
            if window.is_key_pressed(Key::Comma, KeyRepeat::Yes) {
                adjust(-1, true, &mut current_params);
            }
            if window.is_key_pressed(Key::Period, KeyRepeat::Yes) {
                adjust(1, true, &mut current_params);
            }
            if window.is_key_pressed(Key::R, KeyRepeat::No) {
                let mode = current_params.mode;
                overlay::reset_param(&mut current_params, overlay_state.selected, mode);
                let _ = cmd_tx.send(Command::Params(current_params.clone()));
            }
        } else if window.is_key_pressed(Key::R, KeyRepeat::No) {
            let _ = cmd_tx.send(Command::Reset);
        }

        // M: cycle experiment mode, restoring that mode's saved parameters
        if window.is_key_pressed(Key::M, KeyRepeat::No) {
            current_params = mode_params.save_and_switch(&current_params);
            log::info!("switched to {} experiment", current_params.mode.label());
            let _ = cmd_tx.send(Command::Params(current_params.clone()));
            overlay_state.selected = 0;
        }

        // P: pause / resume (parameter edits still apply while paused)
        if window.is_key_pressed(Key::P, KeyRepeat::No) {
            paused = !paused;
            let _ = cmd_tx.send(Command::Pause(paused));
        }

        // T: toggle streamline traces
        if window.is_key_pressed(Key::T, KeyRepeat::No) {
            current_params.show_streamlines = !current_params.show_streamlines;
            let _ = cmd_tx.send(Command::Params(current_params.clone()));
        }

        // E: export readout history as CSV (written by the physics thread)
        if window.is_key_pressed(Key::E, KeyRepeat::No) {
            let _ = cmd_tx.send(Command::ExportCsv(export_path("flowlab-readouts", "csv")));
        }

        // S: dump the current frame as PPM
        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            if !rgba_buf.is_empty() {
                let path = export_path("flowlab-frame", "ppm");
                match export::write_frame_ppm(&rgba_buf, w, h, &path) {
                    Ok(()) => log::info!("frame written to {}", path.display()),
                    Err(e) => log::error!("frame export failed: {e}"),
                }
            }
        }

        // --- Check for window resize ---
        let (new_w, new_h) = window.get_size();
        if new_w != w || new_h != h {
            render_cfg = renderer::RenderConfig::fit(new_w, new_h);
            w = render_cfg.frame_width;
            h = render_cfg.frame_height;
            framebuf = vec![0u32; w * h];
            let _ = cmd_tx.send(Command::Domain(Domain::new(
                render_cfg.display_width,
                render_cfg.display_height,
            )));
            last_snap = None;
        }

        // --- Non-blocking: grab latest snapshot if available ---
        let mut snap = None;
        while let Ok(s) = snap_rx.try_recv() {
            snap = Some(s);
        }

        if let Some(s) = snap {
            // Return old snapshot buffer to the physics thread for reuse
            if let Some(old) = last_snap.take() {
                let _ = snap_return_tx.send(old);
            }
            last_snap = Some(s);
        }

        if let Some(ref s) = last_snap {
            renderer::render_into(&mut rgba_buf, s, &render_cfg, &mut stream_rng);
            let status = format_status(s, overlay_state.visible, paused);
            renderer::render_status(&mut rgba_buf, &render_cfg, &status);
            overlay::render_overlay(
                &mut rgba_buf,
                render_cfg.frame_width,
                render_cfg.display_width,
                render_cfg.display_height,
                &overlay_state,
                &current_params,
            );
            rgba_to_argb(&rgba_buf, &mut framebuf);
        }

        window.update_with_buffer(&framebuf, w, h).unwrap();

        frame_count += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            window.set_title(&format!("flowlab — {frame_count} fps"));
            frame_count = 0;
            last_fps_time = now;
        }
    }

    // Shutdown
    running.store(false, Ordering::SeqCst);
    drop(snap_rx);
    let _ = physics_thread.join();
}

/// Convert RGBA &[u8] buffer to 0RGB &[u32] buffer for minifb.
fn rgba_to_argb(rgba: &[u8], out: &mut [u32]) {
    for (i, pixel) in rgba.chunks_exact(4).enumerate() {
        if i >= out.len() {
            break;
        }
        out[i] = (pixel[0] as u32) << 16 | (pixel[1] as u32) << 8 | pixel[2] as u32;
    }
}
