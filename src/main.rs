mod app;
mod config;
mod features;
mod gfx;
mod speeds;
mod storage;
mod wayland;

use anyhow::{anyhow, Context, Result};
use app::{App, SCREEN_TITLE};
use calloop::{channel, EventLoop};
use config::Config;
use gfx::{draw::DrawContext, gl::load_ui_program};
use log::{info, warn};
use std::io::ErrorKind;
use std::time::{Duration, Instant};
use storage::{KvStore, StorageEvent, StorageWorker};
use wayland::egl::EglContext;
use wayland::WaylandState;
use wayland_client::backend::WaylandError;
use wayland_client::{Connection, EventQueue, Proxy};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1;

/// Reads whatever the compositor has sent without blocking and dispatches it.
fn pump_wayland(
    event_queue: &mut EventQueue<WaylandState>,
    state: &mut WaylandState,
) -> Result<()> {
    event_queue.flush()?;
    if let Some(guard) = event_queue.prepare_read() {
        match guard.read() {
            Ok(_) => {}
            Err(WaylandError::Io(e)) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => return Err(e.into()),
        }
    }
    event_queue.dispatch_pending(state)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    info!("Starting {}...", SCREEN_TITLE);

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config file: {:#}", e);
        Config::default()
    });
    let store_path = match &config.storage_path {
        Some(path) => path.clone(),
        None => KvStore::default_path()?,
    };
    let frame_interval = Duration::from_secs_f64(1.0 / config.fps_cap as f64);
    let mut app = App::new(config);

    // Storage results come back through the event loop
    let mut event_loop: EventLoop<App> = EventLoop::try_new()?;
    let (storage_tx, storage_rx) = channel::channel();
    event_loop
        .handle()
        .insert_source(storage_rx, |event, _, app: &mut App| {
            if let channel::Event::Msg(StorageEvent::Loaded(speeds)) = event {
                app.apply_loaded(speeds);
            }
        })
        .map_err(|e| anyhow!("Failed to register storage channel: {}", e.error))?;

    let storage = StorageWorker::spawn(KvStore::open(store_path), storage_tx)?;
    storage.load();

    info!("Connecting to Wayland...");
    let conn = Connection::connect_to_env().context("connecting to the Wayland display")?;
    let display = conn.display();

    let mut event_queue = conn.new_event_queue();
    let qh = event_queue.handle();
    let _registry = display.get_registry(&qh, ());

    let mut state = WaylandState::new(&qh);
    event_queue.roundtrip(&mut state)?;

    let compositor = state
        .compositor
        .clone()
        .ok_or_else(|| anyhow!("Compositor does not offer wl_compositor"))?;
    let layer_shell = state
        .layer_shell
        .clone()
        .ok_or_else(|| anyhow!("Compositor does not offer zwlr_layer_shell_v1"))?;

    let surface = compositor.create_surface(&qh, ());
    let layer_surface = layer_shell.get_layer_surface(
        &surface,
        None,
        zwlr_layer_shell_v1::Layer::Top,
        "trichi".to_string(),
        &qh,
        (),
    );
    // No anchor: the compositor centres the surface
    layer_surface.set_size(app.size[0], app.size[1]);
    layer_surface.set_exclusive_zone(0);
    layer_surface.set_keyboard_interactivity(wayland::keyboard_interactivity(&layer_shell));
    surface.commit();

    state.surface = Some(surface.clone());
    state.layer_surface = Some(layer_surface);
    state.cursor_surface = Some(compositor.create_surface(&qh, ()));

    while !state.configured {
        event_queue.blocking_dispatch(&mut state)?;
    }
    if let Some(size) = state.take_resize() {
        app.resize(size);
    }
    info!("Surface configured at {}x{}", app.size[0], app.size[1]);

    let display_ptr = display.id().as_ptr() as *mut _;
    let mut egl = EglContext::new(display_ptr)?;
    egl.create_surface(&surface, app.size[0] as i32, app.size[1] as i32)?;

    let gl = unsafe { glow::Context::from_loader_function(|s| egl.get_proc_address(s)) };
    let program = load_ui_program(&gl)?;
    let mut draw_context = DrawContext::new(gl, program)?;

    let mut last_frame = Instant::now();

    while state.running {
        pump_wayland(&mut event_queue, &mut state)?;

        if let Some(size) = state.take_resize() {
            app.resize(size);
            egl.resize(size[0] as i32, size[1] as i32);
        }

        for ev in state.pending_events.drain(..) {
            app.handle_event(ev);
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f64();
        last_frame = now;
        app.update(dt);

        for (edge, ms) in app.drain_saves() {
            storage.save(edge, ms);
        }

        egl.make_current()?;
        draw_context.begin(app.size.map(|x| x as f32), app.palette.background);
        app.render(&mut draw_context);
        draw_context.flush();
        egl.swap_buffers()?;

        // Waits out the rest of the frame; wakes early for storage results
        event_loop
            .dispatch(Some(frame_interval), &mut app)
            .context("dispatching event loop")?;
    }

    info!("{} closed", SCREEN_TITLE);
    Ok(())
}
