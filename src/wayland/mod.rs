pub mod egl;

use crate::app::{KeyInput, UiEvent};
use crate::gfx::math::Vec2;
use log::{debug, info, warn};
use wayland_client::{
    protocol::{wl_compositor, wl_keyboard, wl_pointer, wl_registry, wl_seat, wl_shm, wl_surface},
    Connection, Dispatch, Proxy, QueueHandle, WEnum,
};
use wayland_cursor::CursorTheme;
use wayland_protocols_wlr::layer_shell::v1::client::{
    zwlr_layer_shell_v1, zwlr_layer_surface_v1,
};
use xkbcommon::xkb::{self, keysyms, Context, Keymap, State as XkbState};

const BTN_LEFT: u32 = 0x110;
const BTN_RIGHT: u32 = 0x111;
const CURSOR_SIZE: u32 = 24;

pub struct WaylandState {
    pub running: bool,
    pub configured: bool,
    pub compositor: Option<wl_compositor::WlCompositor>,
    pub layer_shell: Option<zwlr_layer_shell_v1::ZwlrLayerShellV1>,
    pub shm: Option<wl_shm::WlShm>,
    pub surface: Option<wl_surface::WlSurface>,
    pub layer_surface: Option<zwlr_layer_surface_v1::ZwlrLayerSurfaceV1>,
    pub cursor_surface: Option<wl_surface::WlSurface>,
    pub cursor_theme: Option<CursorTheme>,
    pub seat: Option<wl_seat::WlSeat>,
    pub pointer: Option<wl_pointer::WlPointer>,
    pub keyboard: Option<wl_keyboard::WlKeyboard>,
    pub surface_pos: Vec2,
    pub pending_events: Vec<UiEvent>,
    /// Size from the latest configure, taken by the frame loop.
    pub pending_size: Option<[u32; 2]>,
    pub xkb_context: Context,
    pub xkb_keymap: Option<Keymap>,
    pub xkb_state: Option<XkbState>,
}

impl WaylandState {
    pub fn new(_qh: &QueueHandle<Self>) -> Self {
        Self {
            running: true,
            configured: false,
            compositor: None,
            layer_shell: None,
            shm: None,
            surface: None,
            layer_surface: None,
            cursor_surface: None,
            cursor_theme: None,
            seat: None,
            pointer: None,
            keyboard: None,
            surface_pos: Vec2 { x: 0.0, y: 0.0 },
            pending_events: Vec::new(),
            pending_size: None,
            xkb_context: Context::new(xkb::CONTEXT_NO_FLAGS),
            xkb_keymap: None,
            xkb_state: None,
        }
    }

    pub fn take_resize(&mut self) -> Option<[u32; 2]> {
        self.pending_size.take()
    }

    fn set_default_cursor(
        &mut self,
        conn: &Connection,
        pointer: &wl_pointer::WlPointer,
        serial: u32,
    ) {
        if self.cursor_theme.is_none() {
            if let Some(shm) = &self.shm {
                match CursorTheme::load(conn, shm.clone(), CURSOR_SIZE) {
                    Ok(theme) => self.cursor_theme = Some(theme),
                    Err(e) => warn!("Could not load cursor theme: {}", e),
                }
            }
        }

        let (Some(theme), Some(surface)) =
            (self.cursor_theme.as_mut(), self.cursor_surface.as_ref())
        else {
            return;
        };
        let Some(cursor) = theme.get_cursor("default") else {
            warn!("Cursor theme has no default cursor");
            return;
        };

        let image = &cursor[0];
        let (width, height) = image.dimensions();
        let (hx, hy) = image.hotspot();
        surface.attach(Some(&**image), 0, 0);
        surface.damage(0, 0, width as i32, height as i32);
        surface.commit();
        pointer.set_cursor(serial, Some(surface), hx as i32, hy as i32);
    }

    fn load_keymap(&mut self, fd: std::os::fd::OwnedFd, size: u32) {
        let keymap = unsafe {
            Keymap::new_from_fd(
                &self.xkb_context,
                fd,
                size as usize,
                xkb::KEYMAP_FORMAT_TEXT_V1,
                xkb::KEYMAP_COMPILE_NO_FLAGS,
            )
        };

        match keymap {
            Ok(Some(keymap)) => {
                self.xkb_state = Some(XkbState::new(&keymap));
                self.xkb_keymap = Some(keymap);
                debug!("Keymap loaded");
            }
            Ok(None) => warn!("Compositor sent a keymap xkbcommon could not compile"),
            Err(e) => warn!("Could not read keymap: {}", e),
        }
    }

    fn key_input(&self, key: u32) -> Option<KeyInput> {
        let state = self.xkb_state.as_ref()?;
        // evdev codes are offset by 8 in xkb
        let keycode: xkb::Keycode = (key + 8).into();

        match state.key_get_one_sym(keycode).raw() {
            keysyms::KEY_BackSpace => Some(KeyInput::Backspace),
            keysyms::KEY_Tab => Some(KeyInput::Tab { reverse: false }),
            keysyms::KEY_ISO_Left_Tab => Some(KeyInput::Tab { reverse: true }),
            keysyms::KEY_Return | keysyms::KEY_KP_Enter => Some(KeyInput::Enter),
            keysyms::KEY_Escape => Some(KeyInput::Escape),
            _ => state.key_get_utf8(keycode).chars().next().map(KeyInput::Char),
        }
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        {
            match &interface[..] {
                "wl_compositor" => {
                    let compositor = registry.bind::<wl_compositor::WlCompositor, _, _>(
                        name,
                        version.min(4),
                        qh,
                        (),
                    );
                    state.compositor = Some(compositor);
                }
                "zwlr_layer_shell_v1" => {
                    let layer_shell = registry.bind::<zwlr_layer_shell_v1::ZwlrLayerShellV1, _, _>(
                        name,
                        version.min(4),
                        qh,
                        (),
                    );
                    state.layer_shell = Some(layer_shell);
                }
                "wl_shm" => {
                    let shm = registry.bind::<wl_shm::WlShm, _, _>(name, version.min(1), qh, ());
                    state.shm = Some(shm);
                }
                "wl_seat" => {
                    let seat = registry.bind::<wl_seat::WlSeat, _, _>(
                        name,
                        version.min(5),
                        qh,
                        (),
                    );
                    state.seat = Some(seat);
                }
                _ => {}
            }
        }
    }
}

impl Dispatch<wl_compositor::WlCompositor, ()> for WaylandState {
    fn event(_: &mut Self, _: &wl_compositor::WlCompositor, _: wl_compositor::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

impl Dispatch<wl_surface::WlSurface, ()> for WaylandState {
    fn event(_: &mut Self, _: &wl_surface::WlSurface, _: wl_surface::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

impl Dispatch<wl_shm::WlShm, ()> for WaylandState {
    fn event(_: &mut Self, _: &wl_shm::WlShm, _: wl_shm::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

impl Dispatch<wl_pointer::WlPointer, ()> for WaylandState {
    fn event(
        state: &mut Self,
        pointer: &wl_pointer::WlPointer,
        event: wl_pointer::Event,
        _: &(),
        conn: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_pointer::Event::Enter { serial, surface_x, surface_y, .. } => {
                state.surface_pos = Vec2::new(surface_x as f32, surface_y as f32);
                state.set_default_cursor(conn, pointer, serial);
                state.pending_events.push(UiEvent::PointerEnter { pos: state.surface_pos });
            }
            wl_pointer::Event::Leave { .. } => {
                state.pending_events.push(UiEvent::PointerLeave);
            }
            wl_pointer::Event::Motion { surface_x, surface_y, .. } => {
                state.surface_pos = Vec2::new(surface_x as f32, surface_y as f32);
                state.pending_events.push(UiEvent::PointerMove { pos: state.surface_pos });
            }
            wl_pointer::Event::Button { button, state: btn_state, .. } => {
                if button == BTN_LEFT || button == BTN_RIGHT {
                    let ev = match btn_state {
                        WEnum::Value(wl_pointer::ButtonState::Pressed) => UiEvent::PointerDown {
                            pos: state.surface_pos,
                            button,
                        },
                        WEnum::Value(wl_pointer::ButtonState::Released) => UiEvent::PointerUp,
                        _ => return,
                    };
                    state.pending_events.push(ev);
                }
            }
            wl_pointer::Event::Axis { axis, value, .. } => {
                if let WEnum::Value(wl_pointer::Axis::VerticalScroll) = axis {
                    // Wheel up arrives as a negative value
                    let delta = if value < 0.0 { 1.0 } else { -1.0 };
                    state.pending_events.push(UiEvent::Scroll { pos: state.surface_pos, delta });
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_seat::WlSeat, ()> for WaylandState {
    fn event(
        state: &mut Self,
        seat: &wl_seat::WlSeat,
        event: wl_seat::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_seat::Event::Capabilities { capabilities: WEnum::Value(caps) } = event {
            if caps.contains(wl_seat::Capability::Pointer) && state.pointer.is_none() {
                state.pointer = Some(seat.get_pointer(qh, ()));
            }
            if caps.contains(wl_seat::Capability::Keyboard) && state.keyboard.is_none() {
                state.keyboard = Some(seat.get_keyboard(qh, ()));
            }
        }
    }
}

impl Dispatch<wl_keyboard::WlKeyboard, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _: &wl_keyboard::WlKeyboard,
        event: wl_keyboard::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            wl_keyboard::Event::Keymap { format, fd, size } => {
                if format == WEnum::Value(wl_keyboard::KeymapFormat::XkbV1) {
                    state.load_keymap(fd, size);
                } else {
                    warn!("Unsupported keymap format {:?}", format);
                }
            }
            wl_keyboard::Event::Modifiers {
                mods_depressed,
                mods_latched,
                mods_locked,
                group,
                ..
            } => {
                if let Some(xkb_state) = state.xkb_state.as_mut() {
                    xkb_state.update_mask(mods_depressed, mods_latched, mods_locked, 0, 0, group);
                }
            }
            wl_keyboard::Event::Key {
                key,
                state: WEnum::Value(wl_keyboard::KeyState::Pressed),
                ..
            } => {
                if let Some(input) = state.key_input(key) {
                    state.pending_events.push(UiEvent::Key(input));
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<zwlr_layer_shell_v1::ZwlrLayerShellV1, ()> for WaylandState {
    fn event(_: &mut Self, _: &zwlr_layer_shell_v1::ZwlrLayerShellV1, _: zwlr_layer_shell_v1::Event, _: &(), _: &Connection, _: &QueueHandle<Self>) {}
}

impl Dispatch<zwlr_layer_surface_v1::ZwlrLayerSurfaceV1, ()> for WaylandState {
    fn event(
        state: &mut Self,
        surface: &zwlr_layer_surface_v1::ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure { serial, width, height } => {
                debug!("Layer surface configured: {}x{} (serial {})", width, height, serial);
                // Zero means we keep the size we asked for
                if width > 0 && height > 0 {
                    state.pending_size = Some([width, height]);
                }
                surface.ack_configure(serial);
                state.configured = true;
            }
            zwlr_layer_surface_v1::Event::Closed => {
                info!("Layer surface closed by compositor");
                state.running = false;
            }
            _ => {}
        }
    }
}

/// Keyboard interactivity that lets the inputs receive keys without
/// grabbing the keyboard, falling back to exclusive on old compositors.
pub fn keyboard_interactivity(
    layer_shell: &zwlr_layer_shell_v1::ZwlrLayerShellV1,
) -> zwlr_layer_surface_v1::KeyboardInteractivity {
    if layer_shell.version() >= 4 {
        zwlr_layer_surface_v1::KeyboardInteractivity::OnDemand
    } else {
        zwlr_layer_surface_v1::KeyboardInteractivity::Exclusive
    }
}
