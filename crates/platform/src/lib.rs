//! Platform layer: SDL2 window, OpenGL 3.3 core context and input polling.
//!
//! Design goals:
//! - One window, one context, current on the creating thread.
//! - Events are folded into an [`InputState`] snapshot; nothing is queued.
//! - Resize and close are reported, not acted on.

use anyhow::{Result, anyhow};
use corelib::{InputState, Key, Vec2};
use sdl2::{
    event::{Event, WindowEvent},
    keyboard::Scancode,
    video::{GLContext, GLProfile},
};

// Fields drop in order: the context goes before its window.
pub struct Window {
    _gl_context: GLContext,
    window: sdl2::video::Window,
    events: sdl2::EventPump,
    video: sdl2::VideoSubsystem,
    sdl: sdl2::Sdl,
    resized: Option<(u32, u32)>,
}

impl Window {
    /// Opens a resizable window with a double-buffered GL 3.3 core context
    /// and makes the context current.
    pub fn create(title: &str, width: u32, height: u32) -> Result<Self> {
        let sdl = sdl2::init().map_err(|e| anyhow!("Failed to init SDL2: {e}"))?;
        let video = sdl.video().map_err(|e| anyhow!("Failed to init SDL2 video: {e}"))?;

        {
            let gl_attr = video.gl_attr();
            gl_attr.set_context_profile(GLProfile::Core);
            gl_attr.set_context_version(3, 3);
            gl_attr.set_depth_size(24);
            gl_attr.set_double_buffer(true);
        }

        let window = video
            .window(title, width, height)
            .opengl()
            .resizable()
            .position_centered()
            .build()
            .map_err(|e| anyhow!("Failed to create window: {e}"))?;

        let gl_context = window
            .gl_create_context()
            .map_err(|e| anyhow!("Failed to create GL context: {e}"))?;
        window
            .gl_make_current(&gl_context)
            .map_err(|e| anyhow!("Failed to make GL context current: {e}"))?;
        if let Err(e) = video.gl_set_swap_interval(1) {
            log::warn!("VSync unavailable: {e}");
        }

        let events = sdl
            .event_pump()
            .map_err(|e| anyhow!("Failed to get SDL event pump: {e}"))?;

        let (w, h) = window.size();
        log::info!("Window created: {w}x{h}, OpenGL 3.3 core");

        Ok(Self {
            sdl,
            video,
            window,
            _gl_context: gl_context,
            events,
            resized: None,
        })
    }

    /// Function loader for the current context.
    pub fn load_gl(&self) -> glow::Context {
        unsafe {
            glow::Context::from_loader_function(|name| self.video.gl_get_proc_address(name) as *const _)
        }
    }

    /// Drains pending events into `input`. Returns `true` once the window
    /// has been asked to close.
    pub fn poll(&mut self, input: &mut InputState) -> bool {
        let mut should_close = false;
        for event in self.events.poll_iter() {
            match event {
                Event::Quit { .. } => {
                    log::info!("Close requested");
                    should_close = true;
                }
                Event::KeyDown {
                    scancode: Some(sc), ..
                } => {
                    if let Some(key) = map_scancode(sc) {
                        input.set_key(key, true);
                    }
                }
                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    if let Some(key) = map_scancode(sc) {
                        input.set_key(key, false);
                    }
                }
                Event::MouseMotion { x, y, xrel, yrel, .. } => {
                    input.set_mouse_position(Vec2::new(x as f32, y as f32));
                    input.add_mouse_delta(Vec2::new(xrel as f32, yrel as f32));
                }
                Event::Window {
                    win_event: WindowEvent::SizeChanged(w, h),
                    ..
                } => {
                    log::info!("Resized: {w}x{h}");
                    self.resized = Some((w.max(1) as u32, h.max(1) as u32));
                }
                _ => {}
            }
        }
        should_close
    }

    /// New drawable size since the last call, if the window was resized.
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        self.resized.take()
    }

    pub fn swap(&self) {
        self.window.gl_swap_window();
    }

    /// Hides the cursor and reports unbounded relative motion.
    pub fn set_cursor_captured(&self, captured: bool) {
        self.sdl.mouse().set_relative_mouse_mode(captured);
    }

    pub fn size(&self) -> (u32, u32) {
        self.window.size()
    }
}

fn map_scancode(sc: Scancode) -> Option<Key> {
    Some(match sc {
        Scancode::W => Key::W,
        Scancode::A => Key::A,
        Scancode::S => Key::S,
        Scancode::D => Key::D,
        Scancode::Q => Key::Q,
        Scancode::E => Key::E,
        Scancode::Space => Key::Space,
        Scancode::LShift => Key::LeftShift,
        Scancode::Escape => Key::Escape,
        _ => return None,
    })
}
