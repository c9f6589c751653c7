use asset::{FileReader, FsReader};
use corelib::{InputState, RenderState};

use crate::backend::GraphicsBackend;
use crate::defaults::Defaults;
use crate::error::RenderResult;

pub const CLEAR_COLOR: [f32; 4] = [0.1, 0.1, 0.12, 1.0];

/// Everything a frame needs: the backend, view/projection and window
/// size, the input snapshot, shared defaults and the file reader used by
/// asset loads.
///
/// Passed explicitly to the camera and to every draw call. Several
/// contexts can coexist, each with its own backend.
pub struct RenderContext<B: GraphicsBackend> {
    pub backend: B,
    pub state: RenderState,
    pub input: InputState,
    pub defaults: Defaults,
    pub(crate) file_reader: Box<dyn FileReader>,
}

impl<B: GraphicsBackend> RenderContext<B> {
    pub fn new(backend: B, width: u32, height: u32) -> Self {
        Self {
            backend,
            state: RenderState::new(width, height),
            input: InputState::new(),
            defaults: Defaults::new(),
            file_reader: Box::new(FsReader),
        }
    }

    #[inline]
    pub fn file_reader(&self) -> &dyn FileReader {
        self.file_reader.as_ref()
    }

    /// Routes every subsequent asset read through `reader`.
    pub fn set_file_reader(&mut self, reader: impl FileReader + 'static) {
        self.file_reader = Box::new(reader);
    }

    /// Back to reading from the local filesystem.
    pub fn reset_file_reader(&mut self) {
        self.file_reader = Box::new(FsReader);
    }

    /// `false` switches to wireframe.
    pub fn set_fill(&mut self, fill: bool) -> RenderResult<()> {
        self.backend.polygon_mode(fill)?;
        self.state.fill = fill;
        Ok(())
    }

    #[inline]
    pub fn fill(&self) -> bool {
        self.state.fill
    }

    /// Sets the viewport to the window and clears colour and depth.
    pub fn start_render(&mut self) -> RenderResult<()> {
        self.backend.viewport(self.state.width, self.state.height)?;
        self.backend.clear(CLEAR_COLOR)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        log::debug!("Resize to {width}x{height}");
        self.state.resize(width, height);
        self.backend.viewport(self.state.width, self.state.height)
    }

    /// Releases the shared defaults and hands the backend back.
    pub fn destroy(mut self) -> B {
        self.defaults.destroy(&mut self.backend);
        self.backend
    }
}
