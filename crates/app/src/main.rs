//! Demo viewer: a spinning checker (or plain white) cube, or an OBJ model,
//! under an FPS camera (WASD + mouse, Escape quits).

use std::path::PathBuf;

use anyhow::Result;
use asset::{MeshData, ObjLoadOptions};
use corelib::{Camera, Key, Vec3};
use platform::Window;
use renderer::{GlBackend, Mesh, Model, RenderContext};

#[derive(Clone, Debug, PartialEq)]
struct Args {
    width: u32,
    height: u32,
    obj: Option<PathBuf>,
    fov_deg: f32,
    bbox: bool,
    wireframe: bool,
    plain: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            obj: None,
            fov_deg: 60.0,
            bbox: false,
            wireframe: false,
            plain: false,
        }
    }
}

// Accept: --size=WxH --width=N --height=N --obj=PATH --fov=DEG --bbox --wireframe --plain
fn parse_args<I>(args: I) -> Args
where
    I: IntoIterator<Item = String>,
{
    let mut out = Args::default();

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    out.width = pw;
                    out.height = ph;
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                out.width = pw;
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                out.height = ph;
            }
        } else if let Some(v) = arg.strip_prefix("--obj=") {
            out.obj = Some(PathBuf::from(v));
        } else if let Some(v) = arg.strip_prefix("--fov=") {
            match v.parse::<f32>() {
                Ok(fov) if fov > 0.0 && fov < 180.0 => out.fov_deg = fov,
                _ => log::warn!("Ignoring field of view '{v}'"),
            }
        } else if arg == "--bbox" {
            out.bbox = true;
        } else if arg == "--wireframe" {
            out.wireframe = true;
        } else if arg == "--plain" {
            out.plain = true;
        } else {
            log::warn!("Unknown argument '{arg}'");
        }
    }

    out.width = out.width.max(1);
    out.height = out.height.max(1);
    out
}

/// Unit cube with per-vertex uvs taken from the x/y corner, so the texture
/// shows on the front and back faces. `plain` swaps the checker for white.
fn textured_cube<B: renderer::GraphicsBackend>(ctx: &mut RenderContext<B>, plain: bool) -> Result<Model> {
    let data = MeshData::unit_cube();
    let uvs = data.positions.iter().map(|p| [p[0] + 0.5, p[1] + 0.5]).collect();
    let mesh = Mesh::new(&mut ctx.backend, data.with_uvs(uvs))?;

    let texture = if plain {
        ctx.defaults.white_texture(&mut ctx.backend)?
    } else {
        ctx.defaults.checker_texture(&mut ctx.backend)?
    };
    let material = ctx.defaults.material(&mut ctx.backend)?.with_diffuse_texture(texture);
    Ok(Model::new(vec![mesh], vec![material], vec![0])?)
}

fn run(args: &Args) -> Result<()> {
    let mut window = Window::create("cg3d viewer", args.width, args.height)?;
    let (width, height) = window.size();

    let backend = GlBackend::new(window.load_gl())?;
    let mut ctx = RenderContext::new(backend, width, height);

    let mut camera = Camera::new(
        Vec3::new(0.0, 0.0, 3.0),
        args.fov_deg.to_radians(),
        0.1,
        100.0,
        &mut ctx.state,
    );

    let mut model = match &args.obj {
        Some(path) => Model::from_obj_file(&mut ctx, path, ObjLoadOptions::default())?,
        None => textured_cube(&mut ctx, args.plain)?,
    };

    if args.wireframe {
        ctx.set_fill(false)?;
    }
    window.set_cursor_captured(true);

    loop {
        if window.poll(&mut ctx.input) || ctx.input.is_down(Key::Escape) {
            break;
        }
        if let Some((w, h)) = window.take_resize() {
            ctx.resize(w, h)?;
            camera.update_projection(&mut ctx.state);
        }

        camera.update_fps(&mut ctx.input, &mut ctx.state);
        if args.obj.is_none() {
            model.rotate(Vec3::new(0.005, 0.01, 0.0));
        }

        ctx.start_render()?;
        model.draw(&mut ctx)?;
        if args.bbox {
            model.draw_bounding_box(&mut ctx)?;
        }
        window.swap();
    }

    window.set_cursor_captured(false);
    model.destroy(&mut ctx.backend);
    ctx.destroy();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(std::env::args().skip(1));
    log::info!(
        "Starting viewer: window_size={}x{}, fov={}, model={:?}, bbox={}, wireframe={}, plain={}",
        args.width,
        args.height,
        args.fov_deg,
        args.obj,
        args.bbox,
        args.wireframe,
        args.plain
    );

    if let Err(err) = run(&args) {
        log::error!("{err:#}");
        return Err(err);
    }

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
