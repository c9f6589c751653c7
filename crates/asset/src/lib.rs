//! Asset loading/parsers (meshes, textures, OBJ/MTL) producing CPU-side data.
//! Every loader reads bytes through an injectable [`FileReader`].

pub mod mesh;
pub mod obj;
pub mod reader;
pub mod texture;

pub use mesh::MeshData;
pub use obj::{MaterialTextures, ObjLoadOptions, ObjMaterial, ObjScene, ObjShape, load_obj};
pub use reader::{FileReader, FsReader, MemoryReader};
pub use texture::{PixelFormat, TextureData};
