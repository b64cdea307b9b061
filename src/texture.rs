use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use log::{debug, warn};
use parking_lot::{Condvar, Mutex};
use thiserror::Error;

use crate::material::TextureChannel;

/// Directory below the asset root holding the sand maps.
pub const SAND_TEXTURE_DIR: &str = "textures/beach";

/// Errors raised while decoding a texture file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture {path} could not be read: {reason}")]
    Io { path: String, reason: String },
    #[error("texture {path} could not be decoded: {reason}")]
    Decode { path: String, reason: String },
    #[error("texture {path} is empty")]
    Empty { path: String },
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: color.to_vec(),
        }
    }

    pub fn decode_file(path: &Path) -> Result<Self, TextureError> {
        let display = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|err| TextureError::Io {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|err| TextureError::Decode {
            path: display.clone(),
            reason: err.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { path: display });
        }
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

#[derive(Debug, Clone)]
pub enum TextureState {
    Pending,
    Ready(Arc<TextureImage>),
    Failed(TextureError),
}

#[derive(Debug)]
struct Slot {
    state: Mutex<TextureState>,
    ready: Condvar,
}

/// Shared handle to a texture that decodes in the background.
///
/// The handle is usable immediately; until decoding finishes (or if it fails)
/// the material channel it is bound to behaves as if it were absent.
#[derive(Debug, Clone)]
pub struct TextureHandle {
    path: PathBuf,
    slot: Arc<Slot>,
}

impl TextureHandle {
    fn pending(path: PathBuf) -> Self {
        Self {
            path,
            slot: Arc::new(Slot {
                state: Mutex::new(TextureState::Pending),
                ready: Condvar::new(),
            }),
        }
    }

    /// Handle whose image is already decoded.
    pub fn from_image(path: impl Into<PathBuf>, image: TextureImage) -> Self {
        let handle = Self::pending(path.into());
        handle.publish(TextureState::Ready(Arc::new(image)));
        handle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> TextureState {
        self.slot.state.lock().clone()
    }

    pub fn image(&self) -> Option<Arc<TextureImage>> {
        match &*self.slot.state.lock() {
            TextureState::Ready(image) => Some(Arc::clone(image)),
            _ => None,
        }
    }

    /// Blocks until decoding has either succeeded or failed.
    pub fn wait(&self) -> TextureState {
        let mut state = self.slot.state.lock();
        while matches!(*state, TextureState::Pending) {
            self.slot.ready.wait(&mut state);
        }
        state.clone()
    }

    /// Identity of the shared slot, stable across clones.
    pub fn key(&self) -> usize {
        Arc::as_ptr(&self.slot) as usize
    }

    fn publish(&self, state: TextureState) {
        *self.slot.state.lock() = state;
        self.slot.ready.notify_all();
    }
}

/// Loads textures relative to an asset root on background threads.
#[derive(Debug, Clone)]
pub struct TextureLoader {
    root: PathBuf,
}

impl TextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts decoding `relative` and returns immediately.
    pub fn load(&self, relative: &str) -> TextureHandle {
        let path = self.root.join(relative);
        let handle = TextureHandle::pending(path.clone());
        let worker = handle.clone();
        let spawned = thread::Builder::new()
            .name(format!("texture:{relative}"))
            .spawn(move || worker.publish(decode_or_warn(&path)));
        if let Err(err) = spawned {
            warn!("falling back to inline decode for {relative}: {err}");
            handle.publish(decode_or_warn(handle.path()));
        }
        handle
    }
}

fn decode_or_warn(path: &Path) -> TextureState {
    match TextureImage::decode_file(path) {
        Ok(image) => {
            debug!(
                "decoded {} ({}x{})",
                path.display(),
                image.width,
                image.height
            );
            TextureState::Ready(Arc::new(image))
        }
        Err(err) => {
            warn!("{err}; rendering without it");
            TextureState::Failed(err)
        }
    }
}

/// The five sand maps used by the ground material.
#[derive(Debug, Clone)]
pub struct SandTextures {
    pub color: TextureHandle,
    pub ambient_occlusion: TextureHandle,
    pub normal: TextureHandle,
    pub roughness: TextureHandle,
    pub displacement: TextureHandle,
}

impl SandTextures {
    pub const FILES: [(TextureChannel, &'static str); 5] = [
        (TextureChannel::Albedo, "sand_Color.png"),
        (TextureChannel::AmbientOcclusion, "sand_AmbientOcclusion.png"),
        (TextureChannel::Normal, "sand_NormalGL.png"),
        (TextureChannel::Roughness, "sand_Roughness.png"),
        (TextureChannel::Displacement, "sand_Displacement.png"),
    ];

    pub fn load(loader: &TextureLoader) -> Self {
        let load = |file: &str| loader.load(&format!("{SAND_TEXTURE_DIR}/{file}"));
        Self {
            color: load(Self::FILES[0].1),
            ambient_occlusion: load(Self::FILES[1].1),
            normal: load(Self::FILES[2].1),
            roughness: load(Self::FILES[3].1),
            displacement: load(Self::FILES[4].1),
        }
    }

    pub fn handles(&self) -> [(TextureChannel, &TextureHandle); 5] {
        [
            (TextureChannel::Albedo, &self.color),
            (TextureChannel::AmbientOcclusion, &self.ambient_occlusion),
            (TextureChannel::Normal, &self.normal),
            (TextureChannel::Roughness, &self.roughness),
            (TextureChannel::Displacement, &self.displacement),
        ]
    }

    /// Waits for all five loads to settle and returns the channels that failed.
    pub fn wait_all(&self) -> Vec<TextureChannel> {
        self.handles()
            .into_iter()
            .filter_map(|(channel, handle)| match handle.wait() {
                TextureState::Ready(_) => None,
                _ => Some(channel),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    static PNG_2X2: Lazy<Vec<u8>> = Lazy::new(|| {
        let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 180, 120, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    });

    #[test]
    fn loads_png_in_background() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("sand.png"), PNG_2X2.as_slice()).unwrap();
        let loader = TextureLoader::new(dir.path());
        let handle = loader.load("sand.png");
        match handle.wait() {
            TextureState::Ready(image) => {
                assert_eq!((image.width, image.height), (2, 2));
                assert_eq!(&image.pixels[..4], &[200, 180, 120, 255]);
            }
            other => panic!("unexpected state {other:?}"),
        }
        assert!(handle.image().is_some());
    }

    #[test]
    fn missing_file_fails_without_panicking() {
        let dir = TempDir::new().unwrap();
        let loader = TextureLoader::new(dir.path());
        let handle = loader.load("nope.png");
        assert!(matches!(
            handle.wait(),
            TextureState::Failed(TextureError::Io { .. })
        ));
        assert!(handle.image().is_none());
    }

    #[test]
    fn garbage_bytes_report_decode_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.png"), b"not a png").unwrap();
        let handle = TextureLoader::new(dir.path()).load("bad.png");
        assert!(matches!(
            handle.wait(),
            TextureState::Failed(TextureError::Decode { .. })
        ));
    }

    #[test]
    fn sand_set_degrades_per_channel() {
        let dir = TempDir::new().unwrap();
        let beach = dir.path().join(SAND_TEXTURE_DIR);
        std::fs::create_dir_all(&beach).unwrap();
        std::fs::write(beach.join("sand_Color.png"), PNG_2X2.as_slice()).unwrap();
        std::fs::write(beach.join("sand_Roughness.png"), PNG_2X2.as_slice()).unwrap();

        let sand = SandTextures::load(&TextureLoader::new(dir.path()));
        let failed = sand.wait_all();
        assert_eq!(
            failed,
            vec![
                TextureChannel::AmbientOcclusion,
                TextureChannel::Normal,
                TextureChannel::Displacement,
            ]
        );
        assert!(sand.color.image().is_some());
    }

    #[test]
    fn clones_share_the_same_slot() {
        let handle = TextureHandle::from_image("inline", TextureImage::solid([1, 2, 3, 4]));
        let clone = handle.clone();
        assert_eq!(handle.key(), clone.key());
        assert!(clone.image().is_some());
    }
}
