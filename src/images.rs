// images.rs — panel pictures decoded off the render thread

use crate::gallery::{PanelDescriptor, PanelId};
use image::io::Reader as ImageReader;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub fn decode_file(path: &Path) -> Result<image::RgbaImage, ImageLoadError> {
    let file = File::open(path).map_err(|source| ImageLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let img = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|r| r.decode())
        .map_err(|source| ImageLoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(img.to_rgba8())
}

/// Relative asset paths are looked up next to the executable first.
fn resolve(uri: &str) -> PathBuf {
    let rel = PathBuf::from(uri);
    if rel.is_absolute() {
        return rel;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join(&rel);
            if p.exists() {
                return p;
            }
        }
    }
    rel
}

pub enum ImageSlot {
    Loading,
    Ready(egui::TextureHandle),
    Missing,
}

type Loaded = (PanelId, Result<image::RgbaImage, ImageLoadError>);

pub struct PanelImages {
    tx: Sender<Loaded>,
    rx: Receiver<Loaded>,
    slots: HashMap<PanelId, ImageSlot>,
}

impl PanelImages {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            slots: HashMap::new(),
        }
    }

    /// Starts decoding the panel's picture unless it was requested before.
    pub fn request(&mut self, panel: &PanelDescriptor) {
        if self.slots.contains_key(&panel.id) {
            return;
        }
        let Some(uri) = panel.image.as_deref() else {
            self.slots.insert(panel.id, ImageSlot::Missing);
            return;
        };

        self.slots.insert(panel.id, ImageSlot::Loading);
        let path = resolve(uri);
        let id = panel.id;
        let tx = self.tx.clone();
        thread::spawn(move || {
            log::debug!("decoding {} for panel {}", path.display(), id);
            if tx.send((id, decode_file(&path))).is_err() {
                log::warn!("image for panel {} arrived after shutdown", id);
            }
        });
    }

    /// Moves finished decodes into egui textures. Call once per frame.
    pub fn poll(&mut self, ctx: &egui::Context) {
        while let Ok((id, result)) = self.rx.try_recv() {
            let slot = match result {
                Ok(rgba) => {
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    log::info!("panel {} image {}x{}", id, size[0], size[1]);
                    let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                    ImageSlot::Ready(ctx.load_texture(
                        format!("panel-{id}"),
                        color,
                        egui::TextureOptions::LINEAR,
                    ))
                }
                Err(e) => {
                    log::warn!("{}", e);
                    ImageSlot::Missing
                }
            };
            self.slots.insert(id, slot);
        }
    }

    pub fn get(&self, id: PanelId) -> Option<&ImageSlot> {
        self.slots.get(&id)
    }
}
