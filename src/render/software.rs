//! CPU implementation of [`GpuSurface`].
//!
//! Keeps a mirror of the atlas texture and composites submitted frames on a
//! worker thread, the way a GPU queue would: submission returns at once and
//! the frame's [`FrameCompletion`] is signalled when compositing finishes.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use image::{Rgba, RgbaImage};

use super::{FrameCompletion, GpuSurface, SurfaceError};
use crate::atlas::{PixelRect, Sprite};

/// Largest frame side, in pixels.
const MAX_FRAME_SIDE: f32 = 8192.0;

#[derive(Debug)]
struct Shared {
    texture: Mutex<RgbaImage>,
    frame: Mutex<Option<RgbaImage>>,
    presented: Mutex<u64>,
}

struct Job {
    sprites: Vec<Sprite>,
    resolution: [f32; 2],
    completion: FrameCompletion,
}

/// Cheaply cloneable handle to a software texture and compositor.
#[derive(Debug, Clone)]
pub struct SoftwareSurface {
    shared: Arc<Shared>,
    jobs: Sender<Job>,
    scale: f32,
}

impl SoftwareSurface {
    /// Create a surface with a transparent `width × height` texture.
    /// Frames are rendered at `scale` pixels per point.
    ///
    /// # Errors
    ///
    /// Returns an error if the compositor thread cannot be started.
    pub fn new(width: u32, height: u32, scale: f32) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            texture: Mutex::new(RgbaImage::new(width, height)),
            frame: Mutex::new(None),
            presented: Mutex::new(0),
        });
        let (jobs, rx) = mpsc::channel::<Job>();
        let worker = Arc::clone(&shared);
        thread::Builder::new()
            .name("typewriter-compositor".into())
            .spawn(move || {
                // Ends once every surface handle is gone.
                for job in rx {
                    let frame = {
                        let texture = lock(&worker.texture);
                        composite(&texture, &job.sprites, job.resolution, scale)
                    };
                    *lock(&worker.frame) = Some(frame);
                    *lock(&worker.presented) += 1;
                    job.completion.signal();
                }
                tracing::debug!("compositor thread exiting");
            })?;
        Ok(Self {
            shared,
            jobs,
            scale,
        })
    }

    /// The most recently presented frame.
    pub fn latest_frame(&self) -> Option<RgbaImage> {
        lock(&self.shared.frame).clone()
    }

    /// Number of frames composited so far.
    pub fn presented(&self) -> u64 {
        *lock(&self.shared.presented)
    }

    /// Copy of the texture mirror.
    pub fn texture(&self) -> RgbaImage {
        lock(&self.shared.texture).clone()
    }

    pub const fn scale(&self) -> f32 {
        self.scale
    }
}

impl GpuSurface for SoftwareSurface {
    fn upload(&self, rect: PixelRect, pixels: &[u8], bytes_per_row: usize) {
        let mut texture = lock(&self.shared.texture);
        let row_bytes = rect.width as usize * 4;
        for row in 0..rect.height {
            let start = row as usize * bytes_per_row;
            let Some(line) = pixels.get(start..start + row_bytes) else {
                break;
            };
            for (column, texel) in line.chunks_exact(4).enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let x = rect.x + column as u32;
                let y = rect.y + row;
                if x < texture.width() && y < texture.height() {
                    texture.put_pixel(x, y, Rgba([texel[0], texel[1], texel[2], texel[3]]));
                }
            }
        }
    }

    fn submit_frame(
        &self,
        sprites: &[Sprite],
        resolution: [f32; 2],
        completion: FrameCompletion,
    ) -> Result<(), SurfaceError> {
        let [width, height] = resolution;
        let valid = |side: f32| side.is_finite() && side >= 0.0 && side * self.scale <= MAX_FRAME_SIDE;
        if !valid(width) || !valid(height) {
            return Err(SurfaceError::Resolution { width, height });
        }
        self.jobs
            .send(Job {
                sprites: sprites.to_vec(),
                resolution,
                completion,
            })
            .map_err(|_| SurfaceError::Disconnected)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Draw sprites in order over an opaque black target.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn composite(texture: &RgbaImage, sprites: &[Sprite], resolution: [f32; 2], scale: f32) -> RgbaImage {
    let width = (resolution[0] * scale).ceil() as u32;
    let height = (resolution[1] * scale).ceil() as u32;
    let mut target = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    let (tex_w, tex_h) = (texture.width() as f32, texture.height() as f32);

    for sprite in sprites {
        // Unclipped edges drive texture mapping; the clipped ones bound the loop.
        let left = (sprite.position[0] * scale).round();
        let top = (sprite.position[1] * scale).round();
        let right = ((sprite.position[0] + sprite.size[0]) * scale).round();
        let bottom = ((sprite.position[1] + sprite.size[1]) * scale).round();
        let span = [right - left, bottom - top];
        let x0 = left.max(0.0) as u32;
        let y0 = top.max(0.0) as u32;
        let x1 = (right.max(0.0) as u32).min(width);
        let y1 = (bottom.max(0.0) as u32).min(height);
        if x0 >= x1 || y0 >= y1 {
            continue;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                let source = if sprite.is_textured() {
                    let u = sprite.uv_origin[0] + (x as f32 - left + 0.5) / span[0] * sprite.uv_size[0];
                    let v = sprite.uv_origin[1] + (y as f32 - top + 0.5) / span[1] * sprite.uv_size[1];
                    let tx = ((u * tex_w) as u32).min(texture.width().saturating_sub(1));
                    let ty = ((v * tex_h) as u32).min(texture.height().saturating_sub(1));
                    let texel = texture.get_pixel(tx, ty).0;
                    [
                        f32::from(texel[0]) / 255.0 * sprite.color[0],
                        f32::from(texel[1]) / 255.0 * sprite.color[1],
                        f32::from(texel[2]) / 255.0 * sprite.color[2],
                        f32::from(texel[3]) / 255.0 * sprite.color[3],
                    ]
                } else {
                    let a = sprite.color[3];
                    [
                        sprite.color[0] * a,
                        sprite.color[1] * a,
                        sprite.color[2] * a,
                        a,
                    ]
                };
                blend_over(target.get_pixel_mut(x, y), source);
            }
        }
    }
    target
}

/// Premultiplied source-over.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend_over(dst: &mut Rgba<u8>, src: [f32; 4]) {
    let keep = 1.0 - src[3].clamp(0.0, 1.0);
    for (channel, value) in dst.0.iter_mut().zip(src) {
        let mixed = value.clamp(0.0, 1.0).mul_add(255.0, f32::from(*channel) * keep);
        *channel = mixed.round().clamp(0.0, 255.0) as u8;
    }
}
