use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{Rect, Scene};
use crate::sprite_keys::validate_sprite_key;

use super::transform::logical_to_physical_rect;
use super::{Canvas, Rgba, Viewport};

const PLACEHOLDER_FILL_COLOR: Rgba = [220, 220, 240, 255];
const PLACEHOLDER_OUTLINE_COLOR: Rgba = [255, 0, 255, 255];
const PLACEHOLDER_OUTLINE_PX: i32 = 3;

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

pub(crate) struct SpriteCache {
    sprites_dir: PathBuf,
    cache: HashMap<String, Option<LoadedSprite>>,
    warned_keys: HashSet<String>,
}

impl SpriteCache {
    pub(crate) fn new(sprites_dir: PathBuf) -> Self {
        Self {
            sprites_dir,
            cache: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    fn resolve(&mut self, key: &str) -> Option<&LoadedSprite> {
        if !self.cache.contains_key(key) {
            let loaded = match resolve_sprite_image_path(&self.sprites_dir, key) {
                Ok(path) => match load_sprite_rgba(&path) {
                    Ok(sprite) => Some(sprite),
                    Err(reason) => {
                        warn_sprite_load_once(&mut self.warned_keys, key, Some(&path), &reason);
                        None
                    }
                },
                Err(reason) => {
                    warn_sprite_load_once(&mut self.warned_keys, key, None, &reason);
                    None
                }
            };
            self.cache.insert(key.to_string(), loaded);
        }
        self.cache.get(key).and_then(Option::as_ref)
    }
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    logical: Viewport,
    sprites: SpriteCache,
}

impl Renderer {
    pub fn new(window: Arc<Window>, sprites_dir: PathBuf, logical: Viewport) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            logical,
            sprites: SpriteCache::new(sprites_dir),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render_scene(&mut self, scene: &mut dyn Scene) -> Result<(), Error> {
        let frame = self.pixels.frame_mut();
        {
            let mut canvas = FrameCanvas::new(frame, self.viewport, self.logical, &mut self.sprites);
            scene.render(&mut canvas);
        }
        self.pixels.render()
    }
}

pub(crate) struct FrameCanvas<'a> {
    frame: &'a mut [u8],
    physical: Viewport,
    logical: Viewport,
    sprites: &'a mut SpriteCache,
}

impl<'a> FrameCanvas<'a> {
    pub(crate) fn new(
        frame: &'a mut [u8],
        physical: Viewport,
        logical: Viewport,
        sprites: &'a mut SpriteCache,
    ) -> Self {
        Self {
            frame,
            physical,
            logical,
            sprites,
        }
    }

    fn to_physical(&self, rect: Rect) -> Rect {
        logical_to_physical_rect(rect, self.logical, self.physical)
    }
}

impl Canvas for FrameCanvas<'_> {
    fn logical_size(&self) -> (u32, u32) {
        (self.logical.width, self.logical.height)
    }

    fn clear(&mut self, color: Rgba) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let target = self.to_physical(rect);
        fill_rect_blended(self.frame, self.physical, target, color);
    }

    fn outline_rect(&mut self, rect: Rect, thickness: i32, color: Rgba) {
        let t = thickness.max(1).min(rect.w.min(rect.h).max(1));
        let edges = [
            Rect::new(rect.x, rect.y, rect.w, t),
            Rect::new(rect.x, rect.bottom() - t, rect.w, t),
            Rect::new(rect.x, rect.y + t, t, rect.h - 2 * t),
            Rect::new(rect.right() - t, rect.y + t, t, rect.h - 2 * t),
        ];
        for edge in edges {
            self.fill_rect(edge, color);
        }
    }

    fn blit_sprite(&mut self, key: &str, rect: Rect, mirrored: bool) {
        let target = self.to_physical(rect);
        match self.sprites.resolve(key) {
            Some(sprite) => draw_sprite_stretched(self.frame, self.physical, sprite, target, mirrored),
            None => draw_placeholder(self.frame, self.physical, target),
        }
    }
}

fn resolve_sprite_image_path(sprites_dir: &Path, key: &str) -> Result<PathBuf, String> {
    validate_sprite_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(sprites_dir.join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

fn blend_pixel_rgba_clipped(frame: &mut [u8], viewport: Viewport, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
        return;
    }
    let offset = (y as usize * viewport.width as usize + x as usize) * 4;
    let Some(dst) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    let alpha = color[3] as u32;
    match alpha {
        0 => {}
        255 => dst.copy_from_slice(&color),
        _ => {
            for channel in 0..3 {
                let src = color[channel] as u32;
                let old = dst[channel] as u32;
                dst[channel] = ((src * alpha + old * (255 - alpha)) / 255) as u8;
            }
            dst[3] = 255;
        }
    }
}

fn clip_to_viewport(rect: Rect, viewport: Viewport) -> Option<(i32, i32, i32, i32)> {
    let left = rect.x.max(0);
    let top = rect.y.max(0);
    let right = rect.right().min(viewport.width as i32);
    let bottom = rect.bottom().min(viewport.height as i32);
    (left < right && top < bottom).then_some((left, top, right, bottom))
}

fn fill_rect_blended(frame: &mut [u8], viewport: Viewport, rect: Rect, color: Rgba) {
    let Some((left, top, right, bottom)) = clip_to_viewport(rect, viewport) else {
        return;
    };
    for y in top..bottom {
        for x in left..right {
            blend_pixel_rgba_clipped(frame, viewport, x, y, color);
        }
    }
}

fn draw_placeholder(frame: &mut [u8], viewport: Viewport, rect: Rect) {
    fill_rect_blended(frame, viewport, rect, PLACEHOLDER_FILL_COLOR);
    let t = PLACEHOLDER_OUTLINE_PX.min(rect.w.min(rect.h).max(1));
    for edge in [
        Rect::new(rect.x, rect.y, rect.w, t),
        Rect::new(rect.x, rect.bottom() - t, rect.w, t),
        Rect::new(rect.x, rect.y, t, rect.h),
        Rect::new(rect.right() - t, rect.y, t, rect.h),
    ] {
        fill_rect_blended(frame, viewport, edge, PLACEHOLDER_OUTLINE_COLOR);
    }
}

fn draw_sprite_stretched(
    frame: &mut [u8],
    viewport: Viewport,
    sprite: &LoadedSprite,
    target: Rect,
    mirrored: bool,
) {
    if sprite.width == 0 || sprite.height == 0 || target.is_empty() {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }
    let Some((left, top, right, bottom)) = clip_to_viewport(target, viewport) else {
        return;
    };

    let sprite_width = sprite.width as i64;
    let sprite_height = sprite.height as i64;
    for out_y in top..bottom {
        let dy = (out_y - target.y) as i64;
        let src_y = (dy * sprite_height / target.h as i64).clamp(0, sprite_height - 1);
        for out_x in left..right {
            let dx = (out_x - target.x) as i64;
            let mut src_x = (dx * sprite_width / target.w as i64).clamp(0, sprite_width - 1);
            if mirrored {
                src_x = sprite_width - 1 - src_x;
            }
            let src_offset = ((src_y * sprite_width + src_x) * 4) as usize;
            let color = [
                sprite.rgba[src_offset],
                sprite.rgba[src_offset + 1],
                sprite.rgba[src_offset + 2],
                sprite.rgba[src_offset + 3],
            ];
            blend_pixel_rgba_clipped(frame, viewport, out_x, out_y, color);
        }
    }
}
