//! Software render surface, rasterizer, and frame encoders.
//!
//! The browser original drew through WebGL; here a small deterministic CPU
//! rasterizer fills an RGBA surface instead, which keeps the viewer
//! headless and its output reproducible in tests. Lighting mirrors the
//! original rig: flat ambient plus one directional light, over the mesh
//! base color, on a near-white background.

pub mod camera;

use crate::mesh::TriangleMesh;
use camera::Camera;
use glam::{Mat3, Mat4, Vec3, Vec4Swizzles};

/// Background clear color (#f5f5f5).
pub const BACKGROUND: [u8; 4] = [245, 245, 245, 255];

/// Lighting rig constants, matching the original scene setup.
const AMBIENT_INTENSITY: f32 = 0.6;
const DIRECTIONAL_INTENSITY: f32 = 0.8;
const LIGHT_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);

/// Upper bound on surface dimensions; beyond this the environment is
/// treated as incapable of rendering rather than the file being bad.
const MAX_SURFACE_DIM: u32 = 8192;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render surface unavailable at {width}x{height}")]
    SurfaceUnavailable { width: u32, height: u32 },
    #[error("failed to encode frame: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },
}

// ========================================================================
// Surface
// ========================================================================

/// RGBA8 framebuffer with a depth buffer.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    depth: Vec<f32>,
}

impl Surface {
    /// Create a surface. Failure here is the "cannot render at all" signal,
    /// distinct from any per-model load failure.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 || width > MAX_SURFACE_DIM || height > MAX_SURFACE_DIM {
            return Err(RenderError::SurfaceUnavailable { width, height });
        }
        let pixel_count = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            pixels: vec![0; pixel_count * 4],
            depth: vec![f32::INFINITY; pixel_count],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&BACKGROUND);
        }
        self.depth.fill(f32::INFINITY);
    }

    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    #[cfg(test)]
    fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.pixel_index(x, y)]
    }
}

// ========================================================================
// Rasterizer
// ========================================================================

fn edge(a: glam::Vec2, b: glam::Vec2, p: glam::Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Render one mesh under `model` through `camera` into the surface.
///
/// Gouraud-shaded, depth-tested, no backface culling: STL winding is not
/// trustworthy, so both orientations rasterize and the depth test sorts
/// out visibility.
pub fn render_mesh(surface: &mut Surface, mesh: &TriangleMesh, model: Mat4, camera: &Camera) {
    surface.clear();

    let mvp = camera.view_projection() * model;
    let normal_matrix = Mat3::from_mat4(model).inverse().transpose();
    let light_dir = LIGHT_POSITION.normalize();
    let (width, height) = (surface.width as f32, surface.height as f32);

    for tri in mesh.indices.chunks_exact(3) {
        let mut screen = [Vec3::ZERO; 3];
        let mut shade = [0.0f32; 3];
        let mut clipped = false;
        for (slot, &index) in tri.iter().enumerate() {
            let position = mesh.positions[index as usize];
            let clip = mvp * position.extend(1.0);
            if clip.w <= 1e-6 {
                // Behind the eye; framing keeps meshes in front, so
                // dropping the whole triangle is acceptable here.
                clipped = true;
                break;
            }
            let ndc = clip.xyz() / clip.w;
            screen[slot] = Vec3::new(
                (ndc.x + 1.0) * 0.5 * width,
                (1.0 - ndc.y) * 0.5 * height,
                ndc.z,
            );
            let normal = (normal_matrix * mesh.normals[index as usize]).normalize_or_zero();
            let diffuse = normal.dot(light_dir).max(0.0);
            shade[slot] = AMBIENT_INTENSITY + DIRECTIONAL_INTENSITY * diffuse;
        }
        if clipped {
            continue;
        }

        let (a, b, c) = (screen[0], screen[1], screen[2]);
        let area = edge(a.truncate(), b.truncate(), c.truncate());
        if area.abs() < 1e-8 {
            continue;
        }

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let max_x = (a.x.max(b.x).max(c.x).ceil() as u32).min(surface.width.saturating_sub(1));
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_y = (a.y.max(b.y).max(c.y).ceil() as u32).min(surface.height.saturating_sub(1));

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = glam::Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b.truncate(), c.truncate(), p);
                let w1 = edge(c.truncate(), a.truncate(), p);
                let w2 = edge(a.truncate(), b.truncate(), p);
                let inside = if area > 0.0 {
                    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
                } else {
                    w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
                };
                if !inside {
                    continue;
                }
                let (b0, b1, b2) = (w0 / area, w1 / area, w2 / area);
                let depth = b0 * a.z + b1 * b.z + b2 * c.z;
                let index = surface.pixel_index(x, y);
                if depth >= surface.depth[index] {
                    continue;
                }
                surface.depth[index] = depth;
                let intensity = (b0 * shade[0] + b1 * shade[1] + b2 * shade[2]).clamp(0.0, 1.0);
                let offset = index * 4;
                for channel in 0..3 {
                    let value = mesh.base_color[channel] * intensity;
                    surface.pixels[offset + channel] = (value * 255.0).round() as u8;
                }
                surface.pixels[offset + 3] = 255;
            }
        }
    }
}

// ========================================================================
// Encoding
// ========================================================================

/// Raster output codecs: one lossy, one lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCodec {
    Png,
    Jpeg,
}

impl ImageCodec {
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Encode the surface contents. `quality` is the 0..1 factor the host API
/// uses; it only affects the lossy codec.
pub fn encode(surface: &Surface, codec: ImageCodec, quality: f32) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    match codec {
        ImageCodec::Png => {
            use image::ImageEncoder;
            image::codecs::png::PngEncoder::new(&mut bytes)
                .write_image(
                    surface.pixels(),
                    surface.width,
                    surface.height,
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|err| RenderError::Encode { source: err })?;
        }
        ImageCodec::Jpeg => {
            // JPEG has no alpha channel.
            let rgb: Vec<u8> = surface
                .pixels()
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            let jpeg_quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, jpeg_quality);
            encoder
                .encode(&rgb, surface.width, surface.height, image::ExtendedColorType::Rgb8)
                .map_err(|err| RenderError::Encode { source: err })?;
        }
    }
    Ok(bytes)
}

/// Wrap encoded bytes as a `data:` URI, matching the original host contract.
pub fn data_uri(bytes: &[u8], codec: ImageCodec) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    format!("data:{};base64,{}", codec.mime(), STANDARD.encode(bytes))
}

// ========================================================================
// Tests
// ========================================================================
