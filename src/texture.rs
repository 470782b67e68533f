use crate::config::Config;
use crate::pose::{direction, Pose};
use crate::ray::{Orientation, RayHit};
use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const VERY_DARK_GREY: Rgb = Rgb::new(64, 64, 64);
    pub const GREY: Rgb = Rgb::new(192, 192, 192);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const CYAN: Rgb = Rgb::new(0, 255, 255);
    /// sprite colour key, never drawn
    pub const TRANSPARENT: Rgb = Rgb::new(255, 0, 255);
    /// drawn wherever a texture lookup has nothing to show
    pub const MISSING: Rgb = Rgb::new(255, 0, 128);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// darken (or brighten) by a shading factor
    pub fn scale(self, factor: f32) -> Self {
        let channel = |c: u8| (c as f32 * factor).clamp(0., 255.) as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }
}

fn rgb_at(data: &[u8], offset: usize) -> Option<Rgb> {
    data.get(offset..offset + 3)
        .map(|px| Rgb::new(px[0], px[1], px[2]))
}

/// Square textures of one fixed size stored back to back as interleaved RGB triples.
#[derive(Clone, PartialEq, Debug)]
pub struct Atlas {
    size: usize,
    data: Vec<u8>,
}

impl Atlas {
    pub fn new(size: usize, data: Vec<u8>) -> anyhow::Result<Self> {
        let stride = size * size * 3;
        if stride == 0 || data.is_empty() || data.len() % stride != 0 {
            anyhow::bail!(
                "{} bytes do not hold whole {size}x{size} rgb textures",
                data.len()
            );
        }
        Ok(Self { size, data })
    }

    /// edge length of every texture
    pub fn size(&self) -> usize {
        self.size
    }

    /// number of textures
    pub fn len(&self) -> usize {
        self.data.len() / (self.size * self.size * 3)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn texel(&self, index: usize, col: usize, row: usize) -> Rgb {
        if col >= self.size || row >= self.size || index >= self.len() {
            log::trace!("texel {col},{row} of texture {index} is out of range");
            return Rgb::MISSING;
        }
        rgb_at(
            &self.data,
            (row * self.size + col) * 3 + index * (self.size * self.size * 3),
        )
        .unwrap_or(Rgb::MISSING)
    }

    /// Checkered stand-in textures, one palette colour each.
    pub fn generated(count: usize, size: usize) -> Self {
        let check = (size / 4).max(1);
        let mut data = Vec::with_capacity(count * size * size * 3);
        for index in 0..count {
            let base = palette(index);
            for row in 0..size {
                for col in 0..size {
                    let texel = if (row / check + col / check) % 2 == 0 {
                        base
                    } else {
                        base.scale(0.6)
                    };
                    data.extend([texel.r, texel.g, texel.b]);
                }
            }
        }
        Self { size, data }
    }

    /// Stand-in sprites: a filled disc on the transparent colour key.
    pub fn generated_sprites(count: usize, size: usize) -> Self {
        let radius = size as f32 / 2.;
        let mut data = Vec::with_capacity(count * size * size * 3);
        for index in 0..count {
            let base = palette(index + 3);
            for row in 0..size {
                for col in 0..size {
                    let offset = Vec2::new(col as f32 + 0.5, row as f32 + 0.5) - radius;
                    let texel = if offset.length() <= radius {
                        base
                    } else {
                        Rgb::TRANSPARENT
                    };
                    data.extend([texel.r, texel.g, texel.b]);
                }
            }
        }
        Self { size, data }
    }
}

fn palette(index: usize) -> Rgb {
    const COLORS: [Rgb; 6] = [
        Rgb::new(200, 200, 200),
        Rgb::new(170, 90, 60),
        Rgb::new(90, 140, 200),
        Rgb::new(150, 110, 70),
        Rgb::new(220, 200, 60),
        Rgb::new(90, 170, 90),
    ];
    COLORS[index % COLORS.len()]
}

/// A single RGB picture of arbitrary size (sky band, full screen art).
#[derive(Clone, PartialEq, Debug)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    data: Vec<u8>,
}

impl Image {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> anyhow::Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height * 3 {
            anyhow::bail!(
                "{} bytes do not make a {width}x{height} rgb image",
                data.len()
            );
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        if x >= self.width || y >= self.height {
            return Rgb::MISSING;
        }
        rgb_at(&self.data, (y * self.width + x) * 3).unwrap_or(Rgb::MISSING)
    }

    /// vertical blend from `top` to `bottom`
    pub fn gradient(width: usize, height: usize, top: Rgb, bottom: Rgb) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            let t = y as f32 / height.saturating_sub(1).max(1) as f32;
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
            let texel = Rgb::new(mix(top.r, bottom.r), mix(top.g, bottom.g), mix(top.b, bottom.b));
            for _ in 0..width {
                data.extend([texel.r, texel.g, texel.b]);
            }
        }
        Self {
            width: width.max(1),
            height: height.max(1),
            data,
        }
    }
}

fn texel_coord(world: f32, config: &Config) -> usize {
    let size = config.texture_size as f32;
    ((world * size / config.tile_size).floor() as i64).rem_euclid(size as i64) as usize
}

/// Texture column for a wall hit. Faces struck by rays heading south or west are mirrored so
/// both sides of a wall read the same way.
pub fn wall_column(hit: &RayHit, config: &Config) -> usize {
    let (coord, mirrored) = match hit.orientation {
        Orientation::Horizontal => (hit.point.x, hit.angle > 180.),
        Orientation::Vertical => (hit.point.y, 90. < hit.angle && hit.angle < 270.),
    };
    let column = texel_coord(coord, config);
    if mirrored {
        config.texture_size - 1 - column
    } else {
        column
    }
}

/// texture row for a fractional row position inside a slice
pub fn wall_row(tex_y: f32, config: &Config) -> usize {
    (tex_y.max(0.) as usize).min(config.texture_size - 1)
}

/// Invert the floor projection: the world point seen `row_offset` pixels below the horizon
/// along the ray at `angle`. `defish` is the cosine of the ray's angle off the view axis.
/// The ceiling uses the same point, mirrored above the horizon.
pub fn floor_point(
    pose: &Pose,
    angle: f32,
    row_offset: f32,
    defish: f32,
    config: &Config,
) -> Option<Vec2> {
    if row_offset <= 0. || defish <= 0. {
        return None;
    }
    let eye_height = config.tile_size / 2.;
    let distance = eye_height * config.screen_height as f32 / row_offset / defish;
    Some(pose.pos + direction(angle) * distance)
}

/// texture column and row of a floor or ceiling point
pub fn surface_texel(point: Vec2, config: &Config) -> (usize, usize) {
    (texel_coord(point.x, config), texel_coord(point.y, config))
}

/// Sky texture column for screen block `x`; the sky pans with the heading and repeats every
/// field of view.
pub fn sky_column(heading: f32, x: usize, sky_width: usize, fov: f32) -> usize {
    let per_degree = (sky_width as f32 / fov).max(1.) as i64;
    (heading as i64 * per_degree - x as i64).rem_euclid(sky_width.max(1) as i64) as usize
}
