use crate::config::Config;
use crate::host::Canvas;
use crate::map::{Grid, Tile};
use crate::pose::Pose;
use crate::texture::{Atlas, Rgb};
use glam::{Vec2, Vec3};

/// sprites closer to the eye than this are not drawn
const NEAR: f32 = 1.;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpriteKind {
    /// picked up (and switched off) when the player walks over it
    Pickup,
    /// scenery
    Light,
    /// chases the player, catching them ends the game
    Hostile,
}

/// A billboard in the world. `pos.z` is how far below eye level its base sits.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Sprite {
    pub kind: SpriteKind,
    pub active: bool,
    pub texture: usize,
    pub pos: Vec3,
}

impl Sprite {
    /// whether `point` lies within the square of half-width `radius` around the sprite
    pub fn near(&self, point: Vec2, radius: f32) -> bool {
        (self.pos.x - point.x).abs() < radius && (self.pos.y - point.y).abs() < radius
    }
}

/// What the sprite rules did during one frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Encounter {
    pub picked_up: usize,
    pub caught: bool,
}

/// Run the per-frame sprite rules: pickups, getting caught and hostile pursuit.
pub fn update(
    sprites: &mut [Sprite],
    player: Vec2,
    walls: &Grid<Tile>,
    config: &Config,
    elapsed: f32,
) -> Encounter {
    let mut encounter = Encounter::default();
    let open = |pos: Vec2| matches!(walls.at(pos, config.tile_size), Some(Tile::Empty));

    for sprite in sprites.iter_mut().filter(|sprite| sprite.active) {
        match sprite.kind {
            SpriteKind::Pickup => {
                if sprite.near(player, config.pickup_radius) {
                    log::debug!("picked up sprite at {}", sprite.pos);
                    sprite.active = false;
                    encounter.picked_up += 1;
                }
            }
            SpriteKind::Light => {}
            SpriteKind::Hostile => {
                if sprite.near(player, config.catch_radius) {
                    encounter.caught = true;
                }

                // each axis moves on its own so the chaser slides along walls
                let step = config.chase_speed * elapsed;
                let margin = config.chase_margin;
                let here = sprite.pos.truncate();
                if here.x > player.x && open(here - Vec2::new(margin, 0.)) {
                    sprite.pos.x -= step;
                }
                if here.x < player.x && open(here + Vec2::new(margin, 0.)) {
                    sprite.pos.x += step;
                }
                if here.y > player.y && open(here - Vec2::new(0., margin)) {
                    sprite.pos.y -= step;
                }
                if here.y < player.y && open(here + Vec2::new(0., margin)) {
                    sprite.pos.y += step;
                }
            }
        }
    }

    encounter
}

/// A sprite placed in screen space. Columns and rows are counted in slice-sized blocks.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Projected {
    /// centre column
    pub column: f32,
    /// row of the sprite's base
    pub base: f32,
    /// view-space depth
    pub depth: f32,
    /// edge length in blocks
    pub scale: i32,
}

pub fn project(sprite: &Sprite, pose: &Pose, config: &Config) -> Option<Projected> {
    let view = pose.to_view(sprite.pos.truncate());
    if view.y < NEAR {
        return None;
    }

    let columns = config.columns() as f32;
    let rows = config.rows() as f32;
    let focal = (columns / 2.) / (config.fov / 2.).to_radians().tan();
    // sprites are half a tile tall, projected like walls
    let scale = (config.tile_size / 2.) * rows / view.y;

    Some(Projected {
        column: view.x * focal / view.y + columns / 2.,
        base: sprite.pos.z * rows / view.y + rows / 2.,
        depth: view.y,
        scale: (scale as i32).clamp(0, columns as i32),
    })
}

/// Rasterize one sprite, testing every block against the wall depth of its column.
/// Returns the number of blocks drawn.
pub fn draw(
    sprite: &Sprite,
    projected: &Projected,
    atlas: &Atlas,
    depth: &[f32],
    config: &Config,
    canvas: &mut impl Canvas,
) -> usize {
    let scale = projected.scale;
    if scale <= 0 {
        return 0;
    }

    let block = config.slice_width as i32;
    let size = atlas.size() as f32;
    let x_step = (size - 0.5) / scale as f32;
    let y_step = size / scale as f32;
    // a sprite entirely off screen still walks its columns, but never past the buffer
    let columns = depth.len() as f32;
    let left = (projected.column - scale as f32 / 2.).clamp(-(scale as f32), columns) as i32;

    let mut drawn = 0;
    let mut tex_x = 0.;
    for x in left..left + scale {
        let visible = usize::try_from(x)
            .ok()
            .and_then(|column| depth.get(column))
            .is_some_and(|wall| projected.depth < *wall);

        if visible {
            let mut tex_y = size - 1.;
            for y in 0..scale {
                let color = atlas.texel(sprite.texture, tex_x as usize, tex_y as usize);
                if color != Rgb::TRANSPARENT {
                    let row = ((projected.base - y as f32) * block as f32) as i32;
                    canvas.fill_rect(x * block, row, block as u32, block as u32, color);
                    drawn += 1;
                }
                tex_y = (tex_y - y_step).max(0.);
            }
        }
        tex_x += x_step;
    }

    drawn
}

/// Draw every active sprite, farthest first. Returns the number of blocks drawn.
pub fn draw_all(
    sprites: &[Sprite],
    pose: &Pose,
    atlas: &Atlas,
    depth: &[f32],
    config: &Config,
    canvas: &mut impl Canvas,
) -> usize {
    let mut visible = sprites
        .iter()
        .filter(|sprite| sprite.active)
        .filter_map(|sprite| Some((sprite, project(sprite, pose, config)?)))
        .collect::<Vec<_>>();
    visible.sort_by(|(_, a), (_, b)| b.depth.total_cmp(&a.depth));

    visible
        .iter()
        .map(|(sprite, projected)| draw(sprite, projected, atlas, depth, config, canvas))
        .sum()
}
