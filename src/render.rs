use crate::config::Config;
use crate::host::{Assets, Canvas};
use crate::map::{Level, Tile};
use crate::pose::Pose;
use crate::project::project;
use crate::ray::{cast_ray, column_angles, Orientation, RayHit};
use crate::sprite;
use crate::texture::{floor_point, sky_column, surface_texel, wall_column, wall_row, Image, Rgb};

/// Compose the 3D view: sky, textured walls, floor and ceiling, then sprites.
///
/// `depth` is rebuilt with one perpendicular wall distance per ray column before any sprite
/// is drawn. Returns the hit of every column, leftmost first.
pub fn scene(
    level: &Level,
    pose: &Pose,
    depth: &mut Vec<f32>,
    assets: &Assets,
    canvas: &mut impl Canvas,
) -> Vec<Option<RayHit>> {
    let config = &level.config;
    canvas.fill_rect(
        0,
        0,
        config.frame_width() as u32,
        config.screen_height as u32,
        Rgb::VERY_DARK_GREY,
    );
    sky(pose, &assets.sky, config, canvas);

    depth.clear();
    depth.resize(config.columns(), f32::INFINITY);

    let hits = column_angles(pose, config)
        .map(|(column, angle)| {
            let hit = cast_ray(pose, angle, &level.walls, config);
            depth[column] = draw_column(level, pose, column, angle, hit.as_ref(), assets, canvas);
            hit
        })
        .collect();

    sprite::draw_all(&level.sprites, pose, &assets.sprites, depth, config, canvas);

    hits
}

/// Draw one ray column and return its perpendicular wall distance.
fn draw_column(
    level: &Level,
    pose: &Pose,
    column: usize,
    angle: f32,
    hit: Option<&RayHit>,
    assets: &Assets,
    canvas: &mut impl Canvas,
) -> f32 {
    let config = &level.config;
    let width = config.slice_width as u32;
    let x = (column * config.slice_width) as i32;
    let screen = config.screen_height;
    let horizon = screen / 2;
    let offset = pose.angle - angle;

    let (distance, floor_start) = match hit {
        Some(hit) => {
            let slice = project(hit.distance, offset, config);
            let shade = match hit.orientation {
                Orientation::Vertical => config.vertical_shade,
                Orientation::Horizontal => config.horizontal_shade,
            };
            let tex_x = wall_column(hit, config);
            let top = slice.top as i32;
            let mut tex_y = slice.tex_start;
            for y in 0..slice.height as i32 {
                let color = assets
                    .walls
                    .texel(hit.material.texture, tex_x, wall_row(tex_y, config))
                    .scale(shade);
                canvas.fill_rect(x, top + y, width, 1, color);
                tex_y += slice.tex_step;
            }
            (slice.distance, (slice.top + slice.height) as usize)
        }
        None => (f32::INFINITY, horizon),
    };

    // work down from the bottom of the wall, mirroring each floor row onto the ceiling
    let defish = offset.to_radians().cos();
    for y in floor_start.max(horizon + 1)..screen {
        let Some(point) = floor_point(pose, angle, (y - horizon) as f32, defish, config) else {
            continue;
        };
        let (col, row) = level.cell_of(point);
        let (tex_x, tex_y) = surface_texel(point, config);

        if let Some(Some(floor)) = level.floor.get(col, row) {
            let color = assets
                .walls
                .texel(floor.texture, tex_x, tex_y)
                .scale(config.floor_shade);
            canvas.fill_rect(x, y as i32, width, 1, color);
        }
        // open ceilings let the sky show through
        if let Some(Some(ceiling)) = level.ceiling.get(col, row) {
            let color = assets.walls.texel(ceiling.texture, tex_x, tex_y);
            canvas.fill_rect(x, (screen - y) as i32, width, 1, color);
        }
    }

    distance
}

/// Sky band across the top half, panning with the heading.
fn sky(pose: &Pose, sky: &Image, config: &Config, canvas: &mut impl Canvas) {
    let block = config.slice_width;
    let rows = sky.height.min(config.rows() / 2);
    for y in 0..rows {
        for x in 0..config.columns() {
            let color = sky.pixel(sky_column(pose.angle, x, sky.width, config.fov), y);
            canvas.fill_rect(
                (x * block) as i32,
                (y * block) as i32,
                block as u32,
                block as u32,
                color,
            );
        }
    }
}

/// Top-down overview of the level drawn over the view: tiles, sprites, the player and
/// where each ray struck.
pub fn overview(
    level: &Level,
    pose: &Pose,
    hits: &[Option<RayHit>],
    goal: (i32, i32),
    canvas: &mut impl Canvas,
) {
    let config = &level.config;
    let walls = &level.walls;
    let cell = ((config.screen_height / 3) / walls.width.max(walls.height)).max(4) as i32;
    let margin = 8;
    let scale = cell as f32 / config.tile_size;
    let to_screen = |x: f32, y: f32| (margin + (x * scale) as i32, margin + (y * scale) as i32);

    for ((col, row), tile) in walls.iter() {
        let color = match tile {
            _ if (col as i32, row as i32) == goal => Rgb::GREEN,
            Tile::Empty => Rgb::BLACK,
            Tile::Wall(_) => Rgb::WHITE,
            Tile::Door(_) => Rgb::GREY,
        };
        canvas.fill_rect(
            margin + col as i32 * cell + 1,
            margin + row as i32 * cell + 1,
            (cell - 2) as u32,
            (cell - 2) as u32,
            color,
        );
    }

    for hit in hits.iter().flatten() {
        let (x, y) = to_screen(hit.point.x, hit.point.y);
        canvas.draw_pixel(x, y, Rgb::YELLOW);
    }

    for sprite in level.sprites.iter().filter(|sprite| sprite.active) {
        let (x, y) = to_screen(sprite.pos.x, sprite.pos.y);
        canvas.fill_rect(x - 1, y - 1, 3, 3, Rgb::RED);
    }

    let (x, y) = to_screen(pose.pos.x, pose.pos.y);
    canvas.fill_rect(x - 2, y - 2, 4, 4, Rgb::YELLOW);
    let facing = pose.direction() * 8.;
    for step in 1..=8 {
        let t = step as f32 / 8.;
        canvas.draw_pixel(x + (facing.x * t) as i32, y + (facing.y * t) as i32, Rgb::YELLOW);
    }
}

/// Full-screen picture faded in by `fade` (0 = black, 1 = full brightness). Without a
/// picture the screen is filled with `tint`.
pub fn screen(image: Option<&Image>, tint: Rgb, fade: f32, config: &Config, canvas: &mut impl Canvas) {
    let width = config.frame_width();
    let height = config.screen_height;
    let fade = fade.clamp(0., 1.);

    match image {
        Some(image) => {
            for y in 0..height {
                for x in 0..width {
                    let color = image.pixel(x * image.width / width, y * image.height / height);
                    canvas.draw_pixel(x as i32, y as i32, color.scale(fade));
                }
            }
        }
        None => canvas.fill_rect(0, 0, width as u32, height as u32, tint.scale(fade)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Framebuffer;
    use glam::Vec2;

    #[test]
    fn depth_buffer_covers_every_column() {
        let level = Level::builtin().unwrap();
        let assets = Assets::generated(&level.config);
        let mut fb = Framebuffer::new(level.config.frame_width(), level.config.screen_height);
        let mut depth = vec![0.; 3];

        let hits = scene(&level, &level.start, &mut depth, &assets, &mut fb);
        assert_eq!(depth.len(), level.config.columns());
        assert_eq!(hits.len(), level.config.columns());
        for (column, hit) in hits.iter().enumerate() {
            match hit {
                Some(hit) => assert!(depth[column] <= hit.distance + 1e-3),
                None => assert_eq!(depth[column], f32::INFINITY),
            }
        }
    }

    #[test]
    fn walls_are_centred_on_the_horizon() {
        let level = Level::builtin().unwrap();
        let assets = Assets::generated(&level.config);
        let mut fb = Framebuffer::new(level.config.frame_width(), level.config.screen_height);
        let mut depth = vec![];
        scene(&level, &level.start, &mut depth, &assets, &mut fb);

        // the middle column sees a wall, never the dark background, at the horizon
        let x = level.config.frame_width() / 2;
        let y = level.config.screen_height / 2;
        assert_ne!(fb.pixel(x, y), Some(Rgb::VERY_DARK_GREY));
    }

    const GALLERY: &str = "\
!!!!WALLS
#0

##########
#........#
##########

!!!!FLOOR
f1

ffffffffff
ffff......
ffffffffff

!!!!CEILING
c2

..........
cccc......
..........

!!!!PLAYER
start,x=96,y=96,angle=0
goal,col=8,row=1
";

    #[test]
    fn floor_and_ceiling_follow_their_grids() {
        let level = Level::parse(GALLERY).unwrap();
        let config = &level.config;
        let assets = Assets::generated(config);
        let mut fb = Framebuffer::new(config.frame_width(), config.screen_height);
        let mut depth = vec![];
        scene(&level, &level.start, &mut depth, &assets, &mut fb);

        // the middle column looks straight down the corridor, its wall ends at row 363
        let x = 60 * config.slice_width + 4;
        let horizon = config.screen_height / 2;
        let texel = |y: usize, texture: usize| {
            let point = floor_point(&level.start, 0., (y - horizon) as f32, 1., config).unwrap();
            let (tex_x, tex_y) = surface_texel(point, config);
            assets.walls.texel(texture, tex_x, tex_y)
        };

        // row 533 sees the floor about 96 units ahead, in textured column 3
        assert_eq!(fb.pixel(x, 533), Some(texel(533, 1).scale(config.floor_shade)));
        let ceiling = fb.pixel(x, config.screen_height - 533);
        assert_eq!(ceiling, Some(texel(533, 2)));

        // row 384 sees 320 units ahead, column 6: bare floor and open sky
        let sky = assets.sky.pixel(sky_column(0., 60, assets.sky.width, config.fov), 32);
        assert_eq!(fb.pixel(x, 384), Some(Rgb::VERY_DARK_GREY));
        assert_eq!(fb.pixel(x, config.screen_height - 384), Some(sky));
        assert_ne!(ceiling, Some(sky));
    }

    #[test]
    fn faded_screens_start_black() {
        let config = Config::default();
        let mut fb = Framebuffer::new(config.frame_width(), config.screen_height);
        screen(None, Rgb::GREEN, 0., &config, &mut fb);
        assert_eq!(fb.pixel(10, 10), Some(Rgb::BLACK));
        screen(None, Rgb::GREEN, 1., &config, &mut fb);
        assert_eq!(fb.pixel(10, 10), Some(Rgb::GREEN));

        let art = Image::gradient(2, 2, Rgb::WHITE, Rgb::WHITE);
        screen(Some(&art), Rgb::GREEN, 0.5, &config, &mut fb);
        assert_eq!(fb.pixel(900, 600), Some(Rgb::new(127, 127, 127)));
    }

    #[test]
    fn overview_marks_the_player() {
        let level = Level::builtin().unwrap();
        let mut fb = Framebuffer::new(level.config.frame_width(), level.config.screen_height);
        let pose = Pose::new(Vec2::new(150., 400.), 90.);
        overview(&level, &pose, &[], level.goal, &mut fb);

        // 640 / 3 / 8 = 26 pixels per tile
        let scale = 26. / 64.;
        let x = 8 + (150. * scale) as usize;
        let y = 8 + (400. * scale) as usize;
        assert_eq!(fb.pixel(x, y), Some(Rgb::YELLOW));
    }
}
