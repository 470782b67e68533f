use crate::config::Config;
use crate::map::{Grid, Material, Tile};
use crate::pose::{forward_distance, wrap_degrees, Pose};
use glam::Vec2;

/// margin for treating a ray as parallel to a grid axis
const EPSILON: f32 = 0.00001;

/// Which family of grid lines a ray struck.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Orientation {
    /// a line of constant y (the north or south face of a tile)
    Horizontal,
    /// a line of constant x (the east or west face of a tile)
    Vertical,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct RayHit {
    /// signed projection of the hit onto the ray direction
    pub distance: f32,
    pub point: Vec2,
    pub orientation: Orientation,
    /// the wall cell struck, on the far side of `point`'s grid line
    pub cell: (i32, i32),
    pub material: Material,
    /// absolute ray angle in degrees
    pub angle: f32,
}

/// Absolute angle of every ray column, leftmost column first.
pub fn column_angles(pose: &Pose, config: &Config) -> impl Iterator<Item = (usize, f32)> {
    let start = pose.angle + config.fov / 2.;
    let step = config.slice_degrees;
    (0..config.columns()).map(move |column| (column, wrap_degrees(start - column as f32 * step)))
}

/// Find the nearest wall along `angle` from the pose's position, walking at most
/// `config.max_depth` grid lines in each axis.
pub fn cast_ray(pose: &Pose, angle: f32, walls: &Grid<Tile>, config: &Config) -> Option<RayHit> {
    let origin = pose.pos;
    let tile = config.tile_size;
    let rad = angle.to_radians();
    let (sin, cos) = rad.sin_cos();
    let tan = rad.tan();

    // lines of constant x: step one tile along x, follow the tangent along y
    let vertical = if cos > EPSILON {
        // LOOKING RIGHT
        let x = (origin.x / tile).floor() * tile + tile;
        Some((
            Vec2::new(x, (origin.x - x) * tan + origin.y),
            Vec2::new(tile, -tile * tan),
            Vec2::new(tile / 2., 0.),
        ))
    } else if cos < -EPSILON {
        // LOOKING LEFT
        let x = (origin.x / tile).floor() * tile;
        Some((
            Vec2::new(x, (origin.x - x) * tan + origin.y),
            Vec2::new(-tile, tile * tan),
            Vec2::new(-tile / 2., 0.),
        ))
    } else {
        // LOOKING UP/DOWN (parallel - will never hit)
        None
    }
    .and_then(|(start, step, inside)| {
        walk(origin, start, step, inside, angle, walls, config, Orientation::Vertical)
    });

    // lines of constant y: step one tile along y, follow the inverse tangent along x
    let horizontal = if sin > EPSILON {
        // LOOKING UP
        let y = (origin.y / tile).floor() * tile;
        Some((
            Vec2::new((origin.y - y) / tan + origin.x, y),
            Vec2::new(tile / tan, -tile),
            Vec2::new(0., -tile / 2.),
        ))
    } else if sin < -EPSILON {
        // LOOKING DOWN
        let y = (origin.y / tile).floor() * tile + tile;
        Some((
            Vec2::new((origin.y - y) / tan + origin.x, y),
            Vec2::new(-tile / tan, tile),
            Vec2::new(0., tile / 2.),
        ))
    } else {
        // LOOKING SIDEWAYS (parallel - will never hit)
        None
    }
    .and_then(|(start, step, inside)| {
        walk(origin, start, step, inside, angle, walls, config, Orientation::Horizontal)
    });

    nearer(vertical, horizontal)
}

/// find shortest ray, the vertical one on a tie
fn nearer(vertical: Option<RayHit>, horizontal: Option<RayHit>) -> Option<RayHit> {
    match (vertical, horizontal) {
        (Some(v), Some(h)) => Some(if v.distance <= h.distance { v } else { h }),
        (v, h) => v.or(h),
    }
}

/// Step from grid line to grid line. Points stay exactly on the lines; the cell checked is
/// the one half a tile past the line (`inside`) in the direction of travel.
#[allow(clippy::too_many_arguments)]
fn walk(
    origin: Vec2,
    mut point: Vec2,
    step: Vec2,
    inside: Vec2,
    angle: f32,
    walls: &Grid<Tile>,
    config: &Config,
    orientation: Orientation,
) -> Option<RayHit> {
    for _ in 0..config.max_depth {
        let cell = Grid::<Tile>::cell_of(point + inside, config.tile_size);
        // cells outside the grid hold nothing, keep stepping
        if let Some(material) = walls.get(cell.0, cell.1).and_then(Tile::material) {
            return Some(RayHit {
                distance: forward_distance(origin, point, angle),
                point,
                orientation,
                cell,
                material,
                angle,
            });
        }
        point += step;
    }
    None
}
