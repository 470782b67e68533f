use crate::config::Config;
use crate::pose::Pose;
use crate::sprite::{Sprite, SpriteKind};
use anyhow::Context;
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::Path;

/// reserved tile id: empty wall cell, bare floor, open ceiling
pub const EMPTY: char = '.';

const BUILTIN: &str = include_str!("../map/dungeon.map");

/// A tile id resolved against its legend.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Material {
    pub id: char,
    pub texture: usize,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Empty,
    Wall(Material),
    Door(Material),
}

impl Tile {
    pub fn material(&self) -> Option<Material> {
        match self {
            Tile::Empty => None,
            Tile::Wall(material) | Tile::Door(material) => Some(*material),
        }
    }

    pub fn is_solid(&self) -> bool {
        !matches!(self, Tile::Empty)
    }
}

/// A rectangular grid of cells, addressed by `(col, row)`.
#[derive(Clone, PartialEq, Debug)]
pub struct Grid<T> {
    pub width: usize,
    pub height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    pub fn new(width: usize, height: usize, cells: Vec<T>) -> anyhow::Result<Self> {
        if width * height != cells.len() {
            anyhow::bail!(
                "grid of {width}x{height} cannot hold {} cells",
                cells.len()
            );
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    fn idx(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col as usize >= self.width || row as usize >= self.height {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }

    pub fn get(&self, col: i32, row: i32) -> Option<&T> {
        self.idx(col, row).map(|idx| &self.cells[idx])
    }

    /// Overwrite a cell; returns false when the cell lies outside the grid.
    pub fn set(&mut self, col: i32, row: i32, value: T) -> bool {
        match self.idx(col, row) {
            Some(idx) => {
                self.cells[idx] = value;
                true
            }
            None => false,
        }
    }

    /// cell containing a world position
    pub fn cell_of(pos: Vec2, tile_size: f32) -> (i32, i32) {
        (
            (pos.x / tile_size).floor() as i32,
            (pos.y / tile_size).floor() as i32,
        )
    }

    pub fn at(&self, pos: Vec2, tile_size: f32) -> Option<&T> {
        let (col, row) = Self::cell_of(pos, tile_size);
        self.get(col, row)
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| ((idx % width, idx / width), cell))
    }
}

#[derive(Clone, Debug)]
struct LegendEntry {
    texture: usize,
    door: bool,
}

/// Everything needed to start (or restart) a level.
#[derive(Clone, PartialEq, Debug)]
pub struct Level {
    pub config: Config,
    pub walls: Grid<Tile>,
    pub floor: Grid<Option<Material>>,
    pub ceiling: Grid<Option<Material>>,
    pub start: Pose,
    pub goal: (i32, i32),
    pub sprites: Vec<Sprite>,
}

impl Level {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("loading level at {}", path.display());
        let file = read_to_string(path)
            .with_context(|| format!("could not read level {}", path.display()))?;
        Self::parse(&file).with_context(|| format!("malformed level {}", path.display()))
    }

    /// the eight by eight dungeon shipped with the crate
    pub fn builtin() -> anyhow::Result<Self> {
        log::info!("loading built-in level");
        Self::parse(BUILTIN).context("malformed built-in level")
    }

    pub fn parse(source: &str) -> anyhow::Result<Self> {
        let mut lines = source.lines();
        let mut config = Config::default();
        let mut walls = None;
        let mut floor = None;
        let mut ceiling = None;
        let mut start = None;
        let mut goal = None;
        let mut sprites = Vec::new();

        while let Some(line) = lines.by_ref().next() {
            match line.trim_end() {
                "" => {}
                "!!!!META" => {
                    for line in section(&mut lines) {
                        config.apply(line)?;
                    }
                }
                "!!!!WALLS" => {
                    let (width, height, cells) = parse_grid(&mut lines, "wall", |id, entry| {
                        match (id, entry) {
                            (EMPTY, _) => Ok(Tile::Empty),
                            (id, Some(LegendEntry { texture, door })) => {
                                let material = Material { id, texture: *texture };
                                Ok(if *door {
                                    Tile::Door(material)
                                } else {
                                    Tile::Wall(material)
                                })
                            }
                            (id, None) => anyhow::bail!("wall tile '{id}' has no legend entry"),
                        }
                    })?;
                    walls = Some(Grid::new(width, height, cells)?);
                }
                "!!!!FLOOR" => {
                    let (width, height, cells) = parse_grid(&mut lines, "floor", surface)?;
                    floor = Some(Grid::new(width, height, cells)?);
                }
                "!!!!CEILING" => {
                    let (width, height, cells) = parse_grid(&mut lines, "ceiling", surface)?;
                    ceiling = Some(Grid::new(width, height, cells)?);
                }
                "!!!!PLAYER" => {
                    for line in section(&mut lines) {
                        let (directive, params) = directive(line)?;
                        match directive {
                            "start" => {
                                start = Some(Pose::new(
                                    Vec2::new(number(&params, "x")?, number(&params, "y")?),
                                    number(&params, "angle")?,
                                ))
                            }
                            "goal" => goal = Some((number(&params, "col")?, number(&params, "row")?)),
                            other => anyhow::bail!("unrecognized player directive: {other}"),
                        }
                    }
                }
                "!!!!SPRITES" => {
                    for line in section(&mut lines) {
                        sprites.push(parse_sprite(line)?);
                    }
                }
                other => anyhow::bail!("unrecognized directive: {other}"),
            }
        }

        let walls = walls.context("level has no walls section")?;
        let floor = floor.context("level has no floor section")?;
        let ceiling = ceiling.context("level has no ceiling section")?;
        let start = start.context("level has no player start")?;
        let goal = goal.context("level has no goal")?;

        for (name, width, height) in [
            ("floor", floor.width, floor.height),
            ("ceiling", ceiling.width, ceiling.height),
        ] {
            if (width, height) != (walls.width, walls.height) {
                anyhow::bail!(
                    "{name} grid is {width}x{height} but the wall grid is {}x{}",
                    walls.width,
                    walls.height
                );
            }
        }

        if walls.get(goal.0, goal.1).is_none() {
            anyhow::bail!("goal tile {goal:?} lies outside the map");
        }
        match walls.at(start.pos, config.tile_size) {
            None => anyhow::bail!("player start {} lies outside the map", start.pos),
            Some(tile) if tile.is_solid() => {
                anyhow::bail!("player start {} is inside a wall", start.pos)
            }
            Some(_) => {}
        }
        for sprite in sprites.iter() {
            if walls.at(sprite.pos.truncate(), config.tile_size).is_none() {
                anyhow::bail!("{:?} sprite at {} lies outside the map", sprite.kind, sprite.pos);
            }
        }

        log::info!(
            "level is {}x{} tiles with {} sprites",
            walls.width,
            walls.height,
            sprites.len()
        );

        Ok(Self {
            config,
            walls,
            floor,
            ceiling,
            start,
            goal,
            sprites,
        })
    }

    pub fn tile_at(&self, pos: Vec2) -> Option<Tile> {
        self.walls.at(pos, self.config.tile_size).copied()
    }

    /// Whether a body may stand at `pos`. Anything outside the map counts as solid.
    pub fn is_open(&self, pos: Vec2) -> bool {
        matches!(self.tile_at(pos), Some(Tile::Empty))
    }

    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        Grid::<Tile>::cell_of(pos, self.config.tile_size)
    }
}

fn surface(id: char, entry: Option<&LegendEntry>) -> anyhow::Result<Option<Material>> {
    match (id, entry) {
        (EMPTY, _) => Ok(None),
        (id, Some(entry)) => Ok(Some(Material {
            id,
            texture: entry.texture,
        })),
        (id, None) => anyhow::bail!("tile '{id}' has no legend entry"),
    }
}

/// lines up to the next blank line
fn section<'lines>(
    lines: &mut impl Iterator<Item = &'lines str>,
) -> impl Iterator<Item = &'lines str> + '_ {
    lines
        .map(str::trim_end)
        .take_while(|line| !line.is_empty())
}

fn directive(line: &str) -> anyhow::Result<(&str, HashMap<&str, &str>)> {
    let mut chunks = line.split(',');
    let directive = chunks.by_ref().next().unwrap_or_default().trim();
    let params = chunks
        .map(|param| param.split_once('=').map(|(k, v)| (k.trim(), v.trim())))
        .collect::<Option<HashMap<_, _>>>()
        .with_context(|| format!("incorrectly formatted line: {line}"))?;
    Ok((directive, params))
}

fn number<T: std::str::FromStr>(params: &HashMap<&str, &str>, key: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = params.get(key).with_context(|| format!("missing {key}"))?;
    value
        .parse()
        .with_context(|| format!("invalid value for {key}: {value}"))
}

fn parse_sprite(line: &str) -> anyhow::Result<Sprite> {
    let (kind, params) = directive(line)?;
    let kind = match kind {
        "pickup" => SpriteKind::Pickup,
        "light" => SpriteKind::Light,
        "hostile" => SpriteKind::Hostile,
        other => anyhow::bail!("unrecognized sprite kind: {other}"),
    };
    let active = match params.get("active").copied().unwrap_or("1") {
        "1" | "on" | "true" => true,
        "0" | "off" | "false" => false,
        other => anyhow::bail!("invalid sprite state: {other}"),
    };

    Ok(Sprite {
        kind,
        active,
        texture: number(&params, "texture").with_context(|| format!("in sprite: {line}"))?,
        pos: Vec3::new(
            number(&params, "x").with_context(|| format!("in sprite: {line}"))?,
            number(&params, "y").with_context(|| format!("in sprite: {line}"))?,
            number(&params, "z").with_context(|| format!("in sprite: {line}"))?,
        ),
    })
}

/// Parse a legend block followed by a character grid, resolving every cell through `resolve`.
fn parse_grid<'lines, T>(
    lines: &mut impl Iterator<Item = &'lines str>,
    name: &str,
    resolve: impl Fn(char, Option<&LegendEntry>) -> anyhow::Result<T>,
) -> anyhow::Result<(usize, usize, Vec<T>)> {
    let mut legend = HashMap::new();
    for line in section(lines) {
        let mut chars = line.chars();
        let id = chars.by_ref().next().unwrap_or(EMPTY);
        if id == EMPTY {
            anyhow::bail!("'{EMPTY}' is reserved and cannot appear in the {name} legend");
        }
        let other_raw = chars.collect::<String>();
        let other = other_raw.split(',').map(str::trim).collect::<Vec<_>>();
        let texture = other[0]
            .parse()
            .with_context(|| format!("invalid texture index for {name} tile '{id}'"))?;
        let door = match other[1..] {
            [] => false,
            ["door"] => true,
            ref flags => anyhow::bail!("unrecognized flags for {name} tile '{id}': {flags:?}"),
        };
        if legend.insert(id, LegendEntry { texture, door }).is_some() {
            anyhow::bail!("{name} tile '{id}' is defined twice");
        }
    }

    let mut width = None;
    let mut height = 0;
    let mut cells = vec![];
    for line in section(lines) {
        let row = line.chars().collect::<Vec<_>>();
        match width {
            None => width = Some(row.len()),
            Some(width) if width != row.len() => anyhow::bail!(
                "{name} row {height} is {} tiles wide, expected {width}",
                row.len()
            ),
            Some(_) => {}
        }

        height += 1;
        for tile in row {
            cells.push(resolve(tile, legend.get(&tile)).with_context(|| format!("in {name} grid"))?);
        }
    }

    match width {
        Some(width) if width > 0 => Ok((width, height, cells)),
        _ => anyhow::bail!("{name} grid is empty"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\
!!!!WALLS
#0
D1,door

#####
#..D#
#####

!!!!FLOOR
f2

fffff
fffff
fffff

!!!!CEILING
c3

.....
.cc..
.....

!!!!PLAYER
start,x=96,y=96,angle=0
goal,col=2,row=1
";

    #[test]
    fn parses_small_level() {
        let level = Level::parse(SMALL).unwrap();
        assert_eq!((level.walls.width, level.walls.height), (5, 3));
        assert_eq!(level.walls.get(1, 1), Some(&Tile::Empty));
        assert_eq!(
            level.walls.get(3, 1),
            Some(&Tile::Door(Material { id: 'D', texture: 1 }))
        );
        assert_eq!(level.floor.get(4, 2), Some(&Some(Material { id: 'f', texture: 2 })));
        assert_eq!(level.ceiling.get(0, 0), Some(&None));
        assert_eq!(level.ceiling.get(1, 1), Some(&Some(Material { id: 'c', texture: 3 })));
        assert_eq!(level.goal, (2, 1));
        assert!(level.sprites.is_empty());
    }

    #[test]
    fn builtin_level_loads() {
        let level = Level::builtin().unwrap();
        assert_eq!((level.walls.width, level.walls.height), (8, 8));
        assert_eq!(level.sprites.len(), 4);
        assert_eq!(level.goal, (1, 1));
        assert!(level.is_open(level.start.pos));
    }

    #[test]
    fn lookups_outside_the_grid_are_none() {
        let level = Level::parse(SMALL).unwrap();
        assert_eq!(level.walls.get(-1, 0), None);
        assert_eq!(level.walls.get(5, 0), None);
        assert_eq!(level.walls.get(0, 3), None);
        assert_eq!(level.tile_at(Vec2::new(-0.5, 10.)), None);
        assert!(!level.is_open(Vec2::new(-0.5, 10.)));
    }

    #[test]
    fn unmapped_characters_fail_the_load() {
        let broken = SMALL.replace("#..D#", "#..X#");
        let err = Level::parse(&broken).unwrap_err();
        assert!(format!("{err:#}").contains("'X' has no legend entry"));
    }

    #[test]
    fn mismatched_grids_fail_the_load() {
        let broken = SMALL.replace(".cc..", ".cc.");
        assert!(Level::parse(&broken).is_err());

        let broken = SMALL.replace("fffff\nfffff\nfffff", "fffff\nfffff");
        let err = Level::parse(&broken).unwrap_err();
        assert!(format!("{err:#}").contains("floor grid is 5x2"));
    }

    #[test]
    fn malformed_sprites_fail_the_load() {
        let with = |line: &str| format!("{SMALL}\n!!!!SPRITES\n{line}\n");
        assert!(Level::parse(&with("pickup,active=1,texture=0,x=96,y=96,z=20")).is_ok());
        assert!(Level::parse(&with("dragon,active=1,texture=0,x=96,y=96,z=20")).is_err());
        assert!(Level::parse(&with("pickup,active=1,texture=0,x=96,y=96")).is_err());
        assert!(Level::parse(&with("pickup,active=1,texture=0,x=960,y=96,z=0")).is_err());
    }

    #[test]
    fn start_inside_wall_fails_the_load() {
        let broken = SMALL.replace("x=96,y=96", "x=10,y=10");
        assert!(Level::parse(&broken).is_err());
    }

    #[test]
    fn grid_set_is_bounds_checked() {
        let mut level = Level::parse(SMALL).unwrap();
        assert!(level.walls.set(3, 1, Tile::Empty));
        assert!(!level.walls.set(9, 9, Tile::Empty));
        assert_eq!(level.walls.get(3, 1), Some(&Tile::Empty));
    }
}
