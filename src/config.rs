use anyhow::Context;
use std::collections::HashMap;
use std::str::FromStr;

/// Every tunable of the renderer and the game rules.
///
/// Defaults describe the stock dungeon; a level file may override any of them in its
/// `!!!!META` section.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    // view
    pub fov: f32,
    pub slice_degrees: f32,
    pub slice_width: usize,
    pub screen_height: usize,
    pub max_depth: usize,

    // grid
    pub tile_size: f32,
    pub texture_size: usize,

    // movement
    pub move_speed: f32,
    pub turn_speed: f32,
    pub fast_factor: f32,
    pub collision_margin: f32,
    /// longest simulated step in seconds, stalled frames are cut down to it
    pub max_step: f32,
    pub door_reach: f32,
    pub door_needs_key: bool,

    // sprites
    pub pickup_radius: f32,
    pub catch_radius: f32,
    pub chase_speed: f32,
    pub chase_margin: f32,

    // screens
    pub screen_delay: f32,

    // shading
    pub vertical_shade: f32,
    pub horizontal_shade: f32,
    pub floor_shade: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fov: 60.,
            slice_degrees: 0.5,
            slice_width: 8,
            screen_height: 640,
            max_depth: 8,

            tile_size: 64.,
            texture_size: 32,

            move_speed: 20.,
            turn_speed: 20.,
            fast_factor: 10.,
            collision_margin: 20.,
            max_step: 0.05,
            door_reach: 25.,
            door_needs_key: true,

            pickup_radius: 30.,
            catch_radius: 30.,
            chase_speed: 15.,
            chase_margin: 15.,

            screen_delay: 2.,

            vertical_shade: 0.5,
            horizontal_shade: 1.,
            floor_shade: 0.7,
        }
    }
}

impl Config {
    /// number of rays cast per frame
    pub fn columns(&self) -> usize {
        (self.fov / self.slice_degrees).round() as usize
    }

    /// width of the composed frame in pixels
    pub fn frame_width(&self) -> usize {
        self.columns() * self.slice_width
    }

    /// height of the frame in slice-sized blocks (the sprite pass works in blocks)
    pub fn rows(&self) -> usize {
        self.screen_height / self.slice_width
    }

    /// Apply one `directive,key=value,...` line from a level's META section.
    pub fn apply(&mut self, line: &str) -> anyhow::Result<()> {
        let mut chunks = line.split(',');
        let directive = chunks.by_ref().next().unwrap_or_default().trim();
        let params = chunks
            .map(|param| param.split_once('='))
            .collect::<Option<HashMap<_, _>>>()
            .with_context(|| format!("incorrectly formatted meta: {line}"))?;

        for (key, value) in params {
            let (key, value) = (key.trim(), value.trim());
            match (directive, key) {
                ("view", "fov") => self.fov = parse(key, value)?,
                ("view", "slice") => self.slice_degrees = parse(key, value)?,
                ("view", "slice_width") => self.slice_width = parse(key, value)?,
                ("view", "height") => self.screen_height = parse(key, value)?,
                ("view", "dof") => self.max_depth = parse(key, value)?,
                ("grid", "tile") => self.tile_size = parse(key, value)?,
                ("grid", "texture") => self.texture_size = parse(key, value)?,
                ("movement", "speed") => self.move_speed = parse(key, value)?,
                ("movement", "turn") => self.turn_speed = parse(key, value)?,
                ("movement", "fast") => self.fast_factor = parse(key, value)?,
                ("movement", "margin") => self.collision_margin = parse(key, value)?,
                ("movement", "max_step") => self.max_step = parse(key, value)?,
                ("door", "reach") => self.door_reach = parse(key, value)?,
                ("door", "needs_key") => self.door_needs_key = parse(key, value)?,
                ("sprites", "pickup") => self.pickup_radius = parse(key, value)?,
                ("sprites", "catch") => self.catch_radius = parse(key, value)?,
                ("sprites", "chase") => self.chase_speed = parse(key, value)?,
                ("sprites", "chase_margin") => self.chase_margin = parse(key, value)?,
                ("screens", "delay") => self.screen_delay = parse(key, value)?,
                ("shade", "vertical") => self.vertical_shade = parse(key, value)?,
                ("shade", "horizontal") => self.horizontal_shade = parse(key, value)?,
                ("shade", "floor") => self.floor_shade = parse(key, value)?,
                (directive, key) => anyhow::bail!("unrecognized meta setting: {directive}.{key}"),
            }
        }

        self.validate()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(self.fov > 0. && self.fov < 180.) {
            anyhow::bail!("field of view must be within (0, 180) degrees, got {}", self.fov);
        }
        if self.slice_degrees <= 0. || self.columns() == 0 {
            anyhow::bail!("slice angle {} yields no ray columns", self.slice_degrees);
        }
        if self.slice_width == 0 || self.screen_height < self.slice_width {
            anyhow::bail!(
                "screen height {} cannot hold slices {} pixels wide",
                self.screen_height,
                self.slice_width
            );
        }
        if self.max_step <= 0. {
            anyhow::bail!("maximum step must be positive, got {}", self.max_step);
        }
        if self.tile_size <= 0. || self.texture_size == 0 {
            anyhow::bail!("tile and texture sizes must be positive");
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("invalid value for {key}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_geometry() {
        let config = Config::default();
        assert_eq!(config.columns(), 120);
        assert_eq!(config.frame_width(), 960);
        assert_eq!(config.rows(), 80);
    }

    #[test]
    fn meta_overrides_apply() {
        let mut config = Config::default();
        config.apply("sprites,pickup=12.5,chase=4").unwrap();
        config.apply("door,needs_key=false").unwrap();
        config.apply("movement,max_step=0.02").unwrap();
        assert_eq!(config.max_step, 0.02);
        assert_eq!(config.pickup_radius, 12.5);
        assert_eq!(config.chase_speed, 4.);
        assert!(!config.door_needs_key);
    }

    #[test]
    fn unknown_settings_are_rejected() {
        let mut config = Config::default();
        assert!(config.apply("fog,dof=4").is_err());
        assert!(config.apply("view,fov").is_err());
        assert!(config.apply("view,fov=wide").is_err());
        assert!(config.apply("view,fov=0").is_err());
        assert!(config.apply("movement,max_step=0").is_err());
    }
}
