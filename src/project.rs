use crate::config::Config;

/// smallest distance a wall is projected from, keeps the height finite
const NEAR: f32 = 0.0001;

/// A wall hit projected into one vertical screen slice.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Slice {
    /// perpendicular (defished) distance to the wall
    pub distance: f32,
    /// visible height in pixels, never taller than the screen
    pub height: f32,
    /// height the wall would have without clamping
    pub full_height: f32,
    /// pixels clipped off the top, and again off the bottom
    pub clipped: f32,
    /// first screen row of the visible slice
    pub top: f32,
    /// texture rows advanced per screen row
    pub tex_step: f32,
    /// texture row shown on the first visible screen row
    pub tex_start: f32,
}

/// Remove fisheye bulging: scale the ray distance by the cosine of its angle off the view axis.
pub fn defish(distance: f32, angle_offset: f32) -> f32 {
    distance * angle_offset.to_radians().cos()
}

pub fn project(distance: f32, angle_offset: f32, config: &Config) -> Slice {
    let screen = config.screen_height as f32;
    let distance = defish(distance, angle_offset);
    let full_height = (config.tile_size * screen) / distance.max(NEAR);

    // calculate step before line height is capped
    let tex_step = config.texture_size as f32 / full_height;
    let (height, clipped) = if full_height > screen {
        (screen, (full_height - screen) / 2.)
    } else {
        (full_height, 0.)
    };

    Slice {
        distance,
        height,
        full_height,
        clipped,
        top: (screen - height) / 2.,
        tex_step,
        tex_start: clipped * tex_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defishing_never_lengthens() {
        for offset in [-30., -12.5, 0., 7., 30.] {
            for distance in [0., 1., 64., 500.] {
                assert!(defish(distance, offset) <= distance);
            }
        }
    }

    #[test]
    fn height_shrinks_with_distance_and_fits_the_screen() {
        let config = Config::default();
        let mut previous = f32::INFINITY;
        let mut distance = 0.;
        while distance < 2000. {
            let slice = project(distance, 0., &config);
            assert!(slice.height <= config.screen_height as f32);
            assert!(slice.full_height <= previous);
            previous = slice.full_height;
            distance += 3.5;
        }
    }

    #[test]
    fn far_walls_are_centred_and_unclipped() {
        let config = Config::default();
        let slice = project(256., 0., &config);
        assert_eq!(slice.full_height, 160.);
        assert_eq!(slice.height, 160.);
        assert_eq!(slice.clipped, 0.);
        assert_eq!(slice.top, 240.);
        assert_eq!(slice.tex_step, 0.2);
        assert_eq!(slice.tex_start, 0.);
    }

    #[test]
    fn near_walls_sample_only_their_visible_band() {
        let config = Config::default();
        // twice the screen height: the middle half of the texture is visible
        let slice = project(32., 0., &config);
        assert_eq!(slice.full_height, 1280.);
        assert_eq!(slice.height, 640.);
        assert_eq!(slice.clipped, 320.);
        assert_eq!(slice.top, 0.);
        assert!((slice.tex_start - 8.).abs() < 1e-4);
        assert!((slice.tex_start + slice.tex_step * slice.height - 24.).abs() < 1e-4);
    }
}
