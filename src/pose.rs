use glam::Vec2;

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(mut angle: f32) -> f32 {
    // fix angle
    while angle >= 360. {
        angle -= 360.;
    }
    while angle < 0. {
        angle += 360.;
    }
    angle
}

/// Unit vector for an angle in degrees. Angles run counter-clockwise while world y grows
/// downward, hence the negated sine.
pub fn direction(angle: f32) -> Vec2 {
    let rad = angle.to_radians();
    Vec2::new(rad.cos(), -rad.sin())
}

/// Signed projection of `to - from` onto the direction of `angle`.
pub fn forward_distance(from: Vec2, to: Vec2, angle: f32) -> f32 {
    direction(angle).dot(to - from)
}

/// Sign of one axis of a direction, zero when the direction runs along the other axis.
pub fn axis_sign(component: f32) -> f32 {
    if component.abs() < 0.0001 {
        0.
    } else {
        component.signum()
    }
}

/// Where the player stands and which way they face.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Pose {
    pub pos: Vec2,
    /// heading in degrees, always within `[0, 360)`
    pub angle: f32,
}

impl Pose {
    pub fn new(pos: Vec2, angle: f32) -> Self {
        Self {
            pos,
            angle: wrap_degrees(angle),
        }
    }

    pub fn direction(&self) -> Vec2 {
        direction(self.angle)
    }

    pub fn turn(&mut self, degrees: f32) {
        self.angle = wrap_degrees(self.angle + degrees);
    }

    /// Rotate a world-space point into view space: `x` is the lateral offset (positive to the
    /// right of the view), `y` the depth along the heading.
    pub fn to_view(&self, point: Vec2) -> Vec2 {
        let offset = point - self.pos;
        let (sin, cos) = self.angle.to_radians().sin_cos();
        Vec2::new(offset.y * cos + offset.x * sin, offset.x * cos - offset.y * sin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_angles_in_range() {
        assert_eq!(wrap_degrees(360.), 0.);
        assert_eq!(wrap_degrees(-90.), 270.);
        assert_eq!(wrap_degrees(725.), 5.);
        assert_eq!(wrap_degrees(12.5), 12.5);
    }

    #[test]
    fn heading_zero_points_east_and_ninety_points_up() {
        let east = direction(0.);
        assert!((east - Vec2::X).length() < 1e-6);
        let north = direction(90.);
        assert!((north - Vec2::new(0., -1.)).length() < 1e-6);
    }

    #[test]
    fn view_space_puts_points_ahead_at_positive_depth() {
        let pose = Pose::new(Vec2::new(100., 100.), 90.);
        let ahead = pose.to_view(Vec2::new(100., 40.));
        assert!(ahead.x.abs() < 1e-4);
        assert!((ahead.y - 60.).abs() < 1e-4);

        // facing north, east is to the right
        let right = pose.to_view(Vec2::new(130., 100.));
        assert!((right.x - 30.).abs() < 1e-4);
        assert!(right.y.abs() < 1e-4);
    }

    #[test]
    fn axis_sign_ignores_rounding_noise() {
        assert_eq!(axis_sign(direction(90.).x), 0.);
        assert_eq!(axis_sign(direction(90.).y), -1.);
        assert_eq!(axis_sign(direction(200.).x), -1.);
    }

    #[test]
    fn forward_distance_is_signed() {
        let from = Vec2::new(10., 10.);
        assert!((forward_distance(from, Vec2::new(30., 10.), 0.) - 20.).abs() < 1e-5);
        assert!((forward_distance(from, Vec2::new(-10., 10.), 0.) + 20.).abs() < 1e-5);
    }
}
