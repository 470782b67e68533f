use crate::host::{Action, Assets, Canvas, Input};
use crate::map::{Level, Tile};
use crate::pose::{axis_sign, Pose};
use crate::render;
use crate::sprite;
use crate::texture::{Image, Rgb};
use glam::Vec2;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Init,
    Title,
    Playing,
    Won,
    Lost,
}

/// Events that move the game between phases.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Trigger {
    /// the level has been (re)built
    Ready,
    /// a title, won or lost screen has been shown long enough
    ScreenElapsed,
    ReachedGoal,
    Caught,
}

impl Phase {
    /// The transition table. `None` means the trigger does not apply in this phase.
    pub fn on(self, trigger: Trigger) -> Option<Phase> {
        match (self, trigger) {
            (Phase::Init, Trigger::Ready) => Some(Phase::Title),
            (Phase::Title, Trigger::ScreenElapsed) => Some(Phase::Playing),
            (Phase::Playing, Trigger::ReachedGoal) => Some(Phase::Won),
            (Phase::Playing, Trigger::Caught) => Some(Phase::Lost),
            (Phase::Won | Phase::Lost, Trigger::ScreenElapsed) => Some(Phase::Init),
            _ => None,
        }
    }
}

/// One playthrough: the live level, the player and the phase machine around them.
pub struct Session {
    pristine: Level,
    pub level: Level,
    pub player: Pose,
    pub has_key: bool,
    pub phase: Phase,
    pub show_map: bool,
    /// perpendicular wall distance per ray column, rebuilt every playing frame
    pub depth: Vec<f32>,
    timer: f32,
    fade: f32,
}

impl Session {
    pub fn new(level: Level) -> Self {
        let player = level.start;
        let depth = vec![f32::INFINITY; level.config.columns()];
        Self {
            pristine: level.clone(),
            level,
            player,
            has_key: false,
            phase: Phase::Init,
            show_map: false,
            depth,
            timer: 0.,
            fade: 0.,
        }
    }

    /// Put the level, player and inventory back to how the level file describes them.
    pub fn reset(&mut self) {
        log::info!("resetting level");
        self.level = self.pristine.clone();
        self.player = self.level.start;
        self.has_key = false;
        self.timer = 0.;
        self.fade = 0.;
    }

    /// Apply a trigger; returns whether the phase changed.
    pub fn trigger(&mut self, trigger: Trigger) -> bool {
        match self.phase.on(trigger) {
            Some(next) => {
                log::debug!("{:?} --{:?}--> {:?}", self.phase, trigger, next);
                self.phase = next;
                self.timer = 0.;
                self.fade = 0.;
                true
            }
            None => false,
        }
    }

    /// Run one frame: sample input, simulate and draw. `elapsed` is in seconds; the
    /// simulation advances by at most `max_step` of it.
    pub fn frame(&mut self, elapsed: f32, input: &Input, assets: &Assets, canvas: &mut impl Canvas) {
        match self.phase {
            Phase::Init => {
                self.reset();
                self.trigger(Trigger::Ready);
            }
            Phase::Title => self.show_screen(elapsed, assets.title.as_ref(), Rgb::new(40, 60, 160), canvas),
            Phase::Won => self.show_screen(elapsed, assets.won.as_ref(), Rgb::GREEN, canvas),
            Phase::Lost => self.show_screen(elapsed, assets.lost.as_ref(), Rgb::RED, canvas),
            Phase::Playing => {
                let encounter = self.step(elapsed.min(self.level.config.max_step), input);

                let hits = render::scene(&self.level, &self.player, &mut self.depth, assets, canvas);
                if self.show_map {
                    render::overview(&self.level, &self.player, &hits, self.level.goal, canvas);
                }

                if encounter.caught {
                    self.trigger(Trigger::Caught);
                } else if self.level.cell_of(self.player.pos) == self.level.goal {
                    self.trigger(Trigger::ReachedGoal);
                }
            }
        }
    }

    fn show_screen(
        &mut self,
        elapsed: f32,
        image: Option<&Image>,
        tint: Rgb,
        canvas: &mut impl Canvas,
    ) {
        render::screen(image, tint, self.fade, &self.level.config, canvas);
        self.fade = (self.fade + elapsed).min(1.);
        self.timer += elapsed;
        if self.timer > self.level.config.screen_delay {
            self.trigger(Trigger::ScreenElapsed);
        }
    }

    /// Simulate one playing frame without drawing: turning, walking, doors and sprites.
    pub fn step(&mut self, elapsed: f32, input: &Input) -> sprite::Encounter {
        if input.pressed(Action::ToggleMap) {
            self.show_map = !self.show_map;
        }

        let config = &self.level.config;
        // slow rotation or movement down if held
        let factor = if input.held(Action::Slow) {
            1.
        } else {
            config.fast_factor
        };
        let turn = config.turn_speed * elapsed * factor;
        if input.held(Action::TurnLeft) {
            self.player.turn(turn);
        }
        if input.held(Action::TurnRight) {
            self.player.turn(-turn);
        }

        let distance = config.move_speed * elapsed * factor;
        if input.held(Action::Forward) {
            self.walk(distance);
        }
        if input.held(Action::Backward) {
            self.walk(-distance);
        }

        if input.pressed(Action::Interact) {
            self.open_door();
        }

        let encounter = sprite::update(
            &mut self.level.sprites,
            self.player.pos,
            &self.level.walls,
            &self.level.config,
            elapsed,
        );
        if encounter.picked_up > 0 {
            self.has_key = true;
        }
        encounter
    }

    /// Move along the heading (backwards for negative distances). Each axis is checked on its
    /// own, a margin ahead of the player, so walls are slid along rather than stuck to.
    pub fn walk(&mut self, distance: f32) {
        let margin = self.level.config.collision_margin;
        let step = self.player.direction() * distance;
        let ahead = Vec2::new(margin * axis_sign(step.x), margin * axis_sign(step.y));
        let here = self.player.pos;

        if step.x != 0. && self.level.is_open(here + Vec2::new(ahead.x, 0.)) {
            self.player.pos.x += step.x;
        }
        if step.y != 0. && self.level.is_open(here + Vec2::new(0., ahead.y)) {
            self.player.pos.y += step.y;
        }
    }

    /// Open the door in reach in front of the player, for good. Returns whether one opened.
    pub fn open_door(&mut self) -> bool {
        let config = &self.level.config;
        if config.door_needs_key && !self.has_key {
            return false;
        }

        let facing = self.player.direction();
        let reach = Vec2::new(
            config.door_reach * axis_sign(facing.x),
            config.door_reach * axis_sign(facing.y),
        );
        let target = self.player.pos + reach;
        let (col, row) = self.level.cell_of(target);
        if !matches!(self.level.walls.get(col, row), Some(Tile::Door(_))) {
            return false;
        }
        log::debug!("opened door at {col},{row}");
        self.level.walls.set(col, row, Tile::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        use Phase::*;
        use Trigger::*;
        assert_eq!(Init.on(Ready), Some(Title));
        assert_eq!(Title.on(ScreenElapsed), Some(Playing));
        assert_eq!(Playing.on(ReachedGoal), Some(Won));
        assert_eq!(Playing.on(Caught), Some(Lost));
        assert_eq!(Won.on(ScreenElapsed), Some(Init));
        assert_eq!(Lost.on(ScreenElapsed), Some(Init));

        assert_eq!(Title.on(Caught), None);
        assert_eq!(Playing.on(ScreenElapsed), None);
        assert_eq!(Won.on(Caught), None);
        assert_eq!(Init.on(ScreenElapsed), None);
    }

    #[test]
    fn turning_respects_the_slow_modifier() {
        let mut session = Session::new(Level::builtin().unwrap());
        session.step(0.1, &Input::default().hold(Action::TurnLeft));
        assert!((session.player.angle - 110.).abs() < 1e-3);

        session.step(0.1, &Input::default().hold(Action::TurnRight).hold(Action::Slow));
        assert!((session.player.angle - 108.).abs() < 1e-3);
    }

    #[test]
    fn stalled_frames_do_not_tunnel() {
        let mut session = Session::new(Level::builtin().unwrap());
        session.phase = Phase::Playing;
        let assets = Assets::generated(&session.level.config);
        let mut fb = crate::host::Framebuffer::new(960, 640);

        // a whole second at full speed would carry the player 200 units north
        session.frame(1., &Input::default().hold(Action::Forward), &assets, &mut fb);
        assert!((session.player.pos.y - 390.).abs() < 1e-3);
        assert!(session.level.is_open(session.player.pos));
    }

    #[test]
    fn toggling_the_map() {
        let mut session = Session::new(Level::builtin().unwrap());
        session.step(0., &Input::default().press(Action::ToggleMap));
        assert!(session.show_map);
        session.step(0., &Input::default().hold(Action::ToggleMap));
        assert!(session.show_map);
        session.step(0., &Input::default().press(Action::ToggleMap));
        assert!(!session.show_map);
    }

    #[test]
    fn walking_over_the_key_grants_it() {
        let mut session = Session::new(Level::builtin().unwrap());
        session.player = Pose::new(Vec2::new(100., 330.), 90.);
        session.step(0., &Input::default());
        assert!(session.has_key);
        assert!(!session.level.sprites[0].active);
    }

    #[test]
    fn reset_restores_the_level() {
        let mut session = Session::new(Level::builtin().unwrap());
        session.has_key = true;
        session.player = Pose::new(Vec2::new(100., 330.), 10.);
        session.level.walls.set(3, 2, Tile::Empty);
        session.level.sprites[0].active = false;

        session.reset();
        assert!(!session.has_key);
        assert_eq!(session.player, session.level.start);
        assert!(matches!(session.level.walls.get(3, 2), Some(Tile::Door(_))));
        assert!(session.level.sprites[0].active);
    }
}
