//! The narrow seam between the renderer and whatever presents its frames.

use crate::config::Config;
use crate::texture::{Atlas, Image, Rgb};
use std::collections::HashSet;

/// Drawing surface a frame is emitted into. Drawing never fails; anything outside the
/// surface is clipped by the implementation.
pub trait Canvas {
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb);

    fn draw_pixel(&mut self, x: i32, y: i32, color: Rgb) {
        self.fill_rect(x, y, 1, 1, color);
    }
}

/// In-memory RGB24 surface.
#[derive(Clone, PartialEq, Debug)]
pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    data: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) * 3;
        Some(Rgb::new(self.data[idx], self.data[idx + 1], self.data[idx + 2]))
    }

    /// raw bytes, row after row
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// bytes per row
    pub fn pitch(&self) -> usize {
        self.width * 3
    }
}

impl Canvas for Framebuffer {
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb) {
        let x0 = x.max(0) as usize;
        let y0 = y.max(0) as usize;
        let x1 = (x as i64 + w as i64).clamp(0, self.width as i64) as usize;
        let y1 = (y as i64 + h as i64).clamp(0, self.height as i64) as usize;

        for row in y0..y1 {
            for col in x0..x1 {
                let idx = (row * self.width + col) * 3;
                self.data[idx..idx + 3].copy_from_slice(&[color.r, color.g, color.b]);
            }
        }
    }
}

/// Logical controls, independent of any keyboard layout.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    TurnLeft,
    TurnRight,
    Forward,
    Backward,
    Interact,
    /// slows turning and walking down while held
    Slow,
    ToggleMap,
}

/// Control state sampled by the host for one frame.
#[derive(Clone, Default, Debug)]
pub struct Input {
    /// actions whose control is currently down
    pub held: HashSet<Action>,
    /// actions whose control went down since the previous frame
    pub pressed: HashSet<Action>,
}

impl Input {
    pub fn held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    pub fn hold(mut self, action: Action) -> Self {
        self.held.insert(action);
        self
    }

    pub fn press(mut self, action: Action) -> Self {
        self.held.insert(action);
        self.pressed.insert(action);
        self
    }
}

/// Read-only art the renderer samples from.
///
/// Hosts with real art decode it themselves and hand it over as raw RGB through
/// [`Atlas::new`] and [`Image::new`]; any field may instead come from [`Assets::generated`].
/// Screens without a picture are drawn as a solid tint.
#[derive(Clone, Debug)]
pub struct Assets {
    pub walls: Atlas,
    pub sprites: Atlas,
    pub sky: Image,
    pub title: Option<Image>,
    pub won: Option<Image>,
    pub lost: Option<Image>,
}

impl Assets {
    /// procedural stand-ins, used when nothing is loaded from disk
    pub fn generated(config: &Config) -> Self {
        Self {
            walls: Atlas::generated(10, config.texture_size),
            sprites: Atlas::generated_sprites(3, config.texture_size),
            sky: Image::gradient(config.columns(), 40, Rgb::new(40, 60, 160), Rgb::CYAN),
            title: None,
            won: None,
            lost: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framebuffer_clips_rects() {
        let mut fb = Framebuffer::new(4, 3);
        fb.fill_rect(-2, 1, 4, 10, Rgb::RED);
        assert_eq!(fb.pixel(0, 0), Some(Rgb::BLACK));
        assert_eq!(fb.pixel(0, 1), Some(Rgb::RED));
        assert_eq!(fb.pixel(1, 2), Some(Rgb::RED));
        assert_eq!(fb.pixel(2, 2), Some(Rgb::BLACK));
        assert_eq!(fb.pixel(4, 0), None);

        fb.draw_pixel(3, 0, Rgb::GREEN);
        fb.draw_pixel(9, 9, Rgb::GREEN);
        assert_eq!(fb.pixel(3, 0), Some(Rgb::GREEN));
        assert_eq!(fb.pitch(), 12);
    }

    #[test]
    fn pressed_actions_are_also_held() {
        let input = Input::default().press(Action::Interact).hold(Action::Forward);
        assert!(input.pressed(Action::Interact));
        assert!(input.held(Action::Interact));
        assert!(input.held(Action::Forward));
        assert!(!input.pressed(Action::Forward));
    }
}
