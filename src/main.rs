use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tilecast::{Action, Assets, Framebuffer, Input, Level, Session};

// helper trait to convert strings into std::error types
trait StringToAnyhow<T> {
    fn ah(self) -> anyhow::Result<T>;
}

impl<T> StringToAnyhow<T> for Result<T, String> {
    fn ah(self) -> anyhow::Result<T> {
        self.map_err(|err| anyhow::anyhow!("{err}"))
    }
}

const TARGET_FPS: u64 = 30;

fn action(key: Keycode) -> Option<Action> {
    match key {
        Keycode::Left | Keycode::A => Some(Action::TurnLeft),
        Keycode::Right | Keycode::D => Some(Action::TurnRight),
        Keycode::Up | Keycode::W => Some(Action::Forward),
        Keycode::Down | Keycode::S => Some(Action::Backward),
        Keycode::E | Keycode::Space => Some(Action::Interact),
        Keycode::LShift | Keycode::RShift => Some(Action::Slow),
        Keycode::M | Keycode::Tab => Some(Action::ToggleMap),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_custom_env("TILECAST_LOG");

    let level = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("loading level {path}");
            Level::load(&path)?
        }
        None => Level::builtin()?,
    };
    let assets = Assets::generated(&level.config);
    let width = level.config.frame_width();
    let height = level.config.screen_height;

    // sdl boilerplate
    log::info!("initializing sdl2");
    let sdl_ctx = sdl2::init().ah()?;
    log::info!("initializing video");
    let video = sdl_ctx.video().ah()?;

    log::info!("initializing window");
    let mut window = video
        .window("tilecast", width as u32, height as u32)
        .position_centered()
        .build()?;
    window.set_resizable(false);
    log::info!("creating canvas");
    let mut canvas = window.into_canvas().build()?;
    let creator = canvas.texture_creator();
    let mut frame = creator.create_texture_streaming(PixelFormatEnum::RGB24, width as u32, height as u32)?;
    log::info!("pumping events");
    let mut events = sdl_ctx.event_pump().ah()?;

    let mut keys = HashSet::new();
    let mut framebuffer = Framebuffer::new(width, height);
    let mut session = Session::new(level);

    let delta = Duration::from_millis(1_000 / TARGET_FPS);
    let mut last = Instant::now();

    'main_loop: loop {
        let prev = Instant::now();
        let mut input = Input::default();

        // handle events
        for ev in events.poll_iter() {
            match ev {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'main_loop,
                Event::KeyDown {
                    keycode: Some(k),
                    repeat,
                    ..
                } => {
                    keys.insert(k);
                    if let (false, Some(action)) = (repeat, action(k)) {
                        input.pressed.insert(action);
                    }
                }
                Event::KeyUp {
                    keycode: Some(k), ..
                } => {
                    keys.remove(&k);
                }
                _ => {}
            }
        }
        input.held.extend(keys.iter().copied().filter_map(action));
        input.held.extend(input.pressed.iter().copied());

        let elapsed = (prev - last).as_secs_f32();
        last = prev;
        session.frame(elapsed, &input, &assets, &mut framebuffer);

        frame.update(None, framebuffer.as_bytes(), framebuffer.pitch())?;
        canvas.copy(&frame, None, None).ah()?;
        canvas.present();

        let diff = Instant::now() - prev;
        if diff < delta {
            std::thread::sleep(delta - diff);
        }
    }

    Ok(())
}
