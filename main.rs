mod color;
mod config;
mod error;
mod lighting;
mod renderer;
mod scene;
mod terrain;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use minifb::{InputCallback, Key, Window, WindowOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, ViewerConfig};
use crate::error::ViewerError;
use crate::renderer::Renderer;
use crate::scene::{print_startup_help, SceneState};

const WIDTH: usize = 500;
const HEIGHT: usize = 500;
const WINDOW_TITLE: &str = "Gouraud";

/// Collects typed characters so commands keep their case.
struct TypedKeys(Rc<RefCell<VecDeque<char>>>);

impl InputCallback for TypedKeys {
    fn add_char(&mut self, uni_char: u32) {
        if let Some(key) = char::from_u32(uni_char) {
            self.0.borrow_mut().push_back(key);
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ViewerConfig::resolve(&cli).context("loading configuration")?;
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed, shading = ?config.shading, "starting terrain viewer");
    let mut rng = StdRng::seed_from_u64(seed);

    let mut window = Window::new(
        WINDOW_TITLE,
        WIDTH,
        HEIGHT,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )
    .map_err(ViewerError::from)
    .context("creating window")?;
    window.limit_update_rate(Some(Duration::from_micros(16_600)));

    let typed = Rc::new(RefCell::new(VecDeque::new()));
    window.set_input_callback(Box::new(TypedKeys(Rc::clone(&typed))));

    let mut scene = SceneState::new(config.bounds, config.light_positions(), &mut rng);
    let mut renderer = Renderer::new(WIDTH, HEIGHT);
    print_startup_help();

    let mut needs_redraw = true;
    while window.is_open() && !window.is_key_down(Key::Escape) {
        let pending: Vec<char> = typed.borrow_mut().drain(..).collect();
        for key in pending {
            needs_redraw |= scene.handle_key(key, &mut rng);
        }

        if needs_redraw {
            scene.shade();
            renderer.render(
                &scene.grid,
                &scene.lights,
                scene.rotation.matrix(),
                config.shading,
            );
            window
                .update_with_buffer(renderer.color_buffer(), WIDTH, HEIGHT)
                .map_err(ViewerError::from)?;
            needs_redraw = false;
        } else {
            window.update();
        }
    }

    Ok(())
}
