//! Headless particle simulation driving a quadtree rebuilt every step.
//!
//! Particles drift with a random velocity and wrap around the domain. Each
//! step the tree is cleared and refilled, then the particles around a cursor
//! sweeping the domain are looked up.
//!
//! ```text
//! cargo run --example particles --features serde -- [config.toml]
//! ```
//!
//! The optional TOML file holds a `QuadTreeConfig`, e.g.
//!
//! ```toml
//! max_depth = 10
//! capacity = 100
//!
//! [bounds]
//! x = 0.0
//! y = 0.0
//! width = 800.0
//! height = 600.0
//! ```

use std::path::Path;

use anyhow::Context;
use pointquad::{QuadTree, QuadTreeConfig, QuadTreeVisitor, Rect};
use rand::Rng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const PARTICLES: usize = 10_000;
const STEPS: usize = 120;
const CURSOR_RADIUS: f32 = 50.0;

struct Particle {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
}

impl Particle {
    fn random(rng: &mut impl Rng, bounds: Rect) -> Self {
        Self {
            x: bounds.x + rng.random_range(0.0..bounds.width),
            y: bounds.y + rng.random_range(0.0..bounds.height),
            vx: rng.random_range(-1.0..1.0),
            vy: rng.random_range(-1.0..1.0),
        }
    }

    fn update(&mut self, bounds: Rect) {
        self.x = bounds.x + (self.x - bounds.x + self.vx + bounds.width) % bounds.width;
        self.y = bounds.y + (self.y - bounds.y + self.vy + bounds.height) % bounds.height;
    }
}

/// Tallies what a renderer would have to draw.
#[derive(Default)]
struct Stats {
    branches: usize,
    leaves: usize,
    items: usize,
    deepest: u8,
}

impl QuadTreeVisitor<usize> for Stats {
    fn item(&mut self, _item: &pointquad::Item<usize>) {
        self.items += 1;
    }

    fn leaf(&mut self, depth: u8, _bounds: Rect) {
        self.leaves += 1;
        self.deepest = self.deepest.max(depth);
    }

    fn branch(&mut self, _depth: u8, _bounds: Rect) {
        self.branches += 1;
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<QuadTreeConfig> {
    let Some(path) = path else {
        return Ok(QuadTreeConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(toml::from_str(&contents)?)
}

fn step(tree: &mut QuadTree<usize>, particles: &mut [Particle], cursor: (f32, f32)) -> usize {
    tree.clear();
    for (id, particle) in particles.iter_mut().enumerate() {
        particle.update(tree.bounds());
        // Wrapping keeps every particle inside the bounds.
        if let Err(err) = tree.add_item(particle.x, particle.y, id) {
            debug!("skipping particle {id}: {err}");
        }
    }
    tree.items_in_radius(cursor.0, cursor.1, CURSOR_RADIUS).len()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args().nth(1);
    let config = load_config(path.as_deref().map(Path::new))?;
    let mut tree = QuadTree::from_config(config)?;
    info!(?config, particles = PARTICLES, steps = STEPS, "starting simulation");

    let bounds = tree.bounds();
    let mut rng = rand::rng();
    let mut particles: Vec<_> = (0..PARTICLES)
        .map(|_| Particle::random(&mut rng, bounds))
        .collect();

    for n in 0..STEPS {
        // Sweep the cursor along the diagonal.
        let t = n as f32 / STEPS as f32;
        let cursor = (bounds.x + t * bounds.width, bounds.y + t * bounds.height);
        let near = step(&mut tree, &mut particles, cursor);

        if n % 20 == 0 {
            let mut stats = Stats::default();
            tree.visit(&mut stats);
            info!(
                step = n,
                near,
                items = stats.items,
                branches = stats.branches,
                leaves = stats.leaves,
                deepest = stats.deepest,
                "step done"
            );
        }
    }

    Ok(())
}
