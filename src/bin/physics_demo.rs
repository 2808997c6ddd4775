//! Headless physics demo
//!
//! Runs one of two small scenes through the full step pipeline and logs body
//! transforms as it goes:
//!
//! - `bodies`: a crate hanging from a spring and a floating wedge, both
//!   with mass properties integrated from their hulls
//! - `rope`: a chain of particles joined by rods and a cable, pinned at one
//!   end and dropping onto the ground
//!
//! ```text
//! RUST_LOG=debug cargo run --bin physics_demo -- --scene rope --steps 300
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use cinder_engine::physics::{
    AnchoredSpring, Buoyancy, Cable, Drag, Dynamics, GroundPlane, Particle, PhysicsConfig, PhysicsScene,
    Polyhedron, RigidBody, Rod, Spring, StepReport, Vec3,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scene {
    Bodies,
    Rope,
    All,
}

#[derive(Debug, Parser)]
#[command(name = "physics_demo", about = "Step a demo physics scene and log transforms")]
struct Args {
    /// Which scene to simulate
    #[arg(long, value_enum, default_value_t = Scene::All)]
    scene: Scene,

    /// Number of simulation steps
    #[arg(long, default_value_t = 240)]
    steps: u32,

    /// Step length in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// JSON physics config; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log body transforms every N steps
    #[arg(long, default_value_t = 60)]
    report_every: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => PhysicsConfig::load(path)
            .with_context(|| format!("loading physics config from {}", path.display()))?,
        None => PhysicsConfig::default(),
    };
    tracing::info!(?config, "physics config");

    if matches!(args.scene, Scene::Bodies | Scene::All) {
        let scene = build_bodies_scene(config)?;
        run("bodies", scene, &args)?;
    }
    if matches!(args.scene, Scene::Rope | Scene::All) {
        let scene = build_rope_scene(config)?;
        run("rope", scene, &args)?;
    }
    Ok(())
}

/// Triangular prism: right triangle in XY extruded along Z.
fn wedge_hull() -> Result<Polyhedron> {
    let vertices = vec![
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ];
    let faces = vec![
        vec![0, 2, 1],
        vec![3, 4, 5],
        vec![0, 1, 4, 3],
        vec![0, 3, 5, 2],
        vec![1, 2, 5, 4],
    ];
    Ok(Polyhedron::new(vertices, faces)?)
}

fn build_bodies_scene(config: PhysicsConfig) -> Result<PhysicsScene<RigidBody>> {
    let mut scene = PhysicsScene::new(config)?;

    let crate_props = Polyhedron::cuboid(Vec3::splat(0.5))?.mass_properties(40.0)?;
    let crate_body = scene.spawn(RigidBody::from_mass_properties(&crate_props, Vec3::new(0.0, 4.0, 0.0))?);

    let wedge_props = wedge_hull()?.mass_properties(300.0)?;
    tracing::info!(
        volume = wedge_props.volume,
        density = wedge_props.density(),
        center_of_mass = ?wedge_props.center_of_mass,
        "wedge mass properties"
    );
    let wedge = scene.spawn(RigidBody::from_mass_properties(&wedge_props, Vec3::new(3.0, 2.0, 0.0))?);

    scene.add_gravity(crate_body)?;
    scene.add_gravity(wedge)?;

    // Crate hangs by one corner so it swings and spins
    let corner = Vec3::splat(0.5);
    scene.add_force_generator(crate_body, Arc::new(AnchoredSpring::new(corner, Vec3::new(0.0, 6.0, 0.0), 400.0, 1.5)))?;

    // Loose elastic tether between the two, felt at both ends
    scene.add_force_generator(crate_body, Arc::new(Spring::new(Vec3::ZERO, wedge, Vec3::ZERO, 50.0, 3.0)))?;
    scene.add_force_generator(wedge, Arc::new(Spring::new(Vec3::ZERO, crate_body, Vec3::ZERO, 50.0, 3.0)))?;

    scene.add_force_generator(wedge, Arc::new(Drag::new(2.0, 0.5)))?;
    scene.add_force_generator(
        wedge,
        Arc::new(Buoyancy::new(Vec3::ZERO, 0.25, wedge_props.volume, 1.0)),
    )?;

    // Centers of mass sit half a unit above the floor
    scene.add_contact_generator(Box::new(GroundPlane::new(0.5, 0.2)));
    Ok(scene)
}

fn build_rope_scene(config: PhysicsConfig) -> Result<PhysicsScene<Particle>> {
    const LINKS: usize = 8;
    const LINK_LENGTH: f32 = 0.5;

    let mut scene = PhysicsScene::new(config)?;
    let anchor = scene.add_body(Particle::immovable(Vec3::new(0.0, 5.0, 0.0)));

    let mut previous = anchor;
    let mut links = Vec::with_capacity(LINKS);
    for i in 1..=LINKS {
        let position = Vec3::new(i as f32 * LINK_LENGTH, 5.0, 0.0);
        let particle = scene.spawn(Particle::new(1.0, position)?);
        scene.add_gravity(particle)?;
        scene.add_contact_generator(Box::new(Rod::new([particle, previous], LINK_LENGTH)));
        links.push(particle);
        previous = particle;
    }

    // Heavy weight on a slack cable below the last link
    let weight = scene.spawn(Particle::new(5.0, Vec3::new(LINKS as f32 * LINK_LENGTH, 4.0, 0.0))?);
    scene.add_gravity(weight)?;
    scene.add_force_generator(weight, Arc::new(Drag::new(0.5, 0.05)))?;
    scene.add_contact_generator(Box::new(Cable::new([weight, previous], 1.5, 0.3)));

    scene.add_contact_generator(Box::new(GroundPlane::new(0.0, 0.4)));
    tracing::info!(links = links.len(), "rope built");
    Ok(scene)
}

fn run<B>(name: &str, mut scene: PhysicsScene<B>, args: &Args) -> Result<()>
where
    B: Dynamics,
{
    tracing::info!(scene = name, bodies = scene.bodies().len(), steps = args.steps, dt = args.dt, "starting");

    let mut last = StepReport::default();
    let mut failures = 0;
    for step in 1..=args.steps {
        last = scene
            .do_physics_step(args.dt)
            .with_context(|| format!("{name}: step {step}"))?;
        failures += last.integration_failures;

        if args.report_every > 0 && step % args.report_every == 0 {
            for (handle, transform) in scene.bodies().handles().into_iter().zip(scene.transforms()) {
                tracing::info!(
                    scene = name,
                    step,
                    body = handle.index(),
                    position = ?transform.position(),
                    rotation = ?transform.rotation(),
                    "transform"
                );
            }
        }
    }

    let records = scene.transforms();
    let upload: &[u8] = bytemuck::cast_slice(&records);
    tracing::info!(
        scene = name,
        bytes = upload.len(),
        integration_failures = failures,
        report = %serde_json::to_string(&last)?,
        "finished"
    );
    Ok(())
}
