// Jammer scenario runner
//
// usage: jammer_scenario [scenario.json] [--dump]
//
// Without a scenario file a small built-in demo is run. `--dump` prints the
// finalized positions of every entity per step as JSON.

use std::env;
use std::process;

use log::error;
use serde_json::json;

use jammer_motion::common::Point3D;
use jammer_motion::engine::{MotionEngine, PaddingMode};
use jammer_motion::kinematics::{MotionMode, SegmentChain, PARAM_TURN_RATE, PARAM_VELOCITY};
use jammer_motion::scenario::{EntitySpec, Scenario};
use jammer_motion::strategies::{MathModelingConfig, RandomWalkConfig, StrategyConfig, WaypointConfig};
use jammer_motion::world::{Bounds, Obstacle, World};
use jammer_motion::MotionResult;

fn demo_scenario() -> MotionResult<Scenario> {
    let world = World::new(
        vec![
            Obstacle::new(Point3D::new(-10.0, -10.0, -10.0), Point3D::new(10.0, 10.0, 10.0)),
            Obstacle::new(Point3D::new(30.0, -60.0, -10.0), Point3D::new(40.0, -20.0, 10.0)),
        ],
        Bounds::planar([-100.0, 100.0], [-100.0, 100.0]),
    );

    let mut chain = SegmentChain::new(Point3D::new(-60.0, 40.0, 1.5), 0.0, 5.0);
    chain.push(MotionMode::ConstVel, 8.0, &[(PARAM_VELOCITY, 5.0)])?;
    chain.push(MotionMode::Turn, 6.0, &[(PARAM_VELOCITY, 5.0), (PARAM_TURN_RATE, -30.0)])?;
    chain.push(MotionMode::ConstVel, 6.0, &[(PARAM_VELOCITY, 5.0)])?;

    let entities = vec![
        EntitySpec {
            id: "patrol".to_string(),
            padding_mode: PaddingMode::PadEnd,
            config: StrategyConfig::from(MathModelingConfig {
                segments: chain.into_segments(),
                ..MathModelingConfig::default()
            }),
        },
        EntitySpec {
            id: "drifter".to_string(),
            padding_mode: PaddingMode::PadEnd,
            config: StrategyConfig::from(RandomWalkConfig {
                starting_position: Point3D::new(60.0, 60.0, 1.5),
                num_steps: 40,
                step_size: 2.0,
                ..RandomWalkConfig::default()
            }),
        },
        EntitySpec {
            id: "courier".to_string(),
            padding_mode: PaddingMode::PadStart,
            config: StrategyConfig::from(WaypointConfig {
                starting_position: Point3D::new(-80.0, -80.0, 1.5),
                waypoints: vec![Point3D::new(60.0, -80.0, 1.5), Point3D::new(60.0, -10.0, 1.5)],
                ..WaypointConfig::default()
            }),
        },
    ];

    Ok(Scenario { world, entities, batch: None })
}

fn print_summary(engine: &MotionEngine) {
    println!("{} entities, {} steps", engine.len(), engine.get_max_path_length());
    for id in engine.entity_ids() {
        if let (Some(path), Some(meta)) = (engine.get_path(id), engine.get_metadata(id)) {
            let invalid = engine
                .world()
                .validate_positions(&path.points)
                .iter()
                .filter(|ok| !**ok)
                .count();
            println!(
                "  {:<16} {:<14} {:>8.2} m {:>8.2} s  padding={}  invalid={}",
                id,
                meta.strategy,
                meta.total_distance,
                meta.duration,
                engine.padding_mode(id).unwrap_or_default(),
                invalid
            );
        }
    }
}

fn dump_steps(engine: &MotionEngine) -> MotionResult<()> {
    let steps: Vec<_> = (0..engine.get_max_path_length())
        .map(|k| json!({ "step": k, "positions": engine.get_all_positions_at_step(k) }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&steps)?);
    Ok(())
}

fn run() -> MotionResult<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let dump = args.iter().any(|a| a == "--dump");
    let scenario = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => Scenario::from_json_file(path)?,
        None => demo_scenario()?,
    };

    let engine = scenario.run()?;
    print_summary(&engine);
    if dump {
        dump_steps(&engine)?;
    }
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{}", e);
        process::exit(1);
    }
}
