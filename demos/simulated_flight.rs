//! Fly a simulated vehicle after a scripted person.
//!
//! Run with: cargo run --example simulated_flight [planner.json]
//!
//! Set `RUST_LOG=cinematic_rs=debug` to see each planning cycle.

use std::env;

use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use cinematic_rs::flight::{FlightLoop, ScriptedDetector, SimulatedVehicle};
use cinematic_rs::{BoundingBox, CinematicController, PlannerConfig, Result, SmoothController, VehiclePose};

/// A person walking away from the camera while drifting to the left of the frame.
fn walking_person(frames: usize) -> Result<ScriptedDetector> {
    let mut script = Vec::with_capacity(frames);
    for i in 0..frames {
        let t = i as f64;
        let width = (40.0 - t).max(4.0);
        let person = BoundingBox::new((width, 2.0 * width), (320.0 - 5.0 * t, 240.0))?;
        let bystander = BoundingBox::new((20.0, 40.0), (600.0, 250.0))?;
        // The person is briefly occluded
        if i == frames / 2 {
            script.push(None);
        } else {
            script.push(Some(vec![person, bystander]));
        }
    }
    Ok(ScriptedDetector::new(script))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = match env::args().nth(1) {
        Some(path) => {
            info!(%path, "loading planner configuration");
            PlannerConfig::from_json_file(path)?
        }
        None => PlannerConfig::default(),
    };

    let vehicle = SimulatedVehicle::new(VehiclePose::level(0.0, 0.0, 2.0, 0.0), config.vehicle.clone())?;
    // Person observations are timestamped in simulated seconds
    let planner = CinematicController::with_clock(config.controller.clone(), vehicle.clock())?;
    let follower = SmoothController::new(vehicle.clone(), vehicle.clone(), config.smooth.clone())?;
    let detector = walking_person(config.flight.max_iterations)?;

    let mut flight = FlightLoop::new(detector, planner, follower, config.flight.clone())?;
    let report = flight.run()?;

    let pose = vehicle.pose()?;
    info!(
        iterations = report.iterations,
        detections = report.frames_with_detections,
        reached = report.waypoints_reached(),
        x = pose.x,
        y = pose.y,
        z = pose.z,
        yaw = pose.yaw,
        "simulated flight complete"
    );
    for (i, follow) in report.follow_reports.iter().enumerate() {
        info!(
            cycle = i,
            reached = follow.reached,
            iterations = follow.iterations,
            distance = follow.distance,
            "follow report"
        );
    }
    Ok(())
}
