//! Background loop, shutdown and binary tests

use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use vehicle_sim::simulation::{
    ObstacleSource, RandomObstacles, RunStatus, ScriptedObstacles, Simulation, SimulationConfig,
    Vec2,
};
use vehicle_sim::SimError;

const TICK: Duration = Duration::from_millis(10);

fn fast_config() -> SimulationConfig {
    SimulationConfig::with_tick_interval(TICK)
}

/// Poll until `check` holds or the deadline passes
fn wait_for(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    check()
}

#[test]
fn test_loop_applies_start_and_stop() {
    let mut sim = Simulation::with_obstacles(fast_config(), ScriptedObstacles::cycle([false]));
    sim.spawn_loop().unwrap();

    sim.control().start();
    assert!(wait_for(Duration::from_secs(2), || {
        sim.snapshot().velocity == Vec2::new(1.0, 0.0)
    }));
    assert!(wait_for(Duration::from_secs(2), || sim.snapshot().position.x >= 3.0));

    sim.control().stop();
    assert!(wait_for(Duration::from_secs(2), || {
        let state = sim.snapshot();
        state.velocity == Vec2::ZERO && !state.obstacle_detected
    }));

    // Position holds still while stopped
    let parked = sim.snapshot().position;
    thread::sleep(TICK * 5);
    assert_eq!(sim.snapshot().position, parked);

    let report = sim.shutdown().unwrap();
    assert!(report.ticks_run >= 3);
    assert_eq!(report.ticks_failed, 0);
}

#[test]
fn test_snapshots_never_torn() {
    let mut sim = Simulation::with_obstacles(
        SimulationConfig::with_tick_interval(Duration::from_millis(1)),
        RandomObstacles::with_seed(3),
    );
    sim.spawn_loop().unwrap();

    let control = sim.control().clone();
    let toggler = thread::spawn(move || {
        for i in 0..200 {
            if i % 2 == 0 {
                control.start();
            } else {
                control.stop();
            }
            thread::sleep(Duration::from_micros(300));
        }
    });

    let mut last_x = 0.0;
    for _ in 0..2000 {
        let state = sim.snapshot();
        // Velocity is only ever one of the two values a tick writes
        assert!(state.velocity == Vec2::ZERO || state.velocity == Vec2::new(1.0, 0.0));
        assert_eq!(state.velocity.y, 0.0);
        assert_eq!(state.position.y, 0.0);
        // Obstacle flag can only be set by a running tick
        if state.obstacle_detected {
            assert_eq!(state.velocity.x, 1.0);
        }
        assert!(state.position.x >= last_x);
        assert_eq!(state.position.x.fract(), 0.0);
        last_x = state.position.x;
    }

    toggler.join().unwrap();
    sim.shutdown().unwrap();
}

#[test]
fn test_shutdown_is_prompt() {
    let mut sim = Simulation::new(SimulationConfig::with_tick_interval(Duration::from_millis(500)));
    sim.spawn_loop().unwrap();
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    sim.shutdown().unwrap();
    // Waiting loop wakes on the signal rather than finishing the interval
    assert!(started.elapsed() < Duration::from_millis(400));
    assert!(!sim.is_loop_running());
}

#[test]
fn test_loop_can_be_respawned() {
    let mut sim = Simulation::with_obstacles(fast_config(), ScriptedObstacles::cycle([false]));
    sim.control().start();

    sim.spawn_loop().unwrap();
    assert!(matches!(sim.spawn_loop(), Err(SimError::LoopAlreadyRunning)));
    assert!(matches!(sim.step(), Err(SimError::LoopAlreadyRunning)));
    assert!(wait_for(Duration::from_secs(2), || sim.snapshot().position.x >= 2.0));
    let first = sim.shutdown().unwrap();

    // Manual stepping works again once the loop is parked
    let x = sim.snapshot().position.x;
    sim.step().unwrap();
    assert_eq!(sim.snapshot().position.x, x + 1.0);

    sim.spawn_loop().unwrap();
    assert!(wait_for(Duration::from_secs(2), || sim.snapshot().position.x >= x + 3.0));
    let second = sim.shutdown().unwrap();
    assert!(second.ticks_run > first.ticks_run);
}

#[test]
fn test_loop_survives_failing_ticks() {
    // Three good readings, then every tick fails
    let mut sim = Simulation::with_obstacles(
        fast_config(),
        ScriptedObstacles::once([false, false, false]),
    );
    sim.control().start();
    sim.spawn_loop().unwrap();

    assert!(wait_for(Duration::from_secs(2), || sim.snapshot().position.x == 3.0));
    thread::sleep(TICK * 5);
    assert_eq!(sim.snapshot().position.x, 3.0);

    // Stopped ticks do not need the sensor, so the loop is still useful
    sim.control().stop();
    assert!(wait_for(Duration::from_secs(2), || {
        sim.snapshot().velocity == Vec2::ZERO
    }));

    let report = sim.shutdown().unwrap();
    assert!(report.ticks_run >= 4);
    assert!(report.ticks_failed >= 1);
}

struct StallingObstacles {
    stall: Duration,
}

impl ObstacleSource for StallingObstacles {
    fn detect(&mut self) -> anyhow::Result<bool> {
        thread::sleep(self.stall);
        Ok(false)
    }
}

#[test]
fn test_shutdown_times_out_on_stalled_tick() {
    let config = SimulationConfig {
        tick_interval: TICK,
        shutdown_timeout: Duration::from_millis(50),
        seed: None,
    };
    let mut sim = Simulation::with_obstacles(
        config,
        StallingObstacles {
            stall: Duration::from_millis(500),
        },
    );
    sim.control().start();
    sim.spawn_loop().unwrap();
    thread::sleep(Duration::from_millis(20));

    match sim.shutdown() {
        Err(SimError::ShutdownTimeout { timeout }) => {
            assert_eq!(timeout, Duration::from_millis(50))
        }
        other => panic!("expected shutdown timeout, got {:?}", other),
    }
}

#[test]
fn test_default_config() {
    let config = SimulationConfig::default();
    assert_eq!(config.tick_interval, Duration::from_secs(1));
    assert!(config.shutdown_timeout > config.tick_interval);
    assert_eq!(config.seed, None);
    assert_eq!(
        Simulation::new(config).snapshot().status,
        RunStatus::Stopped
    );
}

/// Test that the binary runs a short headless session to completion
#[test]
fn test_headless_binary_runs() {
    let output = Command::new(env!("CARGO_BIN_EXE_vehicle_sim"))
        .args(["--ticks", "3", "--tick-ms", "20", "--seed", "1"])
        .env("RUST_LOG", "warn,vehicle_sim=info")
        .output()
        .expect("Failed to execute simulation");

    assert!(
        output.status.success(),
        "Headless run failed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#"/api/control 200 {"status":"running"}"#));
    assert!(stdout.contains("--- After tick 3 ---"));
    assert!(stdout.contains("=== Final State ==="));
    assert!(stdout.contains(r#""status":"stopped""#));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION LOOP STOPPED"),
        "Missing loop summary. stderr: {}",
        stderr
    );
}

/// Test that interactive mode routes lines through the endpoints
#[test]
fn test_interactive_binary_handles_commands() {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = Command::new(env!("CARGO_BIN_EXE_vehicle_sim"))
        .args(["--interactive", "--tick-ms", "20"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute simulation");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(b"status\nStart\npause\nstop\nquit\n")
        .expect("Failed to write commands");

    let output = child.wait_with_output().expect("Simulation did not exit");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#"/api/status 200"#));
    assert!(stdout.contains(r#"/api/control 200 {"status":"running"}"#));
    assert!(stdout.contains(r#"/api/control 400 {"error":"Invalid command"}"#));
    assert!(stdout.contains(r#"/api/control 200 {"status":"stopped"}"#));
}
