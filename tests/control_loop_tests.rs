//! Integration tests for the control loop: command servicing, boat
//! detection and rotation telemetry driven together.

use rs_drawbridge::config::{BridgeConfig, SensorConfig, TelemetryConfig};
use rs_drawbridge::hal::{MockLights, MockMotor, MockPulseCounter, MockRangeSensor, MockReporter};
use rs_drawbridge::priority::CommandQueue;
use rs_drawbridge::scheduler::ControlLoop;
use rs_drawbridge::{
    BoatSensorState, BridgeCommand, BridgeController, BridgeState, CommandSource, Config,
    Distance, PrioritizedCommand, RejectReason, SystemStatus,
};

type Bridge = BridgeController<MockMotor, MockLights>;
type Loop = ControlLoop<MockRangeSensor, MockPulseCounter, MockReporter>;

const TICK_MS: u64 = 20;

fn test_config() -> Config {
    Config::default()
        .with_bridge(
            BridgeConfig::default()
                .with_actuation_ms(200)
                .with_dwell_ms(400),
        )
        .with_sensors(
            SensorConfig::default()
                .with_sensor_ids(&[0, 1])
                .with_threshold_cm(10.0),
        )
        .with_telemetry(
            TelemetryConfig::default()
                .with_window_ms(1000)
                .with_pulses_per_revolution(700),
        )
}

fn setup() -> (Bridge, Loop) {
    let config = test_config();
    let mut bridge =
        BridgeController::with_config(MockMotor::new(), MockLights::new(), &config.bridge);
    bridge.initialize().unwrap();
    let control = ControlLoop::new(
        MockRangeSensor::new(),
        MockPulseCounter::new(),
        MockReporter::new(),
        &config,
    );
    (bridge, control)
}

fn cmd(command: BridgeCommand, source: CommandSource, at: u64) -> PrioritizedCommand {
    PrioritizedCommand::new(command, source, at)
}

// ============================================================================
// Command Servicing
// ============================================================================

#[test]
fn one_command_per_iteration() {
    let (mut bridge, mut control) = setup();
    let mut queue: CommandQueue<8> = CommandQueue::new();
    assert!(queue.push(cmd(BridgeCommand::Open, CommandSource::Udp, 0)));
    assert!(queue.push(cmd(BridgeCommand::OverrideTrafficOccupied, CommandSource::Udp, 1)));

    let first = control.tick(&mut bridge, queue.pop(), 0).unwrap();
    assert!(first.command.unwrap().is_accepted());
    assert_eq!(bridge.bridge_state(), BridgeState::Opening);
    assert_eq!(queue.len(), 1);

    let second = control.tick(&mut bridge, queue.pop(), TICK_MS).unwrap();
    assert!(second.command.unwrap().is_accepted());
    assert!(queue.is_empty());
}

#[test]
fn queued_stop_cancels_earlier_motion() {
    let (mut bridge, mut control) = setup();
    let mut queue: CommandQueue<8> = CommandQueue::new();
    assert!(queue.push(cmd(BridgeCommand::Open, CommandSource::WebApi, 0)));
    assert!(queue.push(cmd(BridgeCommand::Stop, CommandSource::Udp, 5)));

    let report = control.tick(&mut bridge, queue.pop(), 10).unwrap();
    assert!(report.command.unwrap().is_accepted());
    assert_eq!(bridge.bridge_state(), BridgeState::Stopped);

    let report = control.tick(&mut bridge, queue.pop(), 30).unwrap();
    assert!(report.command.is_none());
    assert_eq!(bridge.bridge_state(), BridgeState::Stopped);
}

#[test]
fn rearm_then_stop_stays_stopped() {
    let (mut bridge, mut control) = setup();
    bridge.stop(0).unwrap();

    let mut queue: CommandQueue<8> = CommandQueue::new();
    assert!(queue.push(cmd(BridgeCommand::Rearm, CommandSource::Udp, 10)));
    assert!(queue.push(cmd(BridgeCommand::Stop, CommandSource::Udp, 11)));

    let mut now = 20;
    while now <= 100 {
        control.tick(&mut bridge, queue.pop(), now).unwrap();
        now += TICK_MS;
    }

    assert_eq!(bridge.bridge_state(), BridgeState::Stopped);
    assert!(!bridge.motor().is_running());
}

#[test]
fn rearm_after_stop_still_recovers() {
    let (mut bridge, mut control) = setup();
    let mut queue: CommandQueue<8> = CommandQueue::new();
    assert!(queue.push(cmd(BridgeCommand::Stop, CommandSource::Udp, 0)));
    assert!(queue.push(cmd(BridgeCommand::Rearm, CommandSource::Udp, 1)));

    control.tick(&mut bridge, queue.pop(), 0).unwrap();
    let report = control.tick(&mut bridge, queue.pop(), TICK_MS).unwrap();
    assert!(report.command.unwrap().is_accepted());
    assert_eq!(bridge.bridge_state(), BridgeState::Closing);
}

#[test]
fn busy_commands_are_rejected_not_deferred() {
    let (mut bridge, mut control) = setup();
    control
        .tick(&mut bridge, Some(cmd(BridgeCommand::Open, CommandSource::Udp, 0)), 0)
        .unwrap();

    let report = control
        .tick(
            &mut bridge,
            Some(cmd(BridgeCommand::Close, CommandSource::Udp, 20)),
            20,
        )
        .unwrap();
    assert_eq!(
        report.command.unwrap().reject_reason(),
        Some(RejectReason::Busy)
    );

    // Settles as if the close never arrived.
    control.tick(&mut bridge, None, 200).unwrap();
    assert_eq!(bridge.bridge_state(), BridgeState::Open);
}

// ============================================================================
// Boat Detection
// ============================================================================

#[test]
fn detection_runs_full_automatic_cycle() {
    let (mut bridge, mut control) = setup();
    control.sensors_mut().set_distance(1, 6.0);

    let mut now = 0;
    let first = control.tick(&mut bridge, None, now).unwrap();
    assert!(first.auto_opened);
    assert_eq!(first.detection.unwrap().sensor, 1);
    assert_eq!(first.state_after, BridgeState::Opening);

    // The boat stays in range; no second cycle while moving or open.
    let mut saw_open = false;
    while bridge.bridge_state() != BridgeState::Closed || now == 0 {
        now += TICK_MS;
        let report = control.tick(&mut bridge, None, now).unwrap();
        assert!(!report.auto_opened || report.state_before == BridgeState::Closed);
        saw_open |= bridge.bridge_state() == BridgeState::Open;
        if bridge.bridge_state() == BridgeState::Closing {
            control.sensors_mut().set_no_echo(1);
        }
        assert!(now < 5_000, "cycle did not finish");
    }

    assert!(saw_open);
    assert_eq!(bridge.system_status(), SystemStatus::Ready);
    assert_eq!(bridge.boat_sensor(), BoatSensorState::Clear);
    // 200 open + 400 dwell + 200 close.
    assert_eq!(now, 800);
}

#[test]
fn far_readings_do_not_open() {
    let (mut bridge, mut control) = setup();
    control.sensors_mut().set_distance(0, 10.5);
    control.sensors_mut().set_distance(1, 300.0);

    let report = control.tick(&mut bridge, None, 0).unwrap();
    assert!(report.detection.is_none());
    assert!(!report.auto_opened);
    assert_eq!(bridge.bridge_state(), BridgeState::Closed);
    assert_eq!(bridge.boat_sensor(), BoatSensorState::Clear);
}

#[test]
fn sensors_polled_in_list_order() {
    let (mut bridge, mut control) = setup();
    control.tick(&mut bridge, None, 0).unwrap();
    control.tick(&mut bridge, None, TICK_MS).unwrap();
    assert_eq!(control.sensors_mut().polled, vec![0, 1, 0, 1]);
}

#[test]
fn first_hit_short_circuits_pass() {
    let (mut bridge, mut control) = setup();
    control
        .sensors_mut()
        .queue_reading(0, Some(Distance::from_cm(3.0)));

    let report = control.tick(&mut bridge, None, 0).unwrap();
    assert_eq!(report.detection.unwrap().sensor, 0);
    assert_eq!(control.sensors_mut().polled, vec![0]);
}

#[test]
fn stop_command_beats_detection_in_same_iteration() {
    let (mut bridge, mut control) = setup();
    control.sensors_mut().set_distance(0, 2.0);

    let report = control
        .tick(&mut bridge, Some(cmd(BridgeCommand::Stop, CommandSource::Udp, 0)), 0)
        .unwrap();
    assert!(!report.auto_opened);
    assert_eq!(bridge.bridge_state(), BridgeState::Stopped);
    assert_eq!(bridge.boat_sensor(), BoatSensorState::Detected);
}

#[test]
fn no_sensors_configured_skips_detection() {
    let config = test_config().with_sensors(SensorConfig::default().with_sensor_ids(&[]));
    let mut bridge =
        BridgeController::with_config(MockMotor::new(), MockLights::new(), &config.bridge);
    bridge.initialize().unwrap();
    bridge.override_boat_detected();
    let mut control = ControlLoop::new(
        MockRangeSensor::new(),
        MockPulseCounter::new(),
        MockReporter::new(),
        &config,
    );

    control.tick(&mut bridge, None, 0).unwrap();
    assert!(control.sensors_mut().polled.is_empty());
    // The operator override survives because nothing overwrote it.
    assert_eq!(bridge.boat_sensor(), BoatSensorState::Detected);
}

// ============================================================================
// Telemetry
// ============================================================================

#[test]
fn telemetry_reports_once_per_window() {
    let (mut bridge, mut control) = setup();
    control.telemetry_mut().counter_mut().add_pulses(350);

    let mut reports = Vec::new();
    let mut now = 0;
    while now <= 2_000 {
        if let Some(rpm) = control.tick(&mut bridge, None, now).unwrap().rotation_rpm {
            reports.push((now, rpm));
        }
        now += TICK_MS;
    }

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].0, 1_000);
    // 350 pulses over 1 s at 700 per revolution = 30 rpm.
    assert!((reports[0].1 - 30.0).abs() < 0.01);
    assert_eq!(reports[1], (2_000, 0.0));
    assert_eq!(control.telemetry().reporter().rates.len(), 2);
}

#[test]
fn telemetry_runs_while_stopped() {
    let (mut bridge, mut control) = setup();
    control
        .tick(&mut bridge, Some(cmd(BridgeCommand::Stop, CommandSource::Udp, 0)), 0)
        .unwrap();
    control.telemetry_mut().counter_mut().add_pulses(70);

    let report = control.tick(&mut bridge, None, 1_000).unwrap();
    assert!((report.rotation_rpm.unwrap() - 6.0).abs() < 0.01);
    assert_eq!(control.telemetry().last_rate(), report.rotation_rpm);
}
