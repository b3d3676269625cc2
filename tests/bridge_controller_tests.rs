//! Integration tests for the bridge controller state machine.

use rs_drawbridge::config::BridgeConfig;
use rs_drawbridge::hal::{MockLights, MockMotor};
use rs_drawbridge::traits::{BankSide, LightColor, MotorDirection};
use rs_drawbridge::{
    BoatSensorState, BridgeCommand, BridgeController, BridgeState, CommandSource, LightAspect,
    RejectReason, SystemStatus,
};

type Bridge = BridgeController<MockMotor, MockLights>;

const ACTUATION_MS: u64 = 1000;
const DWELL_MS: u64 = 2000;

fn ready_bridge() -> Bridge {
    let config = BridgeConfig::default()
        .with_actuation_ms(ACTUATION_MS as u32)
        .with_dwell_ms(DWELL_MS as u32);
    let mut bridge = BridgeController::with_config(MockMotor::new(), MockLights::new(), &config);
    bridge.initialize().unwrap();
    bridge
}

/// The only (bridge, status) pairs the controller may ever expose.
fn assert_valid_pair(bridge: &Bridge) {
    let pair = (bridge.bridge_state(), bridge.system_status());
    let valid = matches!(
        pair,
        (BridgeState::Closed, SystemStatus::Ready)
            | (BridgeState::Opening, SystemStatus::Moving)
            | (BridgeState::Open, SystemStatus::Ready)
            | (BridgeState::Closing, SystemStatus::Moving)
            | (BridgeState::Stopped, SystemStatus::Stopped)
    );
    assert!(valid, "invalid pair {:?}", pair);
}

fn assert_lights_follow_state(bridge: &Bridge) {
    assert_eq!(
        bridge.lights().aspect(),
        Some(LightAspect::for_state(bridge.bridge_state()))
    );
}

// ============================================================================
// Full Cycles
// ============================================================================

#[test]
fn manual_open_close_cycle() {
    let mut bridge = ready_bridge();

    assert!(bridge.open(0).unwrap().is_accepted());
    assert_eq!(bridge.bridge_state(), BridgeState::Opening);
    assert_valid_pair(&bridge);
    assert_lights_follow_state(&bridge);

    bridge.update(ACTUATION_MS).unwrap();
    assert_eq!(bridge.bridge_state(), BridgeState::Open);
    assert_valid_pair(&bridge);
    assert_lights_follow_state(&bridge);

    // Manual opens never schedule an automatic close.
    bridge.update(ACTUATION_MS + DWELL_MS * 2).unwrap();
    assert_eq!(bridge.bridge_state(), BridgeState::Open);

    let t = ACTUATION_MS + DWELL_MS * 2;
    assert!(bridge.close(t).unwrap().is_accepted());
    assert_eq!(bridge.bridge_state(), BridgeState::Closing);
    assert_eq!(bridge.motor().direction, MotorDirection::Close);

    bridge.update(t + ACTUATION_MS).unwrap();
    assert_eq!(bridge.bridge_state(), BridgeState::Closed);
    assert_eq!(bridge.system_status(), SystemStatus::Ready);
    assert!(!bridge.motor().is_running());
    assert_lights_follow_state(&bridge);
}

#[test]
fn toggle_alternates_direction() {
    let mut bridge = ready_bridge();
    let mut now = 0;

    for expected in [BridgeState::Open, BridgeState::Closed, BridgeState::Open] {
        assert!(bridge.toggle(now).unwrap().is_accepted());
        now += ACTUATION_MS;
        bridge.update(now).unwrap();
        assert_eq!(bridge.bridge_state(), expected);
        now += 10;
    }

    let directions: Vec<MotorDirection> = bridge
        .motor()
        .history
        .iter()
        .filter(|(_, duty)| *duty > 0.0)
        .map(|(direction, _)| *direction)
        .collect();
    assert_eq!(
        directions,
        vec![MotorDirection::Open, MotorDirection::Close, MotorDirection::Open]
    );
}

#[test]
fn automatic_cycle_returns_to_closed() {
    let mut bridge = ready_bridge();

    assert!(bridge.apply_detection(true, 0).unwrap());
    bridge.update(ACTUATION_MS).unwrap();
    assert_eq!(bridge.bridge_state(), BridgeState::Open);
    assert_eq!(bridge.dwell().unwrap().expires_ms, ACTUATION_MS + DWELL_MS);

    // The boat clears while the deck is up; the dwell still runs out.
    bridge.apply_detection(false, ACTUATION_MS + 100).unwrap();
    assert_eq!(bridge.boat_sensor(), BoatSensorState::Clear);

    bridge.update(ACTUATION_MS + DWELL_MS).unwrap();
    assert_eq!(bridge.bridge_state(), BridgeState::Closing);

    bridge.update(2 * ACTUATION_MS + DWELL_MS).unwrap();
    assert_eq!(bridge.bridge_state(), BridgeState::Closed);
    assert_eq!(bridge.system_status(), SystemStatus::Ready);
}

#[test]
fn dwell_snapshot_counts_down() {
    let mut bridge = ready_bridge();
    bridge.apply_detection(true, 0).unwrap();
    bridge.update(ACTUATION_MS).unwrap();

    let snapshot = bridge.state(ACTUATION_MS + 500);
    assert_eq!(snapshot.dwell_remaining_ms, Some(DWELL_MS - 500));
    assert!(snapshot.motion.is_none());
}

#[test]
fn motion_snapshot_reports_progress() {
    let mut bridge = ready_bridge();
    bridge.open(0).unwrap();

    let snapshot = bridge.state(250);
    let motion = snapshot.motion.unwrap();
    assert_eq!(motion.direction, MotorDirection::Open);
    assert_eq!(motion.elapsed_ms, 250);
    assert_eq!(motion.remaining_ms, ACTUATION_MS - 250);
    assert_eq!(snapshot.lights, LightAspect::for_state(BridgeState::Opening));
}

// ============================================================================
// Safety
// ============================================================================

#[test]
fn never_both_green_across_cycles() {
    let mut bridge = ready_bridge();
    let mut now = 0;

    bridge.apply_detection(true, now).unwrap();
    now += ACTUATION_MS;
    bridge.update(now).unwrap();
    now += DWELL_MS;
    bridge.update(now).unwrap();
    now += ACTUATION_MS;
    bridge.update(now).unwrap();

    bridge.open(now).unwrap();
    bridge.stop(now + 10).unwrap();
    bridge.rearm(now + 20).unwrap();
    bridge.update(now + 20 + ACTUATION_MS).unwrap();

    assert_eq!(bridge.bridge_state(), BridgeState::Closed);
    assert!(!bridge.lights().ever_both_green());
}

#[test]
fn road_turns_red_before_boat_turns_yellow() {
    let mut bridge = ready_bridge();
    let before = bridge.lights().history.len();
    bridge.open(0).unwrap();

    let writes = &bridge.lights().history[before..];
    assert_eq!(
        writes,
        &[
            (BankSide::Road, LightColor::Red),
            (BankSide::Boat, LightColor::Yellow)
        ]
    );
}

#[test]
fn boat_turns_red_before_road_turns_green() {
    let mut bridge = ready_bridge();
    bridge.open(0).unwrap();
    bridge.update(ACTUATION_MS).unwrap();
    bridge.close(ACTUATION_MS).unwrap();

    let before = bridge.lights().history.len();
    bridge.update(2 * ACTUATION_MS).unwrap();

    let writes = &bridge.lights().history[before..];
    assert_eq!(
        writes,
        &[
            (BankSide::Boat, LightColor::Red),
            (BankSide::Road, LightColor::Green)
        ]
    );
}

#[test]
fn stop_from_every_state() {
    let setups: [fn(&mut Bridge); 4] = [
        |_| {},
        |b| {
            b.open(0).unwrap();
        },
        |b| {
            b.open(0).unwrap();
            b.update(ACTUATION_MS).unwrap();
        },
        |b| {
            b.open(0).unwrap();
            b.update(ACTUATION_MS).unwrap();
            b.close(ACTUATION_MS).unwrap();
        },
    ];

    for setup in setups {
        let mut bridge = ready_bridge();
        setup(&mut bridge);
        assert!(bridge.stop(ACTUATION_MS + 1).unwrap().is_accepted());
        assert_eq!(bridge.bridge_state(), BridgeState::Stopped);
        assert_eq!(bridge.system_status(), SystemStatus::Stopped);
        assert_eq!(bridge.motor().duty, 0.0);
        assert_eq!(bridge.lights().aspect(), Some(LightAspect::ALL_RED));
        assert!(!bridge.is_moving());
    }
}

#[test]
fn stop_is_idempotent() {
    let mut bridge = ready_bridge();
    bridge.stop(0).unwrap();
    assert!(bridge.stop(5).unwrap().is_accepted());
    assert_eq!(bridge.bridge_state(), BridgeState::Stopped);
}

#[test]
fn stopped_rejects_everything_but_rearm_and_stop() {
    let mut bridge = ready_bridge();
    bridge.stop(0).unwrap();

    for cmd in [BridgeCommand::Open, BridgeCommand::Close, BridgeCommand::Toggle] {
        let outcome = bridge.apply_command(cmd, CommandSource::WebApi, 1).unwrap();
        assert_eq!(outcome.reject_reason(), Some(RejectReason::Stopped));
    }

    // Detection does not bypass the stop.
    assert!(!bridge.apply_detection(true, 2).unwrap());
    assert_eq!(bridge.bridge_state(), BridgeState::Stopped);

    assert!(bridge
        .apply_command(BridgeCommand::Rearm, CommandSource::Udp, 3)
        .unwrap()
        .is_accepted());
    assert_eq!(bridge.bridge_state(), BridgeState::Closing);
}

#[test]
fn open_when_already_open_is_rejected() {
    let mut bridge = ready_bridge();
    bridge.open(0).unwrap();
    bridge.update(ACTUATION_MS).unwrap();

    let outcome = bridge.open(ACTUATION_MS + 1).unwrap();
    assert_eq!(
        outcome.reject_reason(),
        Some(RejectReason::InvalidState {
            state: BridgeState::Open
        })
    );
    assert_eq!(bridge.bridge_state(), BridgeState::Open);
}

#[test]
fn query_state_has_no_side_effects() {
    let mut bridge = ready_bridge();
    bridge.open(0).unwrap();
    let calls = bridge.motor().call_count;
    let writes = bridge.lights().history.len();

    for _ in 0..3 {
        assert_eq!(bridge.query_state(), BridgeState::Opening);
    }
    assert_eq!(bridge.motor().call_count, calls);
    assert_eq!(bridge.lights().history.len(), writes);
}

// ============================================================================
// Hardware Failures
// ============================================================================

#[test]
fn light_failure_on_start_stops_motor() {
    let mut bridge = ready_bridge();
    bridge.lights_mut().fail = true;

    assert!(bridge.open(0).is_err());
    assert_eq!(bridge.bridge_state(), BridgeState::Stopped);
    assert_eq!(bridge.system_status(), SystemStatus::Stopped);
    assert!(!bridge.motor().is_running());

    // Recovery goes through re-arm once the lights work again.
    bridge.lights_mut().fail = false;
    assert!(bridge.rearm(10).unwrap().is_accepted());
    bridge.update(10 + ACTUATION_MS).unwrap();
    assert_eq!(bridge.bridge_state(), BridgeState::Closed);
}

#[test]
fn motor_failure_on_settle_enters_stopped() {
    let mut bridge = ready_bridge();
    bridge.open(0).unwrap();
    bridge.motor_mut().fail = true;

    assert!(bridge.update(ACTUATION_MS).is_err());
    assert_eq!(bridge.bridge_state(), BridgeState::Stopped);
    assert_eq!(bridge.lights().aspect(), Some(LightAspect::ALL_RED));
}

#[test]
fn initialize_reports_light_failure() {
    let mut bridge: Bridge = BridgeController::new(MockMotor::new(), MockLights::failing());
    assert!(bridge.initialize().is_err());
}
