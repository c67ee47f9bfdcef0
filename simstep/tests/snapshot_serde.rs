#![cfg(feature = "serde")]

use simstep::{Config, RunState, Stepper, StepperSnapshot};

#[test]
fn test_run_state_serializes_as_variant_name() {
    let json = serde_json::to_string(&RunState::Paused).unwrap();
    assert_eq!(json, "\"Paused\"");
    let state: RunState = serde_json::from_str("\"Stepping\"").unwrap();
    assert_eq!(state, RunState::Stepping);
}

#[test]
fn test_snapshot_serializes() {
    let stepper = Stepper::new(3u8, Config::default().with_name("net"));
    stepper.start_stepping(3, 2);

    let json = serde_json::to_string(&stepper.snapshot()).unwrap();
    let back: StepperSnapshot<u8> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stepper.snapshot());
    assert_eq!(&*back.name, "net");
}
