use chrono::{TimeZone, Utc};
use lamplighter::device::testing::{Call, FakeDevice};
use lamplighter::device::{ColorState, DeviceTransition, Power, Step};
use lamplighter::logger::Log;
use lamplighter::time_source::SimulatedTimeSource;
use std::sync::Arc;
use std::time::Duration;

fn clock() -> Arc<SimulatedTimeSource> {
    Log::set_enabled(false);
    Arc::new(SimulatedTimeSource::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap(),
    ))
}

fn evening() -> ColorState {
    ColorState::from_human(30.0, 40.0, 80.0, 2700)
}

#[test]
fn test_echo_succeeds_on_fifth_attempt() {
    let clock = clock();
    let transition = DeviceTransition::new(clock.clone());
    let device = FakeDevice::new("desk", Power::On).time_out_echo(4);

    transition
        .transition(&device, evening(), Duration::from_secs(60))
        .unwrap();

    let calls = device.calls();
    let echoes = calls.iter().filter(|c| **c == Call::Echo).count();
    assert_eq!(echoes, 5);
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_millis(250),
            Duration::from_millis(500),
            Duration::from_millis(750),
            Duration::from_millis(1000),
        ]
    );
    assert_eq!(
        calls.last(),
        Some(&Call::SetColor(evening(), Duration::from_secs(60)))
    );
}

#[test]
fn test_echo_gives_up_after_five_timeouts() {
    let clock = clock();
    let transition = DeviceTransition::new(clock.clone());
    let device = FakeDevice::new("desk", Power::Off).time_out_echo(5);

    let err = transition
        .transition(&device, evening(), Duration::from_secs(60))
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.step, Step::Echo);
    assert_eq!(device.calls(), vec![Call::Echo; 5]);
    assert_eq!(clock.sleeps().len(), 4);
    assert_eq!(device.power(), Power::Off);
}

#[test]
fn test_echo_policy_is_configurable() {
    let clock = clock();
    let transition =
        DeviceTransition::new(clock.clone()).with_echo_policy(2, Duration::from_millis(100));
    let device = FakeDevice::new("desk", Power::On).time_out_echo(2);

    let err = transition
        .transition(&device, evening(), Duration::from_secs(1))
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(100)]);
}

#[test]
fn test_off_target_never_writes_colour() {
    for initial in [Power::On, Power::Off] {
        let transition = DeviceTransition::new(clock());
        let device = FakeDevice::new("porch", initial);

        transition
            .transition(&device, evening().with_brightness(0), Duration::from_secs(30))
            .unwrap();

        assert_eq!(
            device.calls(),
            vec![
                Call::Echo,
                Call::SetPower(Power::Off, Duration::from_secs(30)),
            ]
        );
    }
}
