use super::*;
use chrono::{NaiveDate, Timelike};

#[test]
fn test_location_validation() {
    assert!(Location::new(40.7128, -74.0060).is_ok());
    assert!(Location::new(90.0, 180.0).is_ok());
    assert!(Location::new(-90.0, -180.0).is_ok());

    assert!(Location::new(91.0, 0.0).is_err());
    assert!(Location::new(-91.0, 0.0).is_err());
    assert!(Location::new(0.0, 181.0).is_err());
    assert!(Location::new(0.0, -360.0).is_err());
}

#[test]
fn test_solar_event_parsing() {
    assert_eq!("sunrise".parse::<SolarEvent>(), Ok(SolarEvent::Sunrise));
    assert_eq!("SUNSET".parse::<SolarEvent>(), Ok(SolarEvent::Sunset));
    assert!("noon".parse::<SolarEvent>().is_err());
    assert_eq!(SolarEvent::Sunset.to_string(), "sunset");
}

#[test]
fn test_astronomical_oracle_new_york_summer_solstice() {
    let oracle = AstronomicalOracle::new();
    let nyc = Location::new(40.7128, -74.0060).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();

    let events = oracle.solar_events(&nyc, date).unwrap();

    // Sunrise around 05:25 EDT, 09:25 UTC
    assert_eq!(events.sunrise.date_naive(), date);
    assert_eq!(events.sunrise.hour(), 9);

    // Roughly fifteen hours of daylight
    let day_length = events.sunset - events.sunrise;
    assert!(
        day_length > chrono::Duration::hours(14) && day_length < chrono::Duration::hours(16),
        "unexpected day length {day_length}"
    );
    assert_eq!(events.get(SolarEvent::Sunset), events.sunset);
}

#[test]
fn test_astronomical_oracle_equator_has_even_days() {
    let oracle = AstronomicalOracle::new();
    let singapore = Location::new(1.3521, 103.8198).unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();

    let events = oracle.solar_events(&singapore, date).unwrap();
    let day_length = events.sunset - events.sunrise;
    assert!(
        (day_length - chrono::Duration::hours(12)).num_minutes().abs() < 20,
        "equatorial day should be close to 12h, got {day_length}"
    );
}

#[test]
fn test_astronomical_oracle_consecutive_days_advance() {
    let oracle = AstronomicalOracle::new();
    let london = Location::new(51.5074, -0.1278).unwrap();
    let day1 = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    let day2 = day1.succ_opt().unwrap();

    let first = oracle.solar_events(&london, day1).unwrap();
    let second = oracle.solar_events(&london, day2).unwrap();

    let gap = second.sunset - first.sunset;
    assert!((gap - chrono::Duration::days(1)).num_minutes().abs() < 5);
}

#[test]
fn test_mock_oracle_is_usable_as_trait_object() {
    let mut mock = MockSolarOracle::new();
    mock.expect_solar_events()
        .returning(|_, _| Err(OracleError::Unavailable("offline".to_string())));

    let oracle: &dyn SolarOracle = &mock;
    let location = Location::new(0.0, 0.0).unwrap();
    let err = oracle
        .solar_events(&location, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .unwrap_err();
    assert_eq!(err.to_string(), "solar events unavailable: offline");
}
