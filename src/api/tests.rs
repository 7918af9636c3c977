use super::*;
use crate::device::testing::{Call, FakeDevice};
use crate::device::{ColorState, Power};
use crate::logger::Log;
use crate::time_source::SimulatedTimeSource;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use tower::ServiceExt;

fn app(devices: Vec<Arc<FakeDevice>>) -> Router {
    Log::set_enabled(false);
    let devices = devices
        .into_iter()
        .map(|d| {
            let label = crate::device::Device::label(d.as_ref()).to_string();
            (label, d as Arc<dyn Device>)
        })
        .collect();
    let clock = Arc::new(SimulatedTimeSource::new(Utc::now()));
    router(ApiState {
        devices: Arc::new(devices),
        transition: Arc::new(DeviceTransition::new(clock)),
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_power_turns_device_on() {
    let desk = Arc::new(FakeDevice::new("desk", Power::Off));
    let (status, body) = send(
        app(vec![desk.clone()]),
        get("/desk?brightness=100&hue=180&kelvin=2700&transition=500"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brightness"], 100.0);
    assert_eq!(body["hue"], 180.0);
    assert_eq!(body["kelvin"], 2700);
    assert_eq!(body["transition"], "500ms");

    let target = ColorState::from_human(180.0, 0.0, 100.0, 2700);
    assert_eq!(
        desk.calls(),
        vec![
            Call::Echo,
            Call::GetPower,
            Call::SetColor(target.with_brightness(0), std::time::Duration::from_millis(1)),
            Call::SetPower(Power::On, std::time::Duration::ZERO),
            Call::SetColor(target, std::time::Duration::from_millis(500)),
        ]
    );
}

#[tokio::test]
async fn test_power_accepts_form_body() {
    let desk = Arc::new(FakeDevice::new("desk", Power::On));
    let request = Request::builder()
        .method("POST")
        .uri("/desk")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("brightness=0&transition=1s"))
        .unwrap();

    let (status, body) = send(app(vec![desk.clone()]), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["brightness"], 0.0);
    assert_eq!(body["transition"], "1s");
    assert_eq!(desk.power(), Power::Off);
}

#[tokio::test]
async fn test_power_requires_brightness() {
    let desk = Arc::new(FakeDevice::new("desk", Power::On));
    let (status, body) = send(app(vec![desk.clone()]), get("/desk?hue=30")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "brightness parameter is required");
    assert!(desk.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_device() {
    let (status, body) = send(app(vec![]), get("/attic?brightness=10")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown device \"attic\"");
}

#[tokio::test]
async fn test_device_failure_is_server_error() {
    let porch = Arc::new(FakeDevice::new("porch", Power::Off).refuse_connections());
    let (status, body) = send(app(vec![porch]), get("/porch?brightness=10")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("porch: connect failed")
    );
}

#[tokio::test]
async fn test_status_reports_power_and_colour() {
    let desk = Arc::new(FakeDevice::new("desk", Power::On));
    let (status, body) = send(app(vec![desk.clone()]), get("/desk/status")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["power"], "on");
    assert_eq!(body["brightness"], 100.0);
    assert_eq!(body["kelvin"], 3500);
    assert_eq!(
        desk.calls(),
        vec![Call::Echo, Call::GetPower, Call::GetColor]
    );
}
