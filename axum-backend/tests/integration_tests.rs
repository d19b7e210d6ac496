use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use axum_backend::{create_app, AppState, ServerConfig};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;
use unified_detector::{
    detector_from_config, Detection, ObjectDetector, StaticDetector, StubYoloDetector, YoloConfig,
};

const BOUNDARY: &str = "floorplan-test-boundary";

fn app_with(detector: Arc<dyn ObjectDetector>) -> Router {
    let state = AppState::new(detector, ServerConfig::default()).unwrap();
    create_app(Arc::new(state))
}

fn wall_and_door() -> Arc<dyn ObjectDetector> {
    Arc::new(StaticDetector::new(vec![
        Detection::new("Wall", 0.92, [40.0, 40.0, 460.0, 52.0]),
        Detection::new("Door", 0.81, [100.0, 40.0, 140.0, 52.0]),
    ]))
}

/// 500x500 white sheet with one dark 400x400 square
fn plan_png() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_fn(500, 500, |x, y| {
        if (50..450).contains(&x) && (50..450).contains(&y) {
            Rgb([0u8, 0, 0])
        } else {
            Rgb([255u8, 255, 255])
        }
    }));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
    bytes
}

fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn decode_data_url(url: &str) -> DynamicImage {
    let (_, payload) = url.split_once(',').unwrap();
    image::load_from_memory(&STANDARD.decode(payload).unwrap()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app_with(wall_and_door());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["detector"].is_string());
}

#[tokio::test]
async fn test_startup_without_detector_url_serves_stub() {
    let config = ServerConfig::from_lookup(|_| None).unwrap();
    let detector: Arc<dyn ObjectDetector> =
        Arc::from(detector_from_config(config.detector.clone()).unwrap());
    let app = create_app(Arc::new(AppState::new(detector, config).unwrap()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert!(json["detector"].as_str().unwrap().starts_with("Stub"));
}

#[tokio::test]
async fn test_detect_with_walls_returns_room() {
    let app = app_with(wall_and_door());
    let response = app
        .oneshot(multipart_request("/detect", multipart_body("file", "plan.png", &plan_png())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;

    assert_eq!(json["detections"].as_array().unwrap().len(), 2);
    assert_eq!(json["detections"][0]["label"], "Wall");
    assert_eq!(json["object_counts"]["Wall"], 1);
    assert_eq!(json["object_counts"]["Door"], 1);
    assert_eq!(json["image_size"], json!({"width": 500, "height": 500}));

    let rooms = json["rooms"].as_array().unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0]["id"], 1);
    assert_eq!(rooms[0]["box"], json!({"x1": 50, "y1": 50, "x2": 450, "y2": 450}));
    assert_eq!(rooms[0]["centroid"], json!({"x": 250, "y": 250}));
    assert!(json.get("annotated_image").is_none());
}

#[tokio::test]
async fn test_detect_includes_annotated_image_on_request() {
    let app = app_with(wall_and_door());
    let response = app
        .oneshot(multipart_request(
            "/detect?include_annotated=true",
            multipart_body("file", "plan.png", &plan_png()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    let url = json["annotated_image"].as_str().unwrap();
    assert!(url.starts_with("data:image/png;base64,"));

    let annotated = decode_data_url(url).to_rgb8();
    assert_eq!(annotated.dimensions(), (500, 500));
    assert_eq!(annotated.get_pixel(50, 250), &Rgb([0, 255, 0]));
}

#[tokio::test]
async fn test_detect_without_walls_skips_rooms() {
    let detector: Arc<dyn ObjectDetector> = Arc::new(StaticDetector::new(vec![Detection::new(
        "Window",
        0.7,
        [10.0, 10.0, 30.0, 30.0],
    )]));
    let response = app_with(detector)
        .oneshot(multipart_request(
            "/detect?include_annotated=true",
            multipart_body("file", "plan.png", &plan_png()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert!(json["rooms"].as_array().unwrap().is_empty());
    assert_eq!(json["object_counts"]["Window"], 1);
    assert!(json.get("annotated_image").is_none());
}

#[tokio::test]
async fn test_detect_missing_file_part() {
    let response = app_with(wall_and_door())
        .oneshot(multipart_request("/detect", multipart_body("upload", "plan.png", &plan_png())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "NO_FILE");
}

#[tokio::test]
async fn test_detect_empty_filename() {
    let response = app_with(wall_and_door())
        .oneshot(multipart_request("/detect", multipart_body("file", "", b"")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "EMPTY_FILE");
}

#[tokio::test]
async fn test_detect_rejects_undecodable_image() {
    let response = app_with(wall_and_door())
        .oneshot(multipart_request(
            "/detect",
            multipart_body("file", "plan.png", b"definitely not an image"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "INVALID_IMAGE");
}

#[tokio::test]
async fn test_detect_reports_detector_failure() {
    let detector: Arc<dyn ObjectDetector> = Arc::new(StubYoloDetector::new(YoloConfig::default()));
    let response = app_with(detector)
        .oneshot(multipart_request("/detect", multipart_body("file", "plan.png", &plan_png())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["error"], "DETECTION_FAILED");
}

#[tokio::test]
async fn test_detect_rooms_from_base64() {
    let detector: Arc<dyn ObjectDetector> = Arc::new(StubYoloDetector::new(YoloConfig::default()));
    let request = json_request(
        "/detect/rooms",
        json!({ "image": STANDARD.encode(plan_png()), "include_annotated": true }),
    );
    let response = app_with(detector).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["total_rooms"], 1);
    assert_eq!(json["rooms"][0]["area"], 159201.0);

    let annotated = decode_data_url(json["annotated_image"].as_str().unwrap());
    assert_eq!(annotated.width(), 500);
}

#[tokio::test]
async fn test_detect_rooms_min_area_override() {
    let request = json_request(
        "/detect/rooms",
        json!({
            "image": format!("data:image/png;base64,{}", STANDARD.encode(plan_png())),
            "min_area": 200000.0
        }),
    );
    let response = app_with(wall_and_door()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["total_rooms"], 0);
    assert!(json.get("annotated_image").is_none());
}

#[tokio::test]
async fn test_detect_rooms_invalid_inputs() {
    let app = app_with(wall_and_door());

    let response = app
        .clone()
        .oneshot(json_request("/detect/rooms", json!({ "image": "***not base64***" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "INVALID_BASE64");

    let response = app
        .oneshot(json_request(
            "/detect/rooms",
            json!({ "image": STANDARD.encode(plan_png()), "min_area": -5.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "INVALID_CONFIG");
}

#[tokio::test]
async fn test_report_csv() {
    let response = app_with(wall_and_door())
        .oneshot(multipart_request("/report/csv", multipart_body("file", "plan.png", &plan_png())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"Label,Count\nDoor,1\nWall,1\n");
}
