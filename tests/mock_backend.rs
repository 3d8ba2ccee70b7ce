//! End-to-end flows against the backend chosen by configuration.

use chrono::NaiveDate;

use runmate::types::{LoginRequest, NearbySessionRequest, RunType, SessionStatus};
use runmate::validation::PACE_DEFAULT_SEC;
use runmate::{
    AuthSession, Backend, BoundingBox, Config, FetchOutcome, FilterId, FilterSet,
    FixedPositionSource, GeoPoint, GeolocationProvider, MyPageApi, NearbyApi, RouteDraft,
    SearchApi, SearchController, SessionApi, SessionForm,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn backend() -> Backend {
    init();
    let backend = Backend::from_config(&Config::mock()).unwrap();
    assert!(backend.is_mock());
    backend
}

fn cheonan_bounds() -> BoundingBox {
    BoundingBox::new(127.09, 36.78, 127.12, 36.81).unwrap()
}

#[tokio::test]
async fn test_map_search_with_filters() {
    let ctrl = SearchController::new(backend());

    let outcome = ctrl
        .on_viewport_settled(cheonan_bounds(), &FilterSet::new())
        .await;
    assert_eq!(outcome, FetchOutcome::Applied { count: 3 });
    let ids: Vec<i64> = ctrl.markers().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    // Pace <= 600 s/km keeps all three, distance <= 3 km keeps only session 2
    assert_eq!(
        ctrl.on_filter_toggled(FilterId::Pace).await,
        FetchOutcome::Applied { count: 3 }
    );
    assert_eq!(
        ctrl.on_filter_toggled(FilterId::Distance).await,
        FetchOutcome::Applied { count: 1 }
    );
    assert_eq!(ctrl.markers()[0].id, 2);

    let summary = ctrl.on_marker_selected(2).await.unwrap().unwrap();
    assert_eq!(summary.title, "Lake park morning jog");
    assert_eq!(ctrl.selected_session_id(), Some(2));
}

#[tokio::test]
async fn test_unknown_marker_clears_selection() {
    let ctrl = SearchController::new(backend());
    assert!(ctrl.on_marker_selected(404).await.is_err());
    assert_eq!(ctrl.selected_session_id(), None);
}

#[tokio::test]
async fn test_create_session_from_drawn_route() {
    let api = backend();
    let auth = AuthSession::new(api.clone());
    auth.login(&LoginRequest {
        username: "runner01".to_string(),
        password: "abcd1234".to_string(),
    })
    .await
    .unwrap();

    let gps = GeolocationProvider::with_config(
        FixedPositionSource(GeoPoint::new(0.0, 0.0)),
        &Config::mock().with_fixed_location(true),
    );
    let here = gps.refetch().await.location.unwrap();

    let mut route = RouteDraft::new();
    route.push(here).unwrap();
    route
        .push(GeoPoint::new(here.latitude + 0.01, here.longitude))
        .unwrap();
    route.set_location_name("City Hall plaza");

    let mut form = SessionForm::new(route.to_location_form());
    form.title = "Lunch loop".to_string();
    form.run_type = RunType::Recovery;
    form.capacity = 6;

    let now = NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    // No start time yet
    assert!(form.to_request(now).is_err());

    form.start_at = Some(now + chrono::Duration::hours(2));
    let request = form.to_request(now).unwrap();
    assert_eq!(request.avg_pace_sec, PACE_DEFAULT_SEC);
    assert!((request.target_distance_km - 1.11).abs() < 0.01);

    let created = api.create_session(&request).await.unwrap();
    let runs = api.get_created_runs(None).await.unwrap();
    let run = runs.iter().find(|r| r.id == created.id).unwrap();
    assert_eq!(run.status, SessionStatus::Open);
    assert_eq!(run.title, "Lunch loop");
}

#[tokio::test]
async fn test_nearby_from_seoul() {
    let api = backend();
    let nearby = api
        .nearby_sessions(&NearbySessionRequest {
            x: 127.0017,
            y: 37.5642,
            size: Some(2),
        })
        .await
        .unwrap();
    assert_eq!(nearby.len(), 2);
    assert_eq!(nearby[0].id, 4);
    assert!(nearby[0].distance_from_position_km < nearby[1].distance_from_position_km);
}

#[tokio::test]
async fn test_join_and_detail() {
    let api = backend();
    let detail = api.get_session_detail(3).await.unwrap();
    assert_eq!(detail.summary.id, 3);
    assert!(api.join_session(3, "   ").await.is_err());
    api.join_session(3, "Can I join?").await.unwrap();
}

#[tokio::test]
async fn test_keyword_search() {
    let api = backend();
    let page = api.search_sessions("jog", 0, 10).await.unwrap();
    assert_eq!(page.content.len(), 2);
    assert!(page.first && page.last);
}
