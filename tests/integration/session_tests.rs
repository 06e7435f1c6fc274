use super::*;
use price_bridge::{PageFetcher, SessionState};
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_session_signs_in_once_and_is_reused() {
    let app = create_test_app(false);
    assert_eq!(app.session.state().await, SessionState::Uninitialized);

    let first = app.lookup.lookup("parafuso 10mm").await;
    let second = app.lookup.lookup("martelo unha").await;

    assert!(first.is_match());
    assert!(second.is_match());
    assert_eq!(first.found_name.as_deref(), Some("Parafuso 10mm Phillips"));
    assert_eq!(second.found_name.as_deref(), Some("Martelo Unha"));
    assert_eq!(app.launches.load(Ordering::SeqCst), 1);
    assert_eq!(app.session.state().await, SessionState::Authenticated);
}

#[tokio::test]
async fn test_search_timeout_keeps_session_usable() {
    let app = create_test_app(false);

    let timed_out = app.lookup.lookup("serra circular").await;
    let error = timed_out.error.as_deref().unwrap();
    assert!(error.starts_with("search failed: Timed out after 1s"));
    assert_eq!(timed_out.url_searched, None);
    assert_eq!(app.session.state().await, SessionState::Authenticated);

    let next = app.lookup.lookup("parafuso 10mm").await;
    assert!(next.is_match());
    assert_eq!(app.launches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_best_attempt_reported_below_threshold() {
    let app = create_test_app(false);

    let result = app.lookup.lookup("furadeira").await;

    assert!(!result.is_match());
    assert_eq!(result.found_name, None);
    assert_eq!(result.match_score, None);
    let error = result.error.unwrap();
    assert!(error.contains("Best attempt was 'Alicate Universal' with score"));
}

#[tokio::test]
async fn test_empty_results_page() {
    let app = create_test_app(false);

    let result = app.lookup.lookup("vazio").await;

    assert_eq!(result.error.as_deref(), Some("no product containers found"));
    assert_eq!(result.original_query.as_deref(), Some("vazio"));
}

#[tokio::test]
async fn test_failed_launch_is_terminal() {
    let app = create_test_app(true);

    assert!(!app.session.ensure_session().await);
    assert!(!app.session.ensure_session().await);
    assert!(matches!(app.session.state().await, SessionState::Failed(_)));

    let result = app.lookup.lookup("parafuso 10mm").await;
    assert_eq!(result.error.as_deref(), Some("scraper not operational"));
    assert_eq!(app.launches.load(Ordering::SeqCst), 1);

    let fetched = app.session.fetch_page("https://shop.test/").await;
    assert!(matches!(fetched, Err(price_bridge::AppError::SessionUnavailable)));
}
