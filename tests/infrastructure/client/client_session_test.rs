use std::time::Duration;

use scribe_gateway::application::ports::ClientError;
use scribe_gateway::infrastructure::backend::{SEED_ADMIN_PASSWORD, SEED_ADMIN_USERNAME};
use scribe_gateway::infrastructure::client::{ClientSession, ClientSubmission};

use crate::helpers::{scaffold_app, serve_app};

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn given_login_when_job_submitted_then_store_picks_it_up_without_waiting_for_tick() {
    let (app, _) = scaffold_app();
    let (base_url, _shutdown) = serve_app(app).await;
    let session = ClientSession::new(&base_url)
        .unwrap()
        .with_poll_interval(Duration::from_secs(3600));
    session
        .login(SEED_ADMIN_USERNAME, SEED_ADMIN_PASSWORD)
        .await
        .unwrap();
    assert!(session.is_polling());

    session
        .submit(ClientSubmission::DriveLink(
            "https://drive.example.com/f/7".into(),
        ))
        .await
        .unwrap();

    let store = session.store();
    wait_until(|| store.len() == 1).await;
}

#[tokio::test]
async fn given_logout_when_done_then_polling_stops_and_store_is_empty() {
    let (app, _) = scaffold_app();
    let (base_url, _shutdown) = serve_app(app).await;
    let session = ClientSession::new(&base_url)
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));
    session
        .login(SEED_ADMIN_USERNAME, SEED_ADMIN_PASSWORD)
        .await
        .unwrap();
    session
        .submit(ClientSubmission::DriveLink(
            "https://drive.example.com/f/8".into(),
        ))
        .await
        .unwrap();
    let store = session.store();
    wait_until(|| store.len() == 1).await;

    session.logout().await.unwrap();

    assert!(!session.is_polling());
    assert!(store.is_empty());
    assert!(!session.client().has_session());
}

#[tokio::test]
async fn given_rejected_session_when_polling_then_store_is_cleared_and_polling_stops() {
    let (app, _) = scaffold_app();
    let (base_url, _shutdown) = serve_app(app).await;
    let session = ClientSession::new(&base_url)
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));
    session
        .login(SEED_ADMIN_USERNAME, SEED_ADMIN_PASSWORD)
        .await
        .unwrap();
    session
        .submit(ClientSubmission::DriveLink(
            "https://drive.example.com/f/9".into(),
        ))
        .await
        .unwrap();
    let store = session.store();
    wait_until(|| store.len() == 1).await;

    session
        .client()
        .set_token(Some("v1.revoked.session".to_string()));

    wait_until(|| session.is_expired()).await;
    wait_until(|| !session.is_polling()).await;
    assert!(store.is_empty());
    assert!(matches!(
        session.client().list_jobs().await,
        Err(ClientError::SessionExpired)
    ));
}

#[test]
fn given_new_session_when_no_interval_given_then_polls_every_five_seconds() {
    let session = ClientSession::new("http://127.0.0.1:3000").unwrap();

    assert_eq!(session.poll_interval(), Duration::from_secs(5));
    assert!(!session.is_polling());
}
