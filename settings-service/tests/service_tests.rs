use std::sync::Arc;

use common::error::Error;
use common::model::settings::DEFAULT_COMMISSION_RATE_KEY;
use common::model::user::Actor;
use common::money::dec;
use settings_service::{InMemorySettingsRepository, SettingsService};

fn admin() -> Actor {
    Actor::super_admin("admin-1")
}

fn service_with_repo() -> (SettingsService, Arc<InMemorySettingsRepository>) {
    let repo = Arc::new(InMemorySettingsRepository::new());
    (SettingsService::new(repo.clone()), repo)
}

#[tokio::test]
async fn first_read_initializes_and_persists_the_default() {
    let (service, repo) = service_with_repo();

    assert!(repo.settings.is_empty());

    let rate = service.default_commission_rate().await.unwrap();
    assert_eq!(rate, dec!(20.00));

    // The row is persisted, and a second read sees the same value
    let stored = repo.settings.get(DEFAULT_COMMISSION_RATE_KEY).unwrap().clone();
    assert_eq!(stored.value, "20.00");

    let again = service.default_commission_rate().await.unwrap();
    assert_eq!(again, rate);
    assert_eq!(repo.settings.len(), 1);
}

#[tokio::test]
async fn concurrent_first_reads_converge_on_one_row() {
    let (service, repo) = service_with_repo();

    let (a, b) = tokio::join!(
        service.default_commission_rate(),
        service.default_commission_rate()
    );

    assert_eq!(a.unwrap(), dec!(20.00));
    assert_eq!(b.unwrap(), dec!(20.00));
    assert_eq!(repo.settings.len(), 1);
}

#[tokio::test]
async fn update_persists_and_records_the_acting_user() {
    let (service, repo) = service_with_repo();

    let updated = service
        .update_default_commission_rate(&admin(), dec!(25))
        .await
        .unwrap();
    assert_eq!(updated, dec!(25.00));

    let rate = service.default_commission_rate().await.unwrap();
    assert_eq!(rate, dec!(25.00));

    let stored = repo.settings.get(DEFAULT_COMMISSION_RATE_KEY).unwrap().clone();
    assert_eq!(stored.updated_by.as_deref(), Some("admin-1"));
}

#[tokio::test]
async fn update_rejects_rates_outside_bounds() {
    let (service, _repo) = service_with_repo();

    let low = service
        .update_default_commission_rate(&admin(), dec!(-1))
        .await;
    assert!(matches!(low, Err(Error::InvalidCommissionRate(_))));

    let high = service
        .update_default_commission_rate(&admin(), dec!(100.01))
        .await;
    assert!(matches!(high, Err(Error::InvalidCommissionRate(_))));

    // Inclusive bounds are fine
    service
        .update_default_commission_rate(&admin(), dec!(0))
        .await
        .unwrap();
    service
        .update_default_commission_rate(&admin(), dec!(100))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_requires_the_admin_role() {
    let (service, _repo) = service_with_repo();

    let result = service
        .update_default_commission_rate(&Actor::agent("agent-1"), dec!(25))
        .await;

    assert!(matches!(result, Err(Error::AuthorizationError(_))));
}

#[tokio::test]
async fn listing_settings_is_admin_only() {
    let (service, _repo) = service_with_repo();

    service.default_commission_rate().await.unwrap();

    let listed = service.list_settings(&admin()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].key, DEFAULT_COMMISSION_RATE_KEY);

    let denied = service.list_settings(&Actor::agent("agent-1")).await;
    assert!(matches!(denied, Err(Error::AuthorizationError(_))));
}
