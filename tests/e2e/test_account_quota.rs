use crate::e2e::helpers;

use chrono::Days;
use helpers::TestContext;
use pretty_assertions::assert_eq;
use replygate_backend::domain::quota::{QuotaCommit, QuotaIdentity, QuotaStore, QuotaStoreError};
use replygate_backend::domain::usage::{Tier, UsageCounters, UsagePolicy};
use replygate_backend::infrastructure::repositories::{AccountQuotaStore, UserRepository};
use std::sync::Arc;
use test_context::test_context;

fn account_store(ctx: &TestContext) -> AccountQuotaStore {
    let user_repo = Arc::new(UserRepository::new(Arc::new(ctx.pool.clone())));
    AccountQuotaStore::new(user_repo, *UsagePolicy::default().limits())
}

fn free_commit(previous: &UsageCounters) -> QuotaCommit {
    let policy = UsagePolicy::default();
    QuotaCommit {
        previous: previous.clone(),
        next: policy.apply(previous, Tier::Free, true),
        daily_limit: policy.limits().daily_limit(Tier::Free),
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_count_a_commit_from_yesterday_in_todays_window(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("late@example.com").await.unwrap();
    let identity = QuotaIdentity::Account(user.id);
    let store = account_store(ctx);
    let yesterday = ctx.today - Days::new(1);
    ctx.fixtures.set_usage(user.id, 3, yesterday).await.unwrap();
    let loaded_yesterday = store.load(&identity, yesterday).await.unwrap();

    ctx.fixtures.set_usage(user.id, 10, ctx.today).await.unwrap();
    let stored = store
        .commit(&identity, &free_commit(&loaded_yesterday), ctx.today)
        .await
        .unwrap();

    assert_eq!(stored.daily_replies, 11);
    assert_eq!(stored.last_reset_date, ctx.today);
    assert_eq!(ctx.fixtures.get_usage(user.id).await.unwrap(), (11, ctx.today));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_never_move_the_stored_day_backwards(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("skewed@example.com").await.unwrap();
    let identity = QuotaIdentity::Account(user.id);
    let store = account_store(ctx);
    ctx.fixtures.set_usage(user.id, 10, ctx.today).await.unwrap();
    let loaded = store.load(&identity, ctx.today).await.unwrap();
    let yesterday = ctx.today - Days::new(1);

    let reloaded = store.load(&identity, yesterday).await.unwrap();
    assert_eq!(reloaded, loaded);

    store
        .commit(&identity, &free_commit(&loaded), yesterday)
        .await
        .unwrap();

    assert_eq!(ctx.fixtures.get_usage(user.id).await.unwrap(), (11, ctx.today));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_restart_a_stale_counter_on_commit(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("stale@example.com").await.unwrap();
    let identity = QuotaIdentity::Account(user.id);
    let store = account_store(ctx);
    ctx.fixtures.set_usage(user.id, 50, ctx.today - Days::new(1)).await.unwrap();

    let stored = store
        .commit(&identity, &free_commit(&UsageCounters::fresh(ctx.today)), ctx.today)
        .await
        .unwrap();

    assert_eq!(stored.daily_replies, 1);
    assert_eq!(ctx.fixtures.get_usage(user.id).await.unwrap(), (1, ctx.today));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refuse_a_commit_past_the_cap(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("full@example.com").await.unwrap();
    let identity = QuotaIdentity::Account(user.id);
    let store = account_store(ctx);
    ctx.fixtures.set_usage(user.id, 49, ctx.today).await.unwrap();
    let loaded = store.load(&identity, ctx.today).await.unwrap();
    ctx.fixtures.set_usage(user.id, 50, ctx.today).await.unwrap();

    let result = store.commit(&identity, &free_commit(&loaded), ctx.today).await;

    assert!(matches!(result, Err(QuotaStoreError::LimitReached)));
    assert_eq!(ctx.fixtures.get_usage(user.id).await.unwrap(), (50, ctx.today));
}
