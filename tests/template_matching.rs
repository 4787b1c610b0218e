//! Template matcher verification test.
//!
//! Checks the selection rules over a real database:
//! - Only active templates whose range covers the rating match
//! - Narrower ranges beat wider ones
//! - Equal widths fall back to the most recently updated template

use reply_desk::db;
use reply_desk::services::template_engine::match_template;
use tempfile::tempdir;

async fn insert_template(
    pool: &sqlx::Pool<sqlx::Sqlite>,
    name: &str,
    rating_min: i64,
    rating_max: i64,
    is_active: bool,
    updated_at: i64,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO templates (name, content, rating_min, rating_max, is_active, updated_at)
        VALUES (?, 'Thanks {author}!', ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(rating_min)
    .bind(rating_max)
    .bind(is_active)
    .bind(updated_at)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
async fn test_match_respects_rating_range() {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();

    let positive = insert_template(&pool, "positive", 4, 5, true, 100).await;
    let negative = insert_template(&pool, "negative", 1, 2, true, 100).await;

    for rating in 1..=5 {
        let matched = match_template(&pool, rating).await.unwrap();
        match rating {
            1 | 2 => assert_eq!(matched.unwrap().id, negative),
            3 => assert!(matched.is_none(), "rating 3 is covered by no template"),
            4 | 5 => assert_eq!(matched.unwrap().id, positive),
            _ => unreachable!(),
        }
    }
}

#[tokio::test]
async fn test_match_returns_none_without_templates() {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();

    for rating in 1..=5 {
        assert!(match_template(&pool, rating).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_match_ignores_inactive_templates() {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();

    insert_template(&pool, "disabled", 1, 5, false, 100).await;
    assert!(match_template(&pool, 3).await.unwrap().is_none());

    let active = insert_template(&pool, "enabled", 1, 5, true, 50).await;
    assert_eq!(match_template(&pool, 3).await.unwrap().unwrap().id, active);
}

#[tokio::test]
async fn test_narrower_range_wins_tie() {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();

    // Both cover rating 3; [1,3] is narrower than [3,5]... they are equal
    // width, so use [3,3] vs [1,3] to check the narrowness rule first.
    let narrow = insert_template(&pool, "narrow", 3, 3, true, 10).await;
    insert_template(&pool, "wide", 1, 3, true, 999).await;

    let matched = match_template(&pool, 3).await.unwrap().unwrap();
    assert_eq!(matched.id, narrow, "narrower range wins despite older update");
}

#[tokio::test]
async fn test_equal_width_falls_back_to_most_recent_update() {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();

    // Ranges [1,3] and [3,5] both cover rating 3 with equal width
    insert_template(&pool, "older", 1, 3, true, 100).await;
    let newer = insert_template(&pool, "newer", 3, 5, true, 200).await;

    let matched = match_template(&pool, 3).await.unwrap().unwrap();
    assert_eq!(matched.id, newer);
}

#[tokio::test]
async fn test_full_tie_prefers_lower_range_start() {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();

    // Equal width, equal update time: the range starting lower wins
    let low = insert_template(&pool, "low", 1, 3, true, 100).await;
    insert_template(&pool, "high", 3, 5, true, 100).await;

    let matched = match_template(&pool, 3).await.unwrap().unwrap();
    assert_eq!(matched.id, low);
}

#[tokio::test]
async fn test_exact_boundary_ratings_match() {
    let dir = tempdir().unwrap();
    let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();

    let template = insert_template(&pool, "mid", 2, 4, true, 100).await;

    assert_eq!(match_template(&pool, 2).await.unwrap().unwrap().id, template);
    assert_eq!(match_template(&pool, 4).await.unwrap().unwrap().id, template);
    assert!(match_template(&pool, 1).await.unwrap().is_none());
    assert!(match_template(&pool, 5).await.unwrap().is_none());
}
