//! Seed data round-trip. DESTRUCTIVE: `populate` clears every table, so this
//! stays behind `#[ignore]` and should run against a scratch database only.

use orgdir::db::Database;
use orgdir::seed;

#[tokio::test]
#[ignore] // Requires a PostgreSQL database (DATABASE_URL); clears all tables
async fn populate_fills_the_directory() {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&url).await.expect("connect failed");

    let summary = seed::populate(&db).await.expect("populate failed");

    assert_eq!(summary.buildings, 7);
    assert_eq!(summary.activities, 30);
    assert_eq!(summary.organizations, 10);
    assert!(summary.phones >= summary.organizations);

    // Five roots, nested to three levels.
    let tree = db.activities().tree().await.expect("tree failed");
    assert_eq!(tree.len(), 5);
    let automotive = tree
        .iter()
        .find(|n| n.record.name == "Automotive")
        .expect("Automotive root missing");
    let cars = automotive
        .children
        .iter()
        .find(|n| n.record.name == "Passenger cars")
        .expect("Passenger cars missing");
    assert!(cars.children.iter().any(|n| n.record.name == "Tyres"));

    // Descendant expansion reaches organizations linked to leaf activities.
    let ids = db
        .activities()
        .descendant_ids(automotive.record.id)
        .await
        .expect("descendant_ids failed");
    let orgs = db
        .organizations()
        .by_activities(&ids, 0, 100)
        .await
        .expect("by_activities failed");
    assert!(orgs.iter().any(|o| o.name == "AutoParts Plus"));
    assert!(orgs.iter().any(|o| o.name == "Premium Motors"));

    // Re-running is idempotent (clear + refill).
    let summary = seed::populate(&db).await.expect("re-populate failed");
    assert_eq!(summary.organizations, 10);
    assert_eq!(
        db.organizations().count_all().await.expect("count failed"),
        10
    );
}
