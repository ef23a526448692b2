//! End-to-end flows against a live PostgreSQL.
//!
//! All tests are `#[ignore]`d so the default suite passes without a database;
//! run them with `DATABASE_URL` set and `cargo test -- --ignored`.

mod common;

use common::{TestApp, unique_suffix};
use serde_json::{Value, json};

async fn create_building(app: &TestApp, address: &str, lat: f64, lon: f64) -> i64 {
    let response = app
        .post(
            "/api/v1/buildings",
            &json!({"address": address, "latitude": lat, "longitude": lon}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("bad json");
    body["id"].as_i64().expect("no id")
}

async fn create_activity(app: &TestApp, name: &str, parent_id: Option<i64>) -> i64 {
    let response = app
        .post(
            "/api/v1/activities",
            &json!({"name": name, "parent_id": parent_id}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 201, "creating activity {name}");
    let body: Value = response.json().await.expect("bad json");
    body["id"].as_i64().expect("no id")
}

#[tokio::test]
#[ignore] // Requires a PostgreSQL database (DATABASE_URL)
async fn building_crud_and_occupancy_rules() {
    let app = TestApp::spawn_with_db().await.expect("spawn failed");
    let tag = unique_suffix();

    let address = format!("1 Test Way {tag}");
    let building_id = create_building(&app, &address, 51.5, -0.12).await;

    // Read it back.
    let response = app
        .get(&format!("/api/v1/buildings/{building_id}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("bad json");
    assert_eq!(body["address"], address.as_str());

    // Update.
    let new_address = format!("2 Test Way {tag}");
    let response = app
        .put(
            &format!("/api/v1/buildings/{building_id}"),
            &json!({"address": new_address, "latitude": 51.6, "longitude": -0.13}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);

    // Address search finds the updated record via the unique tag.
    let response = app
        .get(&format!("/api/v1/buildings?address_query={tag}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);
    let found: Value = response.json().await.expect("bad json");
    assert_eq!(found.as_array().expect("array").len(), 1);
    assert_eq!(found[0]["address"], new_address.as_str());

    // Occupy it, then deletion must be refused.
    let response = app
        .post(
            "/api/v1/organizations",
            &json!({"name": format!("Tenant {tag}"), "building_id": building_id}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 201);
    let org: Value = response.json().await.expect("bad json");
    let org_id = org["id"].as_i64().expect("no id");

    let response = app
        .delete(&format!("/api/v1/buildings/{building_id}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);

    // Vacate and delete.
    let response = app
        .delete(&format!("/api/v1/organizations/{org_id}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 204);

    let response = app
        .delete(&format!("/api/v1/buildings/{building_id}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 204);

    let response = app
        .get(&format!("/api/v1/buildings/{building_id}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore] // Requires a PostgreSQL database (DATABASE_URL)
async fn activity_tree_depth_and_cycle_rules() {
    let app = TestApp::spawn_with_db().await.expect("spawn failed");
    let tag = unique_suffix();

    let root = create_activity(&app, &format!("Root {tag}"), None).await;
    let child = create_activity(&app, &format!("Child {tag}"), Some(root)).await;
    let grandchild = create_activity(&app, &format!("Grandchild {tag}"), Some(child)).await;

    // Fourth level is refused.
    let response = app
        .post(
            "/api/v1/activities",
            &json!({"name": format!("TooDeep {tag}"), "parent_id": grandchild}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);

    // Duplicate sibling names are refused.
    let response = app
        .post(
            "/api/v1/activities",
            &json!({"name": format!("Child {tag}"), "parent_id": root}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);

    // Re-parenting the root under its own descendant is a cycle.
    let response = app
        .put(
            &format!("/api/v1/activities/{root}"),
            &json!({"name": format!("Root {tag}"), "parent_id": child}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);

    // Levels are derived, and the subtree shows up nested.
    let response = app
        .get(&format!("/api/v1/activities/{root}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("bad json");
    assert_eq!(body["level"], 1);
    assert_eq!(body["children"][0]["level"], 2);
    assert_eq!(body["children"][0]["children"][0]["level"], 3);

    // Deleting a node with children is refused; leaf-first works.
    let response = app
        .delete(&format!("/api/v1/activities/{root}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);

    for id in [grandchild, child, root] {
        let response = app
            .delete(&format!("/api/v1/activities/{id}"))
            .await
            .expect("request failed");
        assert_eq!(response.status(), 204);
    }
}

#[tokio::test]
#[ignore] // Requires a PostgreSQL database (DATABASE_URL)
async fn organization_lifecycle_with_filters() {
    let app = TestApp::spawn_with_db().await.expect("spawn failed");
    let tag = unique_suffix();

    let building_id = create_building(&app, &format!("5 Filter Road {tag}"), 48.2, 16.37).await;
    let root = create_activity(&app, &format!("Sector {tag}"), None).await;
    let leaf = create_activity(&app, &format!("Subsector {tag}"), Some(root)).await;

    let name = format!("Filterable Organization {tag}");
    let response = app
        .post(
            "/api/v1/organizations",
            &json!({
                "name": name,
                "building_id": building_id,
                "phone_numbers": ["+43-1-515-0000", "8-800-000-00-01"],
                "activity_ids": [leaf]
            }),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 201);
    let org: Value = response.json().await.expect("bad json");
    let org_id = org["id"].as_i64().expect("no id");
    assert_eq!(org["phones"].as_array().expect("phones").len(), 2);
    assert_eq!(org["building"]["id"].as_i64(), Some(building_id));

    // Full record by id.
    let response = app
        .get(&format!("/api/v1/organizations/{org_id}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);

    // Name search finds it via the unique tag.
    let response = app
        .get(&format!("/api/v1/search?q={tag}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);
    let found: Value = response.json().await.expect("bad json");
    assert!(
        found
            .as_array()
            .expect("array")
            .iter()
            .any(|o| o["id"].as_i64() == Some(org_id))
    );

    // Listed under its building.
    let response = app
        .get(&format!("/api/v1/organizations/by-building/{building_id}"))
        .await
        .expect("request failed");
    let found: Value = response.json().await.expect("bad json");
    assert_eq!(found.as_array().expect("array").len(), 1);

    // The root activity matches through its descendant when children are
    // included, and stops matching when they are not.
    let response = app
        .get(&format!("/api/v1/organizations/by-activity/{root}"))
        .await
        .expect("request failed");
    let found: Value = response.json().await.expect("bad json");
    assert_eq!(found.as_array().expect("array").len(), 1);

    let response = app
        .get(&format!(
            "/api/v1/organizations/by-activity/{root}?include_children=false"
        ))
        .await
        .expect("request failed");
    let found: Value = response.json().await.expect("bad json");
    assert!(found.as_array().expect("array").is_empty());

    // Paginated list with the building filter.
    let response = app
        .get(&format!("/api/v1/organizations?building_id={building_id}"))
        .await
        .expect("request failed");
    let page: Value = response.json().await.expect("bad json");
    assert_eq!(page["total"], 1);
    assert_eq!(page["pages"], 1);
    assert_eq!(page["items"][0]["phone_count"], 2);

    // Partial update: rename and replace the phone set.
    let new_name = format!("Renamed Organization {tag}");
    let response = app
        .put(
            &format!("/api/v1/organizations/{org_id}"),
            &json!({"name": new_name, "phone_numbers": ["+43-1-515-9999"]}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.expect("bad json");
    assert_eq!(updated["name"], new_name.as_str());
    assert_eq!(updated["phones"].as_array().expect("phones").len(), 1);
    // Activities were not part of the update and must survive.
    assert_eq!(updated["activities"].as_array().expect("activities").len(), 1);

    // Creating against a missing building is a 400.
    let response = app
        .post(
            "/api/v1/organizations",
            &json!({"name": format!("Orphan {tag}"), "building_id": 0}),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);

    // An activity with members cannot be deleted.
    let response = app
        .delete(&format!("/api/v1/activities/{leaf}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 400);

    // Cleanup.
    let response = app
        .delete(&format!("/api/v1/organizations/{org_id}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 204);
    for id in [leaf, root] {
        app.delete(&format!("/api/v1/activities/{id}"))
            .await
            .expect("request failed");
    }
    app.delete(&format!("/api/v1/buildings/{building_id}"))
        .await
        .expect("request failed");

    let response = app
        .get(&format!("/api/v1/organizations/{org_id}"))
        .await
        .expect("request failed");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore] // Requires a PostgreSQL database (DATABASE_URL)
async fn geo_search_radius_and_rectangle() {
    let app = TestApp::spawn_with_db().await.expect("spawn failed");
    let tag = unique_suffix();

    // A point far from the seed data set.
    let (lat, lon) = (-45.8742, 170.5036);
    let building_id = create_building(&app, &format!("9 Remote Quay {tag}"), lat, lon).await;

    let response = app
        .post(
            "/api/v1/organizations",
            &json!({
                "name": format!("Remote Depot {tag}"),
                "building_id": building_id,
                "phone_numbers": ["+64-3-477-0000"]
            }),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 201);
    let org: Value = response.json().await.expect("bad json");
    let org_id = org["id"].as_i64().expect("no id");

    // Radius search around the building finds it.
    let response = app
        .post(
            "/api/v1/organizations/geo-search",
            &json!({
                "latitude": lat,
                "longitude": lon,
                "search_type": "radius",
                "radius_km": 2.0
            }),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);
    let found: Value = response.json().await.expect("bad json");
    assert!(
        found
            .as_array()
            .expect("array")
            .iter()
            .any(|o| o["id"].as_i64() == Some(org_id))
    );

    // A radius centered 100 km away misses it.
    let response = app
        .post(
            "/api/v1/organizations/geo-search",
            &json!({
                "latitude": lat + 1.0,
                "longitude": lon,
                "search_type": "radius",
                "radius_km": 2.0
            }),
        )
        .await
        .expect("request failed");
    let found: Value = response.json().await.expect("bad json");
    assert!(
        !found
            .as_array()
            .expect("array")
            .iter()
            .any(|o| o["id"].as_i64() == Some(org_id))
    );

    // Rectangle around the point finds it.
    let response = app
        .post(
            "/api/v1/organizations/geo-search",
            &json!({
                "latitude": lat,
                "longitude": lon,
                "search_type": "rectangle",
                "north_lat": lat + 0.1,
                "south_lat": lat - 0.1,
                "east_lng": lon + 0.1,
                "west_lng": lon - 0.1
            }),
        )
        .await
        .expect("request failed");
    assert_eq!(response.status(), 200);
    let found: Value = response.json().await.expect("bad json");
    assert!(
        found
            .as_array()
            .expect("array")
            .iter()
            .any(|o| o["id"].as_i64() == Some(org_id))
    );

    // Cleanup.
    app.delete(&format!("/api/v1/organizations/{org_id}"))
        .await
        .expect("request failed");
    app.delete(&format!("/api/v1/buildings/{building_id}"))
        .await
        .expect("request failed");
}
