//! Router-level tests for companies, tags, activities and files.

mod test_utils;

use axum::http::StatusCode;
use chrono::Utc;
use outreach_crm::models::company;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde_json::{Value, json};
use test_utils::TestApp;

fn tag_names(company: &Value) -> Vec<String> {
    company["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tag| tag["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn create_then_get_company_round_trips_fields() {
    let app = TestApp::new().await.unwrap();

    let (status, created) = app
        .post(
            "/companies",
            json!({
                "name": "  Acme Engineering ",
                "sector": "Engineering",
                "signupCategories": "[\"Careers fair\",\"Mentoring\"]",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].is_string());
    assert_eq!(created["signupCategories"], json!(["Careers fair", "Mentoring"]));

    let id = created["id"].as_str().unwrap();
    let (status, detail) = app.get(&format!("/companies/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Acme Engineering");
    assert_eq!(detail["sector"], "Engineering");
    assert_eq!(detail["engagements"], json!([]));
    assert_eq!(detail["activities"], json!([]));
    assert_eq!(detail["files"], json!([]));
}

#[tokio::test]
async fn create_company_without_name_is_rejected() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app.post("/companies", json!({ "sector": "Retail" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn list_companies_filters_by_search_and_tag() {
    let app = TestApp::new().await.unwrap();
    let digital = app.create_tag("Digital", "Sector").await;

    app.create_company("Northwind Traders").await;
    let (_, tagged) = app
        .post("/companies", json!({ "name": "Contoso", "tagIds": [digital] }))
        .await;

    let (status, found) = app.get("/companies?search=NORTH").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Northwind Traders");

    let (_, by_tag) = app.get(&format!("/companies?tagId={digital}")).await;
    assert_eq!(by_tag.as_array().unwrap().len(), 1);
    assert_eq!(by_tag[0]["id"], tagged["id"]);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let app = TestApp::new().await.unwrap();
    app.create_company("Northwind Traders").await;
    app.create_company("Contoso").await;
    app.create_company("100% Careers_Hub").await;

    for search in ["_", "%25", "%25%25"] {
        let (status, found) = app.get(&format!("/companies?search={search}")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = found
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        if search == "%25%25" {
            assert!(names.is_empty(), "{search}: {names:?}");
        } else {
            assert_eq!(names, vec!["100% Careers_Hub"], "{search}");
        }
    }
}

#[tokio::test]
async fn tag_ids_replace_only_when_present() {
    let app = TestApp::new().await.unwrap();
    let sector = app.create_tag("Digital", "Sector").await;
    let location = app.create_tag("Leeds", "Location").await;

    let (status, created) = app
        .post(
            "/companies",
            json!({ "name": "Acme", "tagIds": [sector.clone(), location.parse::<i64>().unwrap()] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(tag_names(&created), vec!["Leeds", "Digital"]);
    let id = created["id"].as_str().unwrap();

    // Absent tagIds keeps the links.
    let (status, updated) = app
        .put(&format!("/companies/{id}"), json!({ "notes": "Met at fair" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "Met at fair");
    assert_eq!(tag_names(&updated).len(), 2);

    // A present list replaces the set.
    let (_, updated) = app
        .put(&format!("/companies/{id}"), json!({ "tagIds": [sector] }))
        .await;
    assert_eq!(tag_names(&updated), vec!["Digital"]);

    // An empty list clears it.
    let (_, updated) = app
        .put(&format!("/companies/{id}"), json!({ "tagIds": [] }))
        .await;
    assert!(tag_names(&updated).is_empty());
    assert_eq!(updated["name"], "Acme");
}

#[tokio::test]
async fn company_update_with_unknown_tag_changes_nothing() {
    let app = TestApp::new().await.unwrap();
    let id = app.create_company("Acme").await;

    let (status, body) = app
        .put(&format!("/companies/{id}"), json!({ "name": "Renamed", "tagIds": ["999"] }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TAG_NOT_FOUND");

    let (_, detail) = app.get(&format!("/companies/{id}")).await;
    assert_eq!(detail["name"], "Acme");
}

#[tokio::test]
async fn deleting_a_company_cascades() {
    let app = TestApp::new().await.unwrap();
    let id = app.create_company("Acme").await;
    let tag = app.create_tag("Digital", "Sector").await;

    let (status, _) = app
        .post(&format!("/companies/{id}/tags"), json!({ "tagId": tag }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post(
            "/engagements",
            json!({
                "companyId": id,
                "dateOfContact": "2024-03-01",
                "followUps": [{ "description": "Send pack" }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post("/activities", json!({ "companyId": id, "learnerCount": 12 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .post(
            "/files",
            json!({ "companyId": id, "name": "Agreement", "url": "https://files.example.org/a.pdf" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.delete(&format!("/companies/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = app.get(&format!("/companies/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COMPANY_NOT_FOUND");

    for path in ["/engagements", "/activities", "/files", "/follow-ups"] {
        let (status, rows) = app.get(path).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rows, json!([]), "{path} should be empty");
    }

    let (_, tags) = app.get("/tags").await;
    assert_eq!(tags[0]["companyCount"], 0);
}

#[tokio::test]
async fn ids_above_float_precision_survive_the_round_trip() {
    let app = TestApp::new().await.unwrap();
    let now = Utc::now();
    company::ActiveModel {
        id: Set(1_060_000_000_000_000_001),
        name: Set("Big Id Ltd".to_string()),
        signup_categories: Set("[]".to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(&app.db)
    .await
    .unwrap();

    let (status, detail) = app.get("/companies/1060000000000000001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["id"], "1060000000000000001");

    let (status, engagement) = app
        .post("/engagements", json!({ "companyId": "1060000000000000001" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(engagement["companyId"], "1060000000000000001");
    assert_eq!(engagement["companyName"], "Big Id Ltd");
}

#[tokio::test]
async fn non_numeric_path_id_is_a_bad_request() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app.get("/companies/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ID");
}

#[tokio::test]
async fn tags_are_listed_by_type_then_name_with_counts() {
    let app = TestApp::new().await.unwrap();
    let digital = app.create_tag("Digital", "Sector").await;
    app.create_tag("Leeds", "Location").await;
    app.create_tag("Arts", "Sector").await;
    app.post("/companies", json!({ "name": "Acme", "tagIds": [digital] }))
        .await;

    let (status, tags) = app.get("/tags").await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<(&str, &str, i64)> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|tag| {
            (
                tag["type"].as_str().unwrap(),
                tag["name"].as_str().unwrap(),
                tag["companyCount"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        listed,
        vec![
            ("Location", "Leeds", 0),
            ("Sector", "Arts", 0),
            ("Sector", "Digital", 1),
        ]
    );

    let (_, sectors) = app.get("/tags?type=Sector").await;
    assert_eq!(sectors.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_tag_is_a_conflict_and_blank_fields_are_rejected() {
    let app = TestApp::new().await.unwrap();
    app.create_tag("Digital", "Sector").await;

    let (status, body) = app
        .post("/tags", json!({ "name": "Digital", "type": "Sector" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = app.post("/tags", json!({ "name": " ", "type": "Sector" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn attaching_twice_is_idempotent_and_detach_unlinks() {
    let app = TestApp::new().await.unwrap();
    let id = app.create_company("Acme").await;
    let tag = app.create_tag("Digital", "Sector").await;

    for _ in 0..2 {
        let (status, tags) = app
            .post(&format!("/companies/{id}/tags"), json!({ "tagId": tag }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tags.as_array().unwrap().len(), 1);
    }

    let (status, _) = app.delete(&format!("/companies/{id}/tags/{tag}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.delete(&format!("/companies/{id}/tags/{tag}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TAG_NOT_FOUND");
}

#[tokio::test]
async fn activity_for_missing_company_inserts_nothing() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app
        .post("/activities", json!({ "companyId": "424242", "learnerCount": 30 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COMPANY_NOT_FOUND");

    let stored = outreach_crm::models::AdditionalActivity::find()
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn activity_rejects_negative_values_and_keeps_omitted_fields() {
    let app = TestApp::new().await.unwrap();
    let company_id = app.create_company("Acme").await;

    let (status, body) = app
        .post("/activities", json!({ "companyId": company_id, "learnerCount": -1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, created) = app
        .post(
            "/activities",
            json!({
                "companyId": company_id,
                "activityDate": "2024-05-10",
                "toolsDelivered": "CV builder, Mock interview",
                "workshop": "true",
                "learnerCount": "25",
                "monetaryValue": 120.5,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["toolsDelivered"], json!(["CV builder", "Mock interview"]));
    assert_eq!(created["workshop"], true);
    assert_eq!(created["learnerCount"], 25);

    let id = created["id"].as_str().unwrap();
    let (status, updated) = app
        .put(&format!("/activities/{id}"), json!({ "notes": "Went well" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "Went well");
    assert_eq!(updated["learnerCount"], 25);
    assert_eq!(updated["monetaryValue"], 120.5);
    assert_eq!(updated["activityDate"], "2024-05-10");
}

#[tokio::test]
async fn files_require_an_absolute_url() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app
        .post("/files", json!({ "name": "Agreement", "url": "not a url" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = app
        .post("/files", json!({ "name": "Agreement", "url": "https://x.example.org/a", "companyId": "77" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COMPANY_NOT_FOUND");

    let (status, file) = app
        .post("/files", json!({ "name": "Agreement", "type": "pdf", "url": "https://x.example.org/a" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(file["companyId"], Value::Null);

    let id = file["id"].as_str().unwrap();
    let (status, _) = app.delete(&format!("/files/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app.delete(&format!("/files/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "FILE_NOT_FOUND");
}
