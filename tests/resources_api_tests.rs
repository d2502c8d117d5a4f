//! Router-level tests for resources, distribution and the dashboard.

mod test_utils;

use axum::http::StatusCode;
use outreach_crm::models::ResourceDistribution;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use test_utils::TestApp;

fn recipients(body: &Value) -> Vec<(String, Option<String>)> {
    let mut pairs: Vec<(String, Option<String>)> = body["distributions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| {
            (
                d["companyId"].as_str().unwrap().to_string(),
                d["tagId"].as_str().map(str::to_string),
            )
        })
        .collect();
    pairs.sort();
    pairs
}

#[tokio::test]
async fn distribution_merges_companies_and_tag_members() {
    let app = TestApp::new().await.unwrap();
    let c1 = app.create_company("One").await;
    let c2 = app.create_company("Two").await;
    let c3 = app.create_company("Three").await;
    let tag = app.create_tag("Leeds", "Region").await;
    for company in [&c2, &c3] {
        let (status, _) = app
            .post(&format!("/companies/{company}/tags"), json!({ "tagId": tag }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let resource = app.create_resource("Careers guide").await;

    let (status, body) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": resource, "companyIds": [c1, c2], "tagIds": [tag] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["created"], 3);

    let mut expected = vec![
        (c1.clone(), None),
        (c2.clone(), Some(tag.clone())),
        (c3.clone(), Some(tag.clone())),
    ];
    expected.sort();
    assert_eq!(recipients(&body), expected);
    assert_eq!(ResourceDistribution::find().count(&app.db).await.unwrap(), 3);

    // Sending again reaches nobody new.
    let (status, again) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": resource, "tagIds": [tag] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(again["created"], 0);
    assert_eq!(ResourceDistribution::find().count(&app.db).await.unwrap(), 3);
}

#[tokio::test]
async fn duplicate_company_ids_collapse() {
    let app = TestApp::new().await.unwrap();
    let company = app.create_company("Acme").await;
    let resource = app.create_resource("Poster").await;

    let (status, body) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": resource, "companyIds": [company, company, company] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], 1);
}

#[tokio::test]
async fn distribution_needs_a_recipient() {
    let app = TestApp::new().await.unwrap();
    let resource = app.create_resource("Poster").await;

    let (status, body) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": resource, "companyIds": [], "tagIds": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, body) = app
        .post("/resources/distribute", json!({ "companyIds": ["1"] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn distribution_to_unknown_targets_is_not_found() {
    let app = TestApp::new().await.unwrap();
    let company = app.create_company("Acme").await;
    let resource = app.create_resource("Poster").await;

    let (status, body) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": "777", "companyIds": [company] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "RESOURCE_NOT_FOUND");

    let (status, body) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": resource, "companyIds": [company, "888"] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "COMPANY_NOT_FOUND");

    let (status, body) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": resource, "companyIds": [company], "tagIds": ["999"] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "TAG_NOT_FOUND");

    assert_eq!(ResourceDistribution::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn clicks_accumulate_and_detail_names_companies() {
    let app = TestApp::new().await.unwrap();
    let company = app.create_company("Acme").await;
    let resource = app.create_resource("Poster").await;

    let (_, body) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": resource, "companyIds": [company] }),
        )
        .await;
    let distribution = body["distributions"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["distributions"][0]["clickCount"], 0);

    for expected in 1..=2 {
        let (status, clicked) = app
            .post(&format!("/distributions/{distribution}/click"), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(clicked["clickCount"], expected);
    }

    let (status, detail) = app.get(&format!("/resources/{resource}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["title"], "Poster");
    assert_eq!(detail["distributions"][0]["companyName"], "Acme");
    assert_eq!(detail["distributions"][0]["clickCount"], 2);

    let (status, body) = app.post("/distributions/5050/click", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "DISTRIBUTION_NOT_FOUND");
}

#[tokio::test]
async fn resource_links_must_be_absolute_urls() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app
        .post("/resources", json!({ "title": "Guide", "link": "not a url" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let (status, created) = app
        .post(
            "/resources",
            json!({ "title": "Guide", "type": "PDF", "link": "https://example.org/guide.pdf" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap();

    let (status, updated) = app
        .put(&format!("/resources/{id}"), json!({ "link": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["link"], Value::Null);
    assert_eq!(updated["type"], "PDF");

    let (_, pdfs) = app.get("/resources?type=PDF").await;
    assert_eq!(pdfs.as_array().unwrap().len(), 1);
    let (_, videos) = app.get("/resources?type=Video").await;
    assert!(videos.as_array().unwrap().is_empty());

    let (status, _) = app.post("/resources", json!({ "title": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_resource_removes_its_distributions() {
    let app = TestApp::new().await.unwrap();
    let company = app.create_company("Acme").await;
    let resource = app.create_resource("Poster").await;
    app.post(
        "/resources/distribute",
        json!({ "resourceId": resource, "companyIds": [company] }),
    )
    .await;

    let (status, _) = app.delete(&format!("/resources/{resource}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(ResourceDistribution::find().count(&app.db).await.unwrap(), 0);

    let (status, _) = app.delete(&format!("/resources/{resource}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_summarises_everything() {
    let app = TestApp::new().await.unwrap();

    let (status, empty) = app.get("/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(empty["counts"]["companies"], 0);
    assert_eq!(empty["totals"]["learnersReached"], 0);
    assert_eq!(empty["totals"]["monetaryValue"], 0.0);
    assert_eq!(empty["totals"]["resourceClicks"], 0);

    let company = app.create_company("Acme").await;
    app.create_company("Contoso").await;
    app.post(
        "/engagements",
        json!({
            "companyId": company,
            "dateOfContact": "2024-01-10",
            "followUps": [
                { "description": "Overdue", "dueDate": "2000-01-01" },
                { "description": "Done", "dueDate": "2000-01-02", "completed": true },
            ],
        }),
    )
    .await;
    app.post(
        "/activities",
        json!({ "companyId": company, "learnerCount": 30, "monetaryValue": 150.5 }),
    )
    .await;
    app.post(
        "/activities",
        json!({ "companyId": company, "learnerCount": 12, "monetaryValue": 49.5 }),
    )
    .await;
    let resource = app.create_resource("Poster").await;
    let (_, sent) = app
        .post(
            "/resources/distribute",
            json!({ "resourceId": resource, "companyIds": [company] }),
        )
        .await;
    let distribution = sent["distributions"][0]["id"].as_str().unwrap().to_string();
    app.post(&format!("/distributions/{distribution}/click"), json!({}))
        .await;

    let (status, dashboard) = app.get("/dashboard").await;
    assert_eq!(status, StatusCode::OK);

    let counts = &dashboard["counts"];
    assert_eq!(counts["companies"], 2);
    assert_eq!(counts["engagements"], 1);
    assert_eq!(counts["activities"], 2);
    assert_eq!(counts["resources"], 1);
    assert_eq!(counts["distributions"], 1);
    assert_eq!(counts["openFollowUps"], 1);
    assert_eq!(counts["overdueFollowUps"], 1);

    let totals = &dashboard["totals"];
    assert_eq!(totals["learnersReached"], 42);
    assert_eq!(totals["monetaryValue"], 200.0);
    assert_eq!(totals["resourceClicks"], 1);

    assert_eq!(dashboard["recentCompanies"].as_array().unwrap().len(), 2);
    assert_eq!(dashboard["recentEngagements"][0]["companyName"], "Acme");
    let upcoming = dashboard["upcomingFollowUps"].as_array().unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0]["description"], "Overdue");
}
