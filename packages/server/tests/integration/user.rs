use serde_json::json;

use crate::common::{TestApp, routes};

fn ada() -> serde_json::Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
    })
}

#[tokio::test]
async fn create_returns_201_with_id() {
    let app = TestApp::spawn().await;

    let res = app.post(routes::USERS, &ada()).await;

    assert_eq!(res.status, 201, "Response: {}", res.text);
    assert!(!res.id().is_empty());
    assert_eq!(res.body["first_name"], "Ada");
    assert_eq!(res.body["last_name"], "Lovelace");
    assert_eq!(res.body["email"], "ada@example.com");
}

#[tokio::test]
async fn create_normalizes_email() {
    let app = TestApp::spawn().await;

    let res = app
        .post(
            routes::USERS,
            &json!({
                "first_name": " Ada ",
                "last_name": "Lovelace",
                "email": " Ada@Example.COM ",
            }),
        )
        .await;

    assert_eq!(res.status, 201, "Response: {}", res.text);
    assert_eq!(res.body["first_name"], "Ada");
    assert_eq!(res.body["email"], "ada@example.com");
}

#[tokio::test]
async fn duplicate_email_returns_409() {
    let app = TestApp::spawn().await;
    app.create_user("Ada", "Lovelace", "ada@example.com").await;

    let res = app
        .post(
            routes::USERS,
            &json!({
                "first_name": "Augusta",
                "last_name": "King",
                "email": "ADA@example.com",
            }),
        )
        .await;

    assert_eq!(res.status, 409, "Response: {}", res.text);
    assert_eq!(res.body["code"], "CONFLICT");

    let list = app.get(routes::USERS).await;
    assert_eq!(list.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_payloads_return_400() {
    let app = TestApp::spawn().await;

    let cases = [
        json!({ "first_name": "", "last_name": "Lovelace", "email": "ada@example.com" }),
        json!({ "first_name": "Ada", "last_name": "x".repeat(101), "email": "ada@example.com" }),
        json!({ "first_name": "Ada", "last_name": "Lovelace", "email": "not-an-email" }),
        json!({ "first_name": "Ada", "last_name": "Lovelace" }),
    ];

    for body in cases {
        let res = app.post(routes::USERS, &body).await;
        assert_eq!(res.status, 400, "Body {body} gave: {}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn list_returns_every_user() {
    let app = TestApp::spawn().await;
    app.create_user("Ada", "Lovelace", "ada@example.com").await;
    app.create_user("Charles", "Babbage", "charles@example.com").await;

    let res = app.get(routes::USERS).await;

    assert_eq!(res.status, 200);
    let emails: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails.len(), 2);
    assert!(emails.contains(&"ada@example.com"));
    assert!(emails.contains(&"charles@example.com"));
}

#[tokio::test]
async fn get_returns_user_or_404() {
    let app = TestApp::spawn().await;
    let id = app.create_user("Ada", "Lovelace", "ada@example.com").await;

    let res = app.get(&routes::user(&id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.id(), id);

    let missing = app.get(&routes::user(&uuid::Uuid::now_v7().to_string())).await;
    assert_eq!(missing.status, 404);
    assert_eq!(missing.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_id_returns_400() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::user("not-a-uuid")).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let app = TestApp::spawn().await;
    let id = app.create_user("Ada", "Lovelace", "ada@example.com").await;

    let res = app
        .patch(&routes::user(&id), &json!({ "last_name": "King" }))
        .await;

    assert_eq!(res.status, 200, "Response: {}", res.text);
    assert_eq!(res.body["first_name"], "Ada");
    assert_eq!(res.body["last_name"], "King");
    assert_eq!(res.body["email"], "ada@example.com");

    let fetched = app.get(&routes::user(&id)).await;
    assert_eq!(fetched.body["last_name"], "King");
}

#[tokio::test]
async fn update_rejects_empty_body_and_taken_email() {
    let app = TestApp::spawn().await;
    app.create_user("Ada", "Lovelace", "ada@example.com").await;
    let id = app.create_user("Charles", "Babbage", "charles@example.com").await;

    let empty = app.patch(&routes::user(&id), &json!({})).await;
    assert_eq!(empty.status, 400);

    let taken = app
        .patch(&routes::user(&id), &json!({ "email": "ada@example.com" }))
        .await;
    assert_eq!(taken.status, 409, "Response: {}", taken.text);

    let missing = app
        .patch(
            &routes::user(&uuid::Uuid::now_v7().to_string()),
            &json!({ "first_name": "Nobody" }),
        )
        .await;
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn delete_returns_removed_user_then_404() {
    let app = TestApp::spawn().await;
    let id = app.create_user("Ada", "Lovelace", "ada@example.com").await;

    let res = app.delete(&routes::user(&id)).await;
    assert_eq!(res.status, 200, "Response: {}", res.text);
    assert_eq!(res.id(), id);

    assert_eq!(app.get(&routes::user(&id)).await.status, 404);
    assert_eq!(app.delete(&routes::user(&id)).await.status, 404);
}

#[tokio::test]
async fn email_is_reusable_after_delete() {
    let app = TestApp::spawn().await;
    let id = app.create_user("Ada", "Lovelace", "ada@example.com").await;
    app.delete(&routes::user(&id)).await;

    let res = app.post(routes::USERS, &ada()).await;

    assert_eq!(res.status, 201, "Response: {}", res.text);
    assert_ne!(res.id(), id);
}

#[tokio::test]
async fn concurrent_deletes_return_the_user_once() {
    let app = TestApp::spawn().await;
    let id = app.create_user("Ada", "Lovelace", "ada@example.com").await;

    let path = routes::user(&id);
    let (a, b, c, d) = tokio::join!(
        app.delete(&path),
        app.delete(&path),
        app.delete(&path),
        app.delete(&path),
    );

    let statuses = [a.status, b.status, c.status, d.status];
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1, "{statuses:?}");
    assert_eq!(statuses.iter().filter(|s| **s == 404).count(), 3, "{statuses:?}");
}

#[tokio::test]
async fn repository_delete_yields_the_row_to_one_caller() {
    use server::repository::{SeaOrmUserRepository, UserRepository};

    let app = TestApp::spawn().await;
    let id: uuid::Uuid = app
        .create_user("Ada", "Lovelace", "ada@example.com")
        .await
        .parse()
        .unwrap();
    let repo = SeaOrmUserRepository::new(app.db.clone());

    let (a, b, c) = tokio::join!(
        repo.delete_by_id(id),
        repo.delete_by_id(id),
        repo.delete_by_id(id),
    );

    let removed = [a.unwrap(), b.unwrap(), c.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn update_racing_delete_never_fails_internally() {
    let app = TestApp::spawn().await;
    let id = app.create_user("Ada", "Lovelace", "ada@example.com").await;

    let path = routes::user(&id);
    let body = json!({ "last_name": "King" });
    let (updated, deleted) = tokio::join!(
        app.patch(&path, &body),
        app.delete(&path),
    );

    assert_eq!(deleted.status, 200, "Response: {}", deleted.text);
    assert!(
        updated.status == 200 || updated.status == 404,
        "Unexpected update outcome {}: {}",
        updated.status,
        updated.text
    );
}
