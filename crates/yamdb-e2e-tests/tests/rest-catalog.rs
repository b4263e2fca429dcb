use reqwest::StatusCode;
use serde_json::json;
use tracing::info;
use tracing_test::traced_test;
use yamdb_e2e_tests::{
    TestUser, launch_env, login_as, prepare_env,
    rest::{create_category, create_genre, create_title, error_code},
};
use yamdb_types::claim::Role;

#[tokio::test]
#[traced_test]
async fn test_catalog_permissions() {
    let (args, _config_guard) = prepare_env("test_catalog_permissions").await.unwrap();
    let login_args = args.clone();
    let (admin, api) = launch_env(args, TestUser::Admin).await.unwrap();
    let moderator = login_as(&login_args, "moderator", Role::Moderator)
        .await
        .unwrap();
    let anonymous = reqwest::Client::new();

    let payload = json!({"name": "Film", "slug": "film"});
    let response = anonymous
        .post(api.join("categories").unwrap())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = moderator
        .post(api.join("categories").unwrap())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(response).await.unwrap(), "FORBIDDEN");

    let category = create_category(&admin, &api, "Film", "film").await.unwrap();
    assert_eq!(category.slug, "film");

    let response = admin
        .post(api.join("categories").unwrap())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = admin
        .post(api.join("genres").unwrap())
        .json(&json!({"name": "Bad", "slug": "bad slug!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = anonymous
        .get(api.join("categories/").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["rows"][0], json!({"name": "Film", "slug": "film"}));

    let response = moderator
        .delete(api.join("categories/film").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = admin
        .delete(api.join("categories/film/").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = admin
        .delete(api.join("categories/film").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[traced_test]
async fn test_titles() {
    let (args, _config_guard) = prepare_env("test_titles").await.unwrap();
    let (admin, api) = launch_env(args, TestUser::Admin).await.unwrap();

    create_category(&admin, &api, "Book", "book").await.unwrap();
    create_genre(&admin, &api, "Drama", "drama").await.unwrap();
    create_genre(&admin, &api, "Comedy", "comedy").await.unwrap();

    let title = create_title(&admin, &api, "Hamlet", 1603, Some("book"), &["drama"])
        .await
        .unwrap();
    info!("Created title {title:?}");
    assert_eq!(title.category.as_ref().unwrap().slug, "book");
    assert_eq!(title.genre.len(), 1);
    assert!(title.rating.is_none());

    let response = admin
        .post(api.join("titles").unwrap())
        .json(&json!({"name": "Future", "year": 2099}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await.unwrap(), "VALIDATION_ERROR");

    let response = admin
        .post(api.join("titles").unwrap())
        .json(&json!({"name": "Lost", "year": 2000, "category": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    create_title(&admin, &api, "Tartuffe", 1664, None, &["comedy"])
        .await
        .unwrap();

    let response = reqwest::get(api.join("titles?genre=comedy").unwrap())
        .await
        .unwrap();
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["rows"][0]["name"], "Tartuffe");

    let response = reqwest::get(api.join("titles?search=ham").unwrap())
        .await
        .unwrap();
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["rows"][0]["name"], "Hamlet");

    let response = reqwest::get(api.join("titles?sort=-year&page_size=1").unwrap())
        .await
        .unwrap();
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["rows"][0]["name"], "Tartuffe");

    let response = reqwest::get(api.join("titles?sort=unknown").unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await.unwrap(), "INVALID_QUERY");

    let response = reqwest::get(api.join("titles?page_size=5000").unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let url = api.join(&format!("titles/{}", title.id)).unwrap();
    let response = admin
        .patch(url.clone())
        .json(&json!({"genre": ["drama", "comedy"], "description": "Tragedy"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["genre"].as_array().unwrap().len(), 2);
    assert_eq!(updated["description"], "Tragedy");

    let response = admin.patch(url.clone()).json(&json!({})).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = admin.delete(url.clone()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = reqwest::get(url).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
