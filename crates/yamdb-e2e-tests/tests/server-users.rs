use reqwest::StatusCode;
use serde_json::json;
use tracing_test::traced_test;
use yamdb_dal::user::UpdateUser;
use yamdb_e2e_tests::{
    TestUser, api_url, authorized_client, create_staff_user, launch_env, login_as, modify_user,
    obtain_token, prepare_env,
};
use yamdb_types::claim::Role;

#[tokio::test]
#[traced_test]
async fn test_users_admin() {
    let (args, _config_guard) = prepare_env("test_users_admin").await.unwrap();
    let login_args = args.clone();
    let (admin, api) = launch_env(args, TestUser::Admin).await.unwrap();

    let response = admin
        .post(api.join("users/").unwrap())
        .json(&json!({"username": "reviewer", "email": "reviewer@example.com", "role": "moderator"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: serde_json::Value = response.json().await.unwrap();
    assert_eq!(user["role"], "moderator");
    assert_eq!(user["bio"], "");

    let response = admin
        .get(api.join("users?search=view").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["rows"][0]["username"], "reviewer");

    let response = admin
        .patch(api.join("users/reviewer").unwrap())
        .json(&json!({"bio": "Film lover", "role": "user"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user: serde_json::Value = response.json().await.unwrap();
    assert_eq!(user["bio"], "Film lover");
    assert_eq!(user["role"], "user");

    let response = admin
        .patch(api.join("users/reviewer").unwrap())
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = admin
        .delete(api.join("users/reviewer/").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = admin
        .get(api.join("users/reviewer").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // plain user cannot manage users
    let critic = login_as(&login_args, "critic", Role::User).await.unwrap();
    let response = critic.get(api.join("users").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = reqwest::get(api.join("users").unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[traced_test]
async fn test_me_cannot_change_role() {
    let (args, _config_guard) = prepare_env("test_me").await.unwrap();
    let (client, api) = launch_env(args, TestUser::User).await.unwrap();

    let response = client
        .patch(api.join("users/me/").unwrap())
        .json(&json!({"first_name": "Karel", "role": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me: serde_json::Value = response.json().await.unwrap();
    assert_eq!(me["first_name"], "Karel");
    assert_eq!(me["role"], "user");

    // role was not changed, so admin endpoints stay closed
    let response = client.get(api.join("users").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[traced_test]
async fn test_role_change_applies_to_issued_token() {
    let (args, _config_guard) = prepare_env("test_role_change").await.unwrap();
    let db_args = args.clone();
    let (admin, api) = launch_env(args, TestUser::Admin).await.unwrap();

    let response = admin.get(api.join("users").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    modify_user(
        &db_args,
        TestUser::Admin.username(),
        UpdateUser {
            role: Some(Role::User),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // same token, account is now plain user
    let response = admin.get(api.join("users").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = admin.get(api.join("users/me").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me: serde_json::Value = response.json().await.unwrap();
    assert_eq!(me["role"], "user");
}

#[tokio::test]
#[traced_test]
async fn test_staff_manages_users() {
    let (args, _config_guard) = prepare_env("test_staff").await.unwrap();
    let db_args = args.clone();
    let api = api_url(&args);
    let (_critic, _) = launch_env(args, TestUser::User).await.unwrap();

    let code = create_staff_user(&db_args, "clerk", Role::User)
        .await
        .unwrap();
    let token = obtain_token(&api, "clerk", &code).await.unwrap();
    let clerk = authorized_client(&token).unwrap();

    let response = clerk.get(api.join("users").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page: serde_json::Value = response.json().await.unwrap();
    assert_eq!(page["total"], 2);

    let response = clerk
        .get(api.join(&format!("users/{}", TestUser::User.username())).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // staff flag does not open admin only catalog endpoints
    let response = clerk
        .post(api.join("categories").unwrap())
        .json(&json!({"name": "Music", "slug": "music"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
