use reqwest::{StatusCode, header::AUTHORIZATION};
use serde_json::json;
use tracing::info;
use tracing_test::traced_test;
use yamdb_e2e_tests::{
    api_url, authorized_client, create_user, delete_user, email_of, mail_dir, obtain_token,
    prepare_env, read_code, rest::error_code, spawn_server,
};
use yamdb_types::claim::Role;

#[tokio::test]
#[traced_test]
async fn test_signup_and_token() {
    let (args, _config_guard) = prepare_env("test_signup").await.unwrap();
    let api = api_url(&args);
    let outbox = mail_dir(&args);
    spawn_server(args).await.unwrap();

    let client = reqwest::Client::new();
    let signup = json!({"username": "critic", "email": "critic@example.com"});
    let response = client
        .post(api.join("auth/signup/").unwrap())
        .json(&signup)
        .send()
        .await
        .unwrap();
    info! {"Signup response: {:#?}", response};
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, signup);

    let code = read_code(&outbox, "critic@example.com").await.unwrap();
    assert_eq!(code.len(), 6);

    // wrong code
    let response = client
        .post(api.join("auth/token").unwrap())
        .json(&json!({"username": "critic", "confirmation_code": "not-a-code"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // unknown user
    let response = client
        .post(api.join("auth/token").unwrap())
        .json(&json!({"username": "nobody", "confirmation_code": code}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // wrong attempt did not invalidate the code
    let token = obtain_token(&api, "critic", &code).await.unwrap();
    let me = authorized_client(&token)
        .unwrap()
        .get(api.join("users/me/").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let me: serde_json::Value = me.json().await.unwrap();
    assert_eq!(me["username"], "critic");
    assert_eq!(me["role"], "user");
}

#[tokio::test]
#[traced_test]
async fn test_signup_conflicts() {
    let (args, _config_guard) = prepare_env("test_signup_conflicts").await.unwrap();
    let api = api_url(&args);
    let outbox = mail_dir(&args);
    // account created by admin, user gets code by signing up with same data
    let _unused_code = create_user(&args, "invited", Role::Moderator).await.unwrap();
    spawn_server(args).await.unwrap();

    let client = reqwest::Client::new();
    let url = api.join("auth/signup").unwrap();

    let response = client
        .post(url.clone())
        .json(&json!({"username": "invited", "email": email_of("invited")}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let code = read_code(&outbox, &email_of("invited")).await.unwrap();
    let token = obtain_token(&api, "invited", &code).await.unwrap();
    assert!(!token.is_empty());

    let response = client
        .post(url.clone())
        .json(&json!({"username": "invited", "email": "other@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(url.clone())
        .json(&json!({"username": "somebody", "email": email_of("invited")}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(url.clone())
        .json(&json!({"username": "me", "email": "me@example.com"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await.unwrap(), "VALIDATION_ERROR");

    let response = client
        .post(url)
        .json(&json!({"username": "valid_name", "email": "not-an-email"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[traced_test]
async fn test_invalid_token() {
    let (args, _config_guard) = prepare_env("test_invalid_token").await.unwrap();
    let api = api_url(&args);
    spawn_server(args).await.unwrap();

    let client = authorized_client("invalid.token.value").unwrap();
    let response = client.get(api.join("categories").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await.unwrap(), "UNAUTHORIZED");

    let response = reqwest::get(api.join("users/me").unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[traced_test]
async fn test_malformed_authorization_header() {
    let (args, _config_guard) = prepare_env("test_malformed_auth").await.unwrap();
    let api = api_url(&args);
    spawn_server(args).await.unwrap();

    let client = reqwest::Client::new();
    for header in ["Token abc", "Bearer", "Bearer "] {
        let response = client
            .get(api.join("categories").unwrap())
            .header(AUTHORIZATION, header)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
    }
}

#[tokio::test]
#[traced_test]
async fn test_token_of_deleted_account() {
    let (args, _config_guard) = prepare_env("test_deleted_account").await.unwrap();
    let api = api_url(&args);
    let db_args = args.clone();
    let code = create_user(&args, "leaver", Role::User).await.unwrap();
    spawn_server(args).await.unwrap();

    let token = obtain_token(&api, "leaver", &code).await.unwrap();
    let client = authorized_client(&token).unwrap();
    let response = client.get(api.join("users/me").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    delete_user(&db_args, "leaver").await.unwrap();

    let response = client.get(api.join("users/me").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = client.get(api.join("titles").unwrap()).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
