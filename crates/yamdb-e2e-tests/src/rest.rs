use anyhow::{Result, anyhow};
use reqwest::{StatusCode, Url};
use serde_json::{Value, json};
use yamdb_app::error::ErrorBody;
use yamdb_dal::{category::Category, genre::Genre, review::Review, title::Title};

async fn post_created<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
    payload: Value,
) -> Result<T> {
    let response = client.post(url.clone()).json(&payload).send().await?;
    if response.status() != StatusCode::CREATED {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(anyhow!("POST {url} failed with {status}: {body}"));
    }
    Ok(response.json().await?)
}

pub async fn create_category(
    client: &reqwest::Client,
    api: &Url,
    name: &str,
    slug: &str,
) -> Result<Category> {
    post_created(
        client,
        api.join("categories")?,
        json!({"name": name, "slug": slug}),
    )
    .await
}

pub async fn create_genre(
    client: &reqwest::Client,
    api: &Url,
    name: &str,
    slug: &str,
) -> Result<Genre> {
    post_created(
        client,
        api.join("genres")?,
        json!({"name": name, "slug": slug}),
    )
    .await
}

pub async fn create_title(
    client: &reqwest::Client,
    api: &Url,
    name: &str,
    year: i32,
    category: Option<&str>,
    genre: &[&str],
) -> Result<Title> {
    post_created(
        client,
        api.join("titles")?,
        json!({"name": name, "year": year, "category": category, "genre": genre}),
    )
    .await
}

pub fn reviews_url(api: &Url, title_id: i64) -> Result<Url> {
    Ok(api.join(&format!("titles/{title_id}/reviews"))?)
}

pub fn comments_url(api: &Url, title_id: i64, review_id: i64) -> Result<Url> {
    Ok(api.join(&format!("titles/{title_id}/reviews/{review_id}/comments"))?)
}

pub async fn create_review(
    client: &reqwest::Client,
    api: &Url,
    title_id: i64,
    text: &str,
    score: i64,
) -> Result<Review> {
    post_created(
        client,
        reviews_url(api, title_id)?,
        json!({"text": text, "score": score}),
    )
    .await
}

/// Error code from standard error body
pub async fn error_code(response: reqwest::Response) -> Result<String> {
    let body: ErrorBody = response.json().await?;
    Ok(body.code)
}
