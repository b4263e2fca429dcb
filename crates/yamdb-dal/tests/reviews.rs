mod common;

use common::{create_user, init_db};
use yamdb_dal::{
    Error, ListingParams,
    comment::{CommentRepository, CreateComment, UpdateComment},
    review::{CreateReview, ReviewRepository, UpdateReview},
    title::{CreateTitle, TitleRepository},
    user::{UpdateUser, UserRepository},
};
use yamdb_types::claim::{Authored as _, Role};

async fn create_title(pool: &sqlx::Pool<sqlx::Sqlite>) -> i64 {
    TitleRepository::new(pool.clone())
        .create(CreateTitle {
            name: "Andrei Rublev".into(),
            year: 1966,
            description: Some("Icon painter".into()),
            category: Some("film".into()),
            genre: vec!["drama".into()],
        })
        .await
        .unwrap()
        .id
}

fn review(score: i64) -> CreateReview {
    CreateReview {
        text: format!("Worth {score}"),
        score,
    }
}

#[tokio::test]
async fn test_rating_is_mean_of_scores() {
    let pool = init_db().await;
    let title_id = create_title(&pool).await;
    let reviews = ReviewRepository::new(pool.clone(), title_id);
    for (name, score) in [("alice", 10), ("bob", 7), ("carol", 4)] {
        let author = create_user(&pool, name, Role::User).await;
        reviews.create(author, review(score)).await.unwrap();
    }

    let title = TitleRepository::new(pool.clone())
        .get(title_id)
        .await
        .unwrap();
    assert_eq!(title.rating, Some(7.0));

    let page = reviews.list(ListingParams::new(0, 2)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.rows[0].author, "alice");
}

#[tokio::test]
async fn test_one_review_per_author() {
    let pool = init_db().await;
    let title_id = create_title(&pool).await;
    let author = create_user(&pool, "alice", Role::User).await;
    let reviews = ReviewRepository::new(pool.clone(), title_id);

    assert!(!reviews.exists_for_author(author).await.unwrap());
    let first = reviews.create(author, review(8)).await.unwrap();
    assert_eq!(first.author_id(), author);
    assert!(reviews.exists_for_author(author).await.unwrap());

    let second = reviews.create(author, review(3)).await;
    assert!(matches!(second, Err(Error::Conflict(_))));

    // another title is fine
    let other_title = create_title(&pool).await;
    ReviewRepository::new(pool.clone(), other_title)
        .create(author, review(3))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_review_scoped_by_title() {
    let pool = init_db().await;
    let title_id = create_title(&pool).await;
    let other_title = create_title(&pool).await;
    let author = create_user(&pool, "alice", Role::User).await;
    let created = ReviewRepository::new(pool.clone(), title_id)
        .create(author, review(5))
        .await
        .unwrap();

    let wrong = ReviewRepository::new(pool.clone(), other_title);
    assert!(matches!(
        wrong.get(created.id).await,
        Err(Error::RecordNotFound(_))
    ));
    assert!(matches!(
        wrong.delete(created.id).await,
        Err(Error::RecordNotFound(_))
    ));

    let right = ReviewRepository::new(pool.clone(), title_id);
    let updated = right
        .update(
            created.id,
            UpdateReview {
                score: Some(9),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.score, 9);
    assert_eq!(updated.text, created.text);
}

#[tokio::test]
async fn test_comments() {
    let pool = init_db().await;
    let title_id = create_title(&pool).await;
    let author = create_user(&pool, "alice", Role::User).await;
    let commenter = create_user(&pool, "bob", Role::User).await;
    let review = ReviewRepository::new(pool.clone(), title_id)
        .create(author, review(6))
        .await
        .unwrap();

    let comments = CommentRepository::new(pool.clone(), review.id);
    let comment = comments
        .create(
            commenter,
            CreateComment {
                text: "Disagree".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(comment.author, "bob");
    assert_eq!(comment.review_id, review.id);

    let updated = comments
        .update(
            comment.id,
            UpdateComment {
                text: Some("Partly agree".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.text, "Partly agree");

    let page = comments.list(ListingParams::new(0, 10)).await.unwrap();
    assert_eq!(page.total, 1);

    comments.delete(comment.id).await.unwrap();
    assert!(matches!(
        comments.get(comment.id).await,
        Err(Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_cascades() {
    let pool = init_db().await;
    let title_id = create_title(&pool).await;
    let author = create_user(&pool, "alice", Role::User).await;
    let commenter = create_user(&pool, "bob", Role::User).await;
    let reviews = ReviewRepository::new(pool.clone(), title_id);
    let review = reviews.create(author, review(6)).await.unwrap();
    let comments = CommentRepository::new(pool.clone(), review.id);
    comments
        .create(
            commenter,
            CreateComment {
                text: "Nice".into(),
            },
        )
        .await
        .unwrap();

    // deleting commenter removes the comment
    UserRepository::new(pool.clone())
        .delete(commenter)
        .await
        .unwrap();
    assert_eq!(comments.list(ListingParams::default()).await.unwrap().total, 0);

    comments
        .create(
            author,
            CreateComment {
                text: "Self reply".into(),
            },
        )
        .await
        .unwrap();

    // deleting title removes reviews and their comments
    TitleRepository::new(pool.clone())
        .delete(title_id)
        .await
        .unwrap();
    assert_eq!(reviews.list(ListingParams::default()).await.unwrap().total, 0);
    assert_eq!(comments.list(ListingParams::default()).await.unwrap().total, 0);
}

#[tokio::test]
async fn test_user_codes_and_update() {
    let pool = init_db().await;
    let repo = UserRepository::new(pool.clone());
    let id = create_user(&pool, "alice", Role::User).await;

    let code = repo.issue_code(id).await.unwrap();
    let user = repo.check_code("alice", &code).await.unwrap();
    assert_eq!(user.id, id);
    assert!(matches!(
        repo.check_code("alice", "000000x").await,
        Err(Error::InvalidCredentials)
    ));
    assert!(matches!(
        repo.check_code("nobody", &code).await,
        Err(Error::RecordNotFound(_))
    ));

    let user = repo
        .update(
            id,
            UpdateUser {
                bio: Some("Film critic".into()),
                role: Some(Role::Moderator),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(user.bio, "Film critic");
    assert_eq!(user.role, Role::Moderator);

    create_user(&pool, "bob", Role::User).await;
    let res = repo
        .update(
            id,
            UpdateUser {
                username: Some("bob".parse().unwrap()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(res, Err(Error::Conflict(_))));

    let page = repo
        .list(ListingParams::new(0, 10).with_search("li"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].username, "alice");
}

#[tokio::test]
async fn test_user_search_wildcards_are_literal() {
    let pool = init_db().await;
    for name in ["alice", "bob", "ya_ivan"] {
        create_user(&pool, name, Role::User).await;
    }
    let repo = UserRepository::new(pool.clone());

    let page = repo
        .list(ListingParams::new(0, 10).with_search("%"))
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let page = repo
        .list(ListingParams::new(0, 10).with_search("a_i"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.rows[0].username, "ya_ivan");
}
