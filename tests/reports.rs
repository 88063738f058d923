use serde_json::{json, Value};

use review_board::{
    core::{Document, EntityKind},
    infrastructure::{DatabaseInterface, EntityStore},
    models::MovieRating,
    query::{average_rating_per_movie, reports, top_rated_in_genre},
};

fn fields(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

async fn movie(store: &EntityStore, title: &str, genre: &str) -> String {
    let doc = store
        .create(
            EntityKind::Movie,
            &fields(json!({"title": title, "genre": genre, "releaseYear": 1979})),
        )
        .await
        .unwrap();
    doc["_id"].as_str().unwrap().to_string()
}

async fn review(store: &EntityStore, movie_id: &str, rating: i64) {
    store
        .create(
            EntityKind::Review,
            &fields(json!({"rating": rating, "movieId": movie_id, "comment": "ok"})),
        )
        .await
        .unwrap();
}

fn find<'a>(rows: &'a [MovieRating], title: &str) -> &'a MovieRating {
    rows.iter().find(|r| r.title == title).unwrap()
}

#[tokio::test]
async fn test_average_rating_per_movie() {
    let store = EntityStore::new_in_memory().await.unwrap();
    let a = movie(&store, "Alien", "Sci-Fi").await;
    let b = movie(&store, "Heat", "Crime").await;

    review(&store, &a, 4).await;
    review(&store, &a, 2).await;
    review(&store, &b, 5).await;

    let rows = average_rating_per_movie(&store).await.unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].title, "Heat");
    assert_eq!(rows[0].avg_rating, 5.0);
    assert_eq!(rows[0].review_count, 1);

    let alien = find(&rows, "Alien");
    assert_eq!(alien.avg_rating, 3.0);
    assert_eq!(alien.review_count, 2);
    assert_eq!(alien.genre.as_deref(), Some("Sci-Fi"));
}

#[tokio::test]
async fn test_average_rating_mean_is_fractional() {
    let store = EntityStore::new_in_memory().await.unwrap();
    let a = movie(&store, "Alien", "Sci-Fi").await;
    review(&store, &a, 4).await;
    review(&store, &a, 5).await;

    let rows = average_rating_per_movie(&store).await.unwrap();
    assert_eq!(rows[0].avg_rating, 4.5);
}

#[tokio::test]
async fn test_average_rating_skips_missing_movies() {
    let store = EntityStore::new_in_memory().await.unwrap();
    let a = movie(&store, "Alien", "Sci-Fi").await;
    review(&store, &a, 6).await;

    // Dangling and absent movie references never join
    review(&store, "6650fc1ed1f081d2", 9).await;
    store
        .create(EntityKind::Review, &fields(json!({"rating": 10})))
        .await
        .unwrap();

    let rows = average_rating_per_movie(&store).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Alien");
    assert_eq!(rows[0].review_count, 1);
}

#[tokio::test]
async fn test_reports_are_empty_without_reviews() {
    let store = EntityStore::new_in_memory().await.unwrap();
    movie(&store, "Alien", "Sci-Fi").await;

    assert!(average_rating_per_movie(&store).await.unwrap().is_empty());
    assert!(top_rated_in_genre(&store, "Sci-Fi", 3, 3)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_top_rated_filters_genre_and_floor() {
    let store = EntityStore::new_in_memory().await.unwrap();
    let alien = movie(&store, "Alien", "Sci-Fi").await;
    let dune = movie(&store, "Dune", "Sci-Fi").await;
    let heat = movie(&store, "Heat", "Crime").await;

    review(&store, &alien, 2).await; // below the floor
    review(&store, &alien, 4).await;
    review(&store, &dune, 9).await;
    review(&store, &dune, 7).await;
    review(&store, &heat, 10).await; // wrong genre

    let rows = top_rated_in_genre(&store, "Sci-Fi", 3, 3).await.unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].title, "Dune");
    assert_eq!(rows[0].avg_rating, 8.0);
    assert_eq!(rows[0].review_count, 2);

    assert_eq!(rows[1].title, "Alien");
    assert_eq!(rows[1].avg_rating, 4.0);
    assert_eq!(rows[1].review_count, 1);

    assert!(rows.iter().all(|r| r.genre.as_deref() == Some("Sci-Fi")));
}

#[tokio::test]
async fn test_top_rated_limits_rows() {
    let store = EntityStore::new_in_memory().await.unwrap();
    for (i, rating) in [5, 9, 3, 7, 8].into_iter().enumerate() {
        let id = movie(&store, &format!("Film {}", i), "Sci-Fi").await;
        review(&store, &id, rating).await;
    }

    let rows = top_rated_in_genre(
        &store,
        reports::TOP_GENRE,
        reports::TOP_RATING_FLOOR,
        reports::TOP_LIMIT,
    )
    .await
    .unwrap();

    let averages: Vec<f64> = rows.iter().map(|r| r.avg_rating).collect();
    assert_eq!(averages, vec![9.0, 8.0, 7.0]);
}

#[tokio::test]
async fn test_top_rated_empty_when_nothing_clears_floor() {
    let store = EntityStore::new_in_memory().await.unwrap();
    let alien = movie(&store, "Alien", "Sci-Fi").await;
    review(&store, &alien, 1).await;
    review(&store, &alien, 2).await;

    let rows = top_rated_in_genre(&store, "Sci-Fi", 3, 3).await.unwrap();
    assert!(rows.is_empty());

    // Genre matching is exact
    review(&store, &alien, 9).await;
    assert!(top_rated_in_genre(&store, "sci-fi", 3, 3)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_equal_averages_keep_first_reviewed_order() {
    let store = EntityStore::new_in_memory().await.unwrap();
    let alien = movie(&store, "Alien", "Sci-Fi").await;
    let dune = movie(&store, "Dune", "Sci-Fi").await;

    // Dune is reviewed first, so it leads the tie
    review(&store, &dune, 6).await;
    review(&store, &alien, 6).await;
    review(&store, &dune, 6).await;

    let rows = average_rating_per_movie(&store).await.unwrap();
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "Alien"]);

    let rows = top_rated_in_genre(&store, "Sci-Fi", 3, 3).await.unwrap();
    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "Alien"]);
}
