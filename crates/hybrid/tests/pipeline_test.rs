//! End-to-end tests for the hybrid recommendation pipeline
//!
//! Fixtures are small MovieLens-shaped CSV tables held in memory.

use media_gateway_hybrid::data::{filter_sparse_users, join_movies, read_movies, read_ratings};
use media_gateway_hybrid::{HybridConfig, HybridError, Pipeline};

const MOVIES: &str = "movieId,title,genres
1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy
2,Jumanji (1995),Adventure|Children|Fantasy
3,Grumpier Old Men (1995),Comedy|Romance
6,Heat (1995),Action|Crime|Thriller
7,Sabrina (1995),Comedy|Romance
47,Seven (a.k.a. Se7en) (1995),Mystery|Thriller
50,\"Usual Suspects, The (1995)\",Crime|Mystery|Thriller
110,Braveheart (1995),Action|Drama|War
296,Pulp Fiction (1994),Comedy|Crime|Drama|Thriller
318,\"Shawshank Redemption, The (1994)\",Crime|Drama
";

/// User 1 leans crime/thriller, user 2 family/comedy, user 3 mixed, user 4 too sparse
const RATINGS: &str = "userId,movieId,rating,timestamp
1,1,4.0,964982703
1,3,4.0,964981247
1,6,4.0,964982224
1,47,5.0,964983815
1,50,5.0,964982931
2,1,5.0,1445714835
2,2,4.0,1445714885
2,3,4.5,1445714952
2,7,4.0,1445715013
2,296,2.0,1445715110
3,6,4.0,1306463578
3,47,4.5,1306463590
3,110,5.0,1306463602
3,296,5.0,1306463611
3,318,5.0,1306463620
3,50,4.0,1306463633
4,2,3.0,1100000000
";

fn config() -> HybridConfig {
    let mut config = HybridConfig::default();
    config.model.latent_factors = 4;
    config.model.iterations = 8;
    config
}

#[test]
fn test_literal_scenario_joins_five_rows() {
    let ratings = read_ratings(
        "userId,movieId,rating,timestamp
1,1,4.0,964982703
1,3,4.0,964981247
1,6,4.0,964982224
1,47,5.0,964983815
1,50,5.0,964982931
"
        .as_bytes(),
    )
    .unwrap();
    let movies = read_movies(MOVIES.as_bytes()).unwrap();

    let filtered = filter_sparse_users(&ratings, 5);
    assert_eq!(filtered.len(), 5);
    assert!(filtered.iter().all(|r| r.user_id == 1));

    let joined = join_movies(&filtered, &movies);
    assert_eq!(joined.len(), 5);
    assert_eq!(joined[3].title, "Seven (a.k.a. Se7en) (1995)");
    assert_eq!(joined[4].title, "Usual Suspects, The (1995)");
}

#[test]
fn test_pipeline_recommends_known_users() {
    let recommender = Pipeline::new(config())
        .run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes())
        .unwrap();

    // User 4 is filtered out; movie ids 1..318 rated by users 1-3 remain
    assert_eq!(recommender.dataset().num_users(), 3);
    assert_eq!(recommender.dataset().num_items(), 10);
    assert_eq!(recommender.model().num_items(), 10);

    let list = recommender.recommend(1, 5).unwrap();
    assert_eq!(list.len(), 5);
    for (pos, rec) in list.iter().enumerate() {
        assert_eq!(rec.rank, pos + 1);
        assert!(!rec.title.is_empty());
        assert!(rec.score.is_finite());
    }
    for pair in list.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_pipeline_n_larger_than_catalog() {
    let recommender = Pipeline::new(config())
        .run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes())
        .unwrap();

    let list = recommender.recommend(2, 100).unwrap();
    assert_eq!(list.len(), 10);
}

#[test]
fn test_filtered_and_unknown_users_get_empty_lists() {
    let recommender = Pipeline::new(config())
        .run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes())
        .unwrap();

    let before = recommender.recommend(3, 10).unwrap();

    assert!(recommender.recommend(4, 10).unwrap().is_empty());
    assert!(recommender.recommend(12345, 10).unwrap().is_empty());

    assert_eq!(recommender.recommend(3, 10).unwrap(), before);
}

#[test]
fn test_exclude_known_skips_rated_titles() {
    let mut config = config();
    config.recommend.exclude_known = true;

    let recommender = Pipeline::new(config)
        .run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes())
        .unwrap();

    let known = recommender.known_positives(1).unwrap();
    assert_eq!(known.len(), 5);

    let list = recommender.recommend(1, 10).unwrap();
    assert_eq!(list.len(), 5);
    for rec in &list {
        assert!(!known.contains(&rec.title));
    }
}

#[test]
fn test_content_only_ranks_by_genre_overlap() {
    let mut config = config();
    config.model.content_weight = 1.0;
    config.recommend.exclude_known = true;

    let recommender = Pipeline::new(config)
        .run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes())
        .unwrap();

    // User 2's only crime/drama/thriller signal comes from Pulp Fiction.
    // Heat and Usual Suspects carry identical weights on those terms and
    // tie; Heat has the lower item index.
    let titles: Vec<String> = recommender
        .recommend(2, 5)
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();

    assert_eq!(
        titles,
        vec![
            "Shawshank Redemption, The (1994)",
            "Heat (1995)",
            "Usual Suspects, The (1995)",
            "Seven (a.k.a. Se7en) (1995)",
            "Braveheart (1995)",
        ]
    );
}

#[test]
fn test_seeded_training_is_reproducible() {
    let a = Pipeline::new(config())
        .run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes())
        .unwrap();
    let b = Pipeline::new(config())
        .run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes())
        .unwrap();

    assert_eq!(a.recommend(1, 10).unwrap(), b.recommend(1, 10).unwrap());
}

#[test]
fn test_everyone_filtered_is_error() {
    let mut config = config();
    config.filter.min_ratings_per_user = 50;

    let result = Pipeline::new(config).run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes());
    assert!(matches!(result, Err(HybridError::EmptyDataset(_))));
}

#[test]
fn test_rated_movie_missing_from_catalog_is_dropped() {
    let ratings = format!("{}5,9999,4.0,1\n5,1,4.0,1\n5,2,4.0,1\n5,3,4.0,1\n5,6,4.0,1\n", RATINGS);

    let recommender = Pipeline::new(config())
        .run_from_readers(ratings.as_bytes(), MOVIES.as_bytes())
        .unwrap();

    // User 5 has five ratings before the join, four after
    assert_eq!(recommender.known_positives(5).unwrap().len(), 4);
    assert!(recommender.dataset().item_map.index_of(&9999).is_none());
}

#[test]
fn test_run_reads_configured_files() {
    let dir = std::env::temp_dir().join(format!("hybrid-pipeline-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("ratings.csv"), RATINGS).unwrap();
    std::fs::write(dir.join("movies.csv"), MOVIES).unwrap();

    let mut settings = config();
    settings.data.ratings_path = dir.join("ratings.csv");
    settings.data.movies_path = dir.join("movies.csv");
    let from_files = Pipeline::new(settings.clone()).run();

    settings.data.movies_path = dir.join("missing.csv");
    let missing = Pipeline::new(settings).run();

    std::fs::remove_dir_all(&dir).unwrap();

    let from_files = from_files.unwrap();
    let from_readers = Pipeline::new(config())
        .run_from_readers(RATINGS.as_bytes(), MOVIES.as_bytes())
        .unwrap();
    assert_eq!(
        from_files.recommend(1, 10).unwrap(),
        from_readers.recommend(1, 10).unwrap()
    );

    let err = missing.err().unwrap();
    assert!(matches!(err, HybridError::CsvFile { .. }));
    assert!(err.to_string().contains("missing.csv"));
}
