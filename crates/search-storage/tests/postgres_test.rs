//! PostgreSQL backend tests.
//!
//! These need a running server and are skipped unless
//! `SEARCH_TEST_POSTGRES_URL` is set, e.g.
//! `SEARCH_TEST_POSTGRES_URL=postgres://postgres@localhost/postgres`.
//! Each test works in its own schema, dropped when the test finishes.

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Executor;

use search_storage::{
    delete_resource_documents, postgres_options, save_document, search_documents,
    update_documents, Client, Concurrency, Dialect, Key, Query,
};
use search_types::{Document, TsVector, Weight, DOCUMENT_ENTITY, SPEC_KIND};

const URL_VAR: &str = "SEARCH_TEST_POSTGRES_URL";

const PETSTORE: &str = "projects/demo/locations/global/apis/petstore/versions/v1/specs/openapi";

/// A storage client confined to a scratch schema.
struct TestDb {
    client: Client,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    async fn open() -> Option<Self> {
        let url = match std::env::var(URL_VAR) {
            Ok(url) => url,
            Err(_) => {
                eprintln!("{} not set; skipping PostgreSQL test", URL_VAR);
                return None;
            }
        };

        let schema = format!("search_test_{}", ulid::Ulid::new().to_string().to_lowercase());
        let admin = PgPool::connect(&url).await.expect("connect to PostgreSQL");
        admin
            .execute(format!("CREATE SCHEMA {}", schema).as_str())
            .await
            .expect("create test schema");

        let options = postgres_options(&url)
            .unwrap()
            .options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .expect("connect test pool");
        let client = Client::from_postgres_pool(pool);
        client.ensure_schema().await.expect("create documents table");

        Some(Self {
            client,
            admin,
            schema,
        })
    }

    async fn finish(self) {
        self.client.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await
            .expect("drop test schema");
    }
}

fn document(key: &str, name: &str, text: &str, weight: Weight) -> Document {
    Document {
        key: key.to_string(),
        name: name.to_string(),
        kind: SPEC_KIND.to_string(),
        project_id: "demo".to_string(),
        vector: TsVector::new(text, weight),
        ..Default::default()
    }
}

async fn row_count(client: &Client) -> usize {
    let mut session = client.session().await.unwrap();
    session.run(&Query::new(DOCUMENT_ENTITY)).await.unwrap().remaining()
}

#[tokio::test]
async fn test_postgres_is_concurrent() {
    let Some(db) = TestDb::open().await else { return };
    assert_eq!(db.client.dialect(), Dialect::Postgres);
    assert_eq!(db.client.concurrency(), Concurrency::Concurrent);
    db.finish().await;
}

#[tokio::test]
async fn test_round_trip_highlights_match() {
    let Some(db) = TestDb::open().await else { return };
    let mut session = db.client.session().await.unwrap();

    update_documents(
        &mut session,
        vec![document(PETSTORE, PETSTORE, "Pet Store\nFind pets", Weight::A)],
    )
    .await
    .unwrap();

    let hits = search_documents(&mut session, "pets").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, PETSTORE);
    assert!(hits[0].excerpt.contains("**pets**"), "excerpt: {}", hits[0].excerpt);

    let stored = session.get(&Key::new(DOCUMENT_ENTITY, PETSTORE)).await.unwrap();
    assert_eq!(stored.raw, "Pet Store\nFind pets");
    assert_eq!(stored.project_id, "demo");
    assert!(stored.escaped);

    drop(session);
    db.finish().await;
}

#[tokio::test]
async fn test_empty_document_deletes_row() {
    let Some(db) = TestDb::open().await else { return };
    let mut session = db.client.session().await.unwrap();

    update_documents(&mut session, vec![document("k", "k", "petstore", Weight::A)])
        .await
        .unwrap();
    update_documents(&mut session, vec![document("k", "k", "", Weight::A)])
        .await
        .unwrap();

    let err = session.get(&Key::new(DOCUMENT_ENTITY, "k")).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(search_documents(&mut session, "petstore").await.unwrap().is_empty());

    drop(session);
    db.finish().await;
}

#[tokio::test]
async fn test_reindex_overwrites_row() {
    let Some(db) = TestDb::open().await else { return };
    let mut session = db.client.session().await.unwrap();

    save_document(&mut session, document("k", "k", "Find pets", Weight::A))
        .await
        .unwrap();
    save_document(&mut session, document("k", "k", "Adopt kittens", Weight::A))
        .await
        .unwrap();
    drop(session);

    assert_eq!(row_count(&db.client).await, 1);
    let mut session = db.client.session().await.unwrap();
    assert!(search_documents(&mut session, "pets").await.unwrap().is_empty());
    assert_eq!(search_documents(&mut session, "kittens").await.unwrap().len(), 1);

    drop(session);
    db.finish().await;
}

#[tokio::test]
async fn test_heavier_weight_ranks_first() {
    let Some(db) = TestDb::open().await else { return };
    let mut session = db.client.session().await.unwrap();

    update_documents(
        &mut session,
        vec![
            document("low", "low", "inventory of pets", Weight::D),
            document("high", "high", "inventory of pets", Weight::A),
            document("mid", "mid", "inventory of pets", Weight::B),
        ],
    )
    .await
    .unwrap();

    let keys: Vec<String> = search_documents(&mut session, "inventory")
        .await
        .unwrap()
        .into_iter()
        .map(|hit| hit.key)
        .collect();
    assert_eq!(keys, vec!["high", "mid", "low"]);

    drop(session);
    db.finish().await;
}

#[tokio::test]
async fn test_delete_resource_documents() {
    let Some(db) = TestDb::open().await else { return };
    let mut session = db.client.session().await.unwrap();

    update_documents(
        &mut session,
        vec![
            document(PETSTORE, PETSTORE, "petstore", Weight::A),
            document(&format!("{}#methods/listPets", PETSTORE), PETSTORE, "listPets", Weight::B),
            document("other", "other", "petstore", Weight::A),
        ],
    )
    .await
    .unwrap();

    assert_eq!(delete_resource_documents(&mut session, PETSTORE).await.unwrap(), 2);
    assert_eq!(delete_resource_documents(&mut session, PETSTORE).await.unwrap(), 0);

    let hits = search_documents(&mut session, "petstore").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, "other");

    drop(session);
    db.finish().await;
}

#[tokio::test]
async fn test_concurrent_writers_to_one_key() {
    let Some(db) = TestDb::open().await else { return };

    for round in 0..30 {
        let key = format!("race-{}", round);
        let mut tasks = Vec::new();
        for writer in 0..6 {
            let client = db.client.clone();
            let key = key.clone();
            tasks.push(tokio::spawn(async move {
                let mut session = client.session().await?;
                save_document(
                    &mut session,
                    document(&key, &key, &format!("writer {}", writer), Weight::A),
                )
                .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
    }

    assert_eq!(row_count(&db.client).await, 30);
    db.finish().await;
}
