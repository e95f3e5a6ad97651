//! MongoDB repository tests against a throwaway container.
//!
//! Needs Docker: `cargo test -p domain_products --test mongo_integration -- --ignored`

use domain_products::{
    Clause, DeletedSkuRepository, MongoDeletedSkuRepository, MongoProductRepository, NewProduct,
    ProductError, ProductField, ProductPredicate, ProductRepository,
};
use mongodb::{Client, Database};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

struct TestMongo {
    #[allow(dead_code)]
    container: ContainerAsync<Mongo>,
    db: Database,
}

impl TestMongo {
    async fn new() -> Self {
        let container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let port = container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let client = Client::with_uri_str(format!("mongodb://127.0.0.1:{port}"))
            .await
            .expect("Failed to connect to MongoDB");
        Self {
            container,
            db: client.database("catalog_test"),
        }
    }
}

fn new_product(sku: &str, brand: &str, price: f64) -> NewProduct {
    NewProduct {
        product_sku: sku.to_string(),
        product_name: format!("{sku} name"),
        product_brand: brand.to_string(),
        product_model: None,
        product_category: None,
        product_color: None,
        product_price: price,
        product_currency: Some("USD".to_string()),
        product_stock: Some(1),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_product_repository_roundtrip() {
    let mongo = TestMongo::new().await;
    let repo = MongoProductRepository::new(&mongo.db);
    repo.init_indexes().await.unwrap();

    assert_eq!(repo.insert_many(vec![]).await.unwrap(), 0);

    let inserted = repo
        .insert_many(vec![
            new_product("A1", "Acme", 10.0),
            new_product("A1", "Acme", 11.0),
            new_product("B2", "Zeta", 20.0),
        ])
        .await
        .unwrap();
    assert_eq!(inserted, 3);

    assert_eq!(repo.count(&ProductPredicate::all()).await.unwrap(), 3);
    assert_eq!(repo.count_distinct_skus().await.unwrap(), 2);
    assert!(repo.exists_by_sku("B2").await.unwrap());
    assert!(!repo.exists_by_sku("C3").await.unwrap());

    let brands = repo.count_by_brand().await.unwrap();
    assert_eq!(brands.len(), 2);
    assert_eq!(brands[0].product_brand, "Acme");
    assert_eq!(brands[0].total_products, 2);

    let without_a1 =
        ProductPredicate::all().and(Clause::NotIn(ProductField::Sku, vec!["A1".to_string()]));
    let page = repo.find_page(&without_a1, 0, 5).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].product_sku, "B2");

    let with_price = ProductPredicate::all().and(Clause::Present(ProductField::Price, true));
    assert_eq!(repo.count(&with_price).await.unwrap(), 3);

    let second_page = repo.find_page(&ProductPredicate::all(), 2, 2).await.unwrap();
    assert_eq!(second_page.len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_deleted_repository_rejects_duplicate_tombstone() {
    let mongo = TestMongo::new().await;
    let repo = MongoDeletedSkuRepository::new(&mongo.db);
    repo.init_indexes().await.unwrap();

    let tombstone = repo.insert("A1").await.unwrap();
    assert!(tombstone.id.is_some());

    let err = repo.insert("A1").await.unwrap_err();
    assert!(matches!(err, ProductError::AlreadyDeleted { .. }));

    assert!(repo.find_by_sku("A1").await.unwrap().is_some());
    assert_eq!(repo.find_all().await.unwrap().len(), 1);
}
