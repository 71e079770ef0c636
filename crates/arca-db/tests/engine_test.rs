//! Sale engine integration tests against an in-memory store.

use chrono::{Duration, Utc};

use arca_core::{
    CoreError, CreateSaleInput, CreditTerms, ErrorKind, Money, PaymentMethod, Product,
    SaleLineInput,
};
use arca_db::repository::product::generate_product_id;
use arca_db::{Database, DbConfig, DbError, SaleFilter};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

fn product(code: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: generate_product_id(),
        code: code.to_string(),
        name: format!("Product {}", code),
        price_cents,
        cost_cents: None,
        stock,
        created_at: now,
        updated_at: now,
    }
}

async fn seed_product(db: &Database, code: &str, price_cents: i64, stock: i64) {
    db.products()
        .insert(&product(code, price_cents, stock))
        .await
        .expect("seed product");
}

fn line(code: &str, quantity: i64, unit_price_cents: i64) -> SaleLineInput {
    SaleLineInput {
        code: code.to_string(),
        quantity,
        unit_price_cents,
    }
}

fn cash_sale(items: Vec<SaleLineInput>, discount_cents: i64) -> CreateSaleInput {
    CreateSaleInput {
        items,
        payment_method: PaymentMethod::Cash,
        discount_cents,
        store_id: None,
        user_id: None,
        credit_terms: None,
    }
}

fn credit_sale(
    items: Vec<SaleLineInput>,
    discount_cents: i64,
    customer_id: &str,
    due_in_days: i64,
) -> CreateSaleInput {
    CreateSaleInput {
        items,
        payment_method: PaymentMethod::Credit,
        discount_cents,
        store_id: None,
        user_id: None,
        credit_terms: Some(CreditTerms {
            customer_id: customer_id.to_string(),
            due_date: (Utc::now() + Duration::days(due_in_days)).date_naive(),
        }),
    }
}

async fn stock_of(db: &Database, code: &str) -> i64 {
    db.products()
        .get_by_code(code)
        .await
        .expect("get product")
        .expect("product exists")
        .stock
}

#[tokio::test]
async fn create_sale_persists_totals_and_items() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 10).await;
    seed_product(&db, "TEA-100", 450, 10).await;

    let input = cash_sale(vec![line("COFFEE-250", 2, 1099), line("TEA-100", 1, 450)], 148);
    let created = db.sales().create_sale(&input).await.unwrap();

    assert_eq!(created.subtotal_cents, 2648);
    assert_eq!(created.discount_cents, 148);
    assert_eq!(created.total_cents, 2500);
    assert!(created.credit.is_none());

    let detail = db.sales().get_sale(&created.sale_id).await.unwrap();
    assert_eq!(detail.items.len(), 2);
    assert!(!detail.sale.voided);
    assert_eq!(detail.sale.total(), Money::from_cents(2500));

    // total = sum(item subtotals) - discount, exact to currency precision
    let item_sum: i64 = detail.items.iter().map(|i| i.subtotal_cents).sum();
    assert_eq!(detail.sale.total_cents, item_sum - detail.sale.discount_cents);
}

#[tokio::test]
async fn create_sale_freezes_quoted_unit_price() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 10).await;

    // The request quotes 999, below catalog price; the item keeps 999.
    let created = db
        .sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 1, 999)], 0))
        .await
        .unwrap();

    let detail = db.sales().get_sale(&created.sale_id).await.unwrap();
    assert_eq!(detail.items[0].unit_price_cents, 999);
    assert_eq!(detail.items[0].code_snapshot, "COFFEE-250");

    // The catalog price is untouched.
    let catalog = db
        .products()
        .get_by_code("COFFEE-250")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(catalog.price().cents(), 1099);
}

#[tokio::test]
async fn adjust_stock_guards_against_negative() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 5).await;

    db.products().adjust_stock("COFFEE-250", 10).await.unwrap();
    assert_eq!(stock_of(&db, "COFFEE-250").await, 15);

    db.products().adjust_stock("COFFEE-250", -15).await.unwrap();
    assert_eq!(stock_of(&db, "COFFEE-250").await, 0);

    let err = db
        .products()
        .adjust_stock("COFFEE-250", -1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock { .. })
    ));

    let err = db.products().adjust_stock("NOPE-1", 1).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
}

#[tokio::test]
async fn create_sale_debits_stock_to_zero_then_rejects() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 5).await;

    db.sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 5, 1099)], 0))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, "COFFEE-250").await, 0);

    let err = db
        .sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 1, 1099)], 0))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InsufficientStock));
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        })
    ));
}

#[tokio::test]
async fn create_sale_rejects_unknown_product() {
    let db = test_db().await;

    let err = db
        .sales()
        .create_sale(&cash_sale(vec![line("NOPE-1", 1, 100)], 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(code)) if code == "NOPE-1"));
}

#[tokio::test]
async fn create_sale_rejects_empty_and_invalid_input() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 5).await;

    let err = db.sales().create_sale(&cash_sale(vec![], 0)).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    let err = db
        .sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 0, 100)], 0))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    let err = db
        .sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 1, 100)], 200))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InvalidTotal { total_cents: -100 })
    ));
}

#[tokio::test]
async fn failed_sale_rolls_back_every_ledger() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 10).await;
    seed_product(&db, "TEA-100", 450, 1).await;

    // Second line is short by one unit: the whole batch must abort.
    let err = db
        .sales()
        .create_sale(&cash_sale(
            vec![line("COFFEE-250", 3, 1099), line("TEA-100", 2, 450)],
            0,
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientStock { .. })
    ));

    // No partial debit, no orphaned sale rows.
    assert_eq!(stock_of(&db, "COFFEE-250").await, 10);
    assert_eq!(stock_of(&db, "TEA-100").await, 1);
    let sales = db.sales().list_sales(&SaleFilter::default()).await.unwrap();
    assert!(sales.is_empty());
}

#[tokio::test]
async fn cancel_sale_restores_stock_exactly_once() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 5).await;

    let created = db
        .sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 2, 1099)], 0))
        .await
        .unwrap();
    assert_eq!(stock_of(&db, "COFFEE-250").await, 3);

    db.sales().cancel_sale(&created.sale_id).await.unwrap();
    assert_eq!(stock_of(&db, "COFFEE-250").await, 5);

    // Void is terminal: the second attempt observes failure.
    let err = db.sales().cancel_sale(&created.sale_id).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::AlreadyVoided(_))));

    // And the stock was restored exactly once.
    assert_eq!(stock_of(&db, "COFFEE-250").await, 5);

    let detail = db.sales().get_sale(&created.sale_id).await.unwrap();
    assert!(detail.sale.voided);
}

#[tokio::test]
async fn cancel_sale_unknown_id_is_not_found() {
    let db = test_db().await;

    let err = db.sales().cancel_sale("missing").await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::SaleNotFound(_))));
}

#[tokio::test]
async fn get_sale_unknown_id_is_not_found() {
    let db = test_db().await;

    let err = db.sales().get_sale("missing").await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::SaleNotFound(_))));
}

#[tokio::test]
async fn list_sales_honors_filters_and_pagination() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 100).await;

    for _ in 0..3 {
        db.sales()
            .create_sale(&cash_sale(vec![line("COFFEE-250", 1, 1099)], 0))
            .await
            .unwrap();
    }
    let credit = db
        .sales()
        .create_sale(&credit_sale(vec![line("COFFEE-250", 1, 1099)], 0, "cust-1", 30))
        .await
        .unwrap();
    let cancelled = db
        .sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 1, 1099)], 0))
        .await
        .unwrap();
    db.sales().cancel_sale(&cancelled.sale_id).await.unwrap();

    let all = db.sales().list_sales(&SaleFilter::default()).await.unwrap();
    assert_eq!(all.len(), 5);

    let voided = db
        .sales()
        .list_sales(&SaleFilter {
            voided: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(voided.len(), 1);
    assert_eq!(voided[0].id, cancelled.sale_id);

    let by_method = db
        .sales()
        .list_sales(&SaleFilter {
            payment_method: Some(PaymentMethod::Credit),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_method.len(), 1);
    assert_eq!(by_method[0].id, credit.sale_id);

    let page = db
        .sales()
        .list_sales(&SaleFilter {
            limit: Some(2),
            offset: Some(0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 2);

    let rest = db
        .sales()
        .list_sales(&SaleFilter {
            limit: Some(10),
            offset: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rest.len(), 3);
}

#[tokio::test]
async fn stock_is_never_negative_across_interleavings() {
    let db = test_db().await;
    seed_product(&db, "COFFEE-250", 1099, 4).await;

    // Mixed sequence of sales and cancellations.
    let s1 = db
        .sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 3, 1099)], 0))
        .await
        .unwrap();
    assert!(db
        .sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 2, 1099)], 0))
        .await
        .is_err());
    db.sales().cancel_sale(&s1.sale_id).await.unwrap();
    db.sales()
        .create_sale(&cash_sale(vec![line("COFFEE-250", 4, 1099)], 0))
        .await
        .unwrap();

    assert_eq!(stock_of(&db, "COFFEE-250").await, 0);
}
