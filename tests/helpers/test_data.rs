//! Test data helpers for creating products, group buys and services

use std::sync::{Arc, Once};

use chrono::{Duration, Utc};
use uuid::Uuid;

use FarmPool::config::{GroupBuyConfig, Settings};
use FarmPool::models::{CreateGroupBuyRequest, CreateProductRequest, Product};
use FarmPool::{GroupBuyService, GroupBuyStore, InMemoryStore, ServiceFactory};

static INIT: Once = Once::new();

/// Initialize test logging once per test binary
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Request for a forming group one week from its deadline
pub fn group_request(product_id: Uuid, target_quantity: i32, base_price: f64) -> CreateGroupBuyRequest {
    CreateGroupBuyRequest {
        product_id,
        initiator_id: Uuid::new_v4(),
        target_quantity,
        base_price,
        deadline: Utc::now() + Duration::days(7),
        delivery_method: "farm pickup".to_string(),
        region: Some("valley".to_string()),
    }
}

pub fn product_request(name: &str, base_price: f64) -> CreateProductRequest {
    CreateProductRequest {
        farmer_id: Uuid::new_v4(),
        name: name.to_string(),
        unit: Some("kg".to_string()),
        base_price,
    }
}

/// Service over a fresh in-memory store, plus a handle to that store
pub fn memory_service() -> (GroupBuyService<InMemoryStore>, Arc<InMemoryStore>) {
    memory_service_with(GroupBuyConfig::default())
}

pub fn memory_service_with(config: GroupBuyConfig) -> (GroupBuyService<InMemoryStore>, Arc<InMemoryStore>) {
    init_test_env();
    let mut settings = Settings::default();
    settings.group_buy = config;

    let store = Arc::new(InMemoryStore::new(settings.realtime.buffer_size));
    let factory = ServiceFactory::new(settings, store.clone());
    (factory.group_buy_service, store)
}

/// Store a product and return it
pub async fn seed_product<S: GroupBuyStore>(store: &S, name: &str, base_price: f64) -> Product {
    store
        .insert_product(Product::new(product_request(name, base_price)))
        .await
        .expect("Failed to insert product")
}
