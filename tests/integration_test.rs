//! Integration Tests - End-to-end Service Component Testing
//!
//! Tests the interaction between usecases, ports, and adapters. The
//! in-memory store is used as-is; the metrics sink, system probe, and
//! pizza factory are mocked with mockall.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mockall::mock;
use rust_decimal_macros::dec;
use uuid::Uuid;

use pizza_service::adapters::persistence::InMemoryStore;
use pizza_service::domain::error::ServiceError;
use pizza_service::domain::metrics::{names, MetricEvent};
use pizza_service::domain::order::OrderItem;
use pizza_service::domain::user::{AuthUser, Role, User, UserRole};
use pizza_service::ports::fulfillment::{DinerInfo, FactoryReport};
use pizza_service::ports::store::UserStore;
use pizza_service::usecases::auth_service::{AuthService, TokenIssuer};
use pizza_service::usecases::franchise_service::FranchiseService;
use pizza_service::usecases::metrics_pipeline::{metric_channel, MetricBus, MetricsPipeline};
use pizza_service::usecases::order_service::OrderService;

// ---- Mock Definitions ----

mock! {
    pub Sink {}

    #[async_trait::async_trait]
    impl pizza_service::ports::metrics_sink::MetricsSink for Sink {
        async fn push(&self, payload: &str) -> anyhow::Result<()>;
    }
}

mock! {
    pub Probe {}

    impl pizza_service::ports::system_probe::SystemProbe for Probe {
        fn cpu_usage_percent(&mut self) -> f64;
        fn memory_usage_percent(&mut self) -> f64;
    }
}

mock! {
    pub Factory {}

    #[async_trait::async_trait]
    impl pizza_service::ports::fulfillment::OrderFulfillment for Factory {
        async fn fulfill(
            &self,
            diner: &DinerInfo,
            order: &pizza_service::domain::order::Order,
        ) -> anyhow::Result<FactoryReport>;
    }
}

// ---- Helpers ----

const TEST_SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

/// Pipeline wired to a recording sink and a fixed probe.
fn test_pipeline(
    push_succeeds: bool,
) -> (
    MetricBus,
    MetricsPipeline,
    Arc<Mutex<Vec<String>>>,
) {
    let (bus, events) = metric_channel();

    let captured = Arc::new(Mutex::new(Vec::new()));
    let mut sink = MockSink::new();
    let capture = Arc::clone(&captured);
    sink.expect_push().returning(move |payload| {
        capture.lock().unwrap().push(payload.to_string());
        if push_succeeds {
            Ok(())
        } else {
            anyhow::bail!("metrics endpoint returned 503 Service Unavailable")
        }
    });

    let mut probe = MockProbe::new();
    probe.expect_cpu_usage_percent().returning(|| 12.5);
    probe.expect_memory_usage_percent().returning(|| 40.75);

    let pipeline = MetricsPipeline::new(
        events,
        Box::new(probe),
        Arc::new(sink),
        "test-host".to_string(),
        Duration::from_secs(30),
    );

    (bus, pipeline, captured)
}

fn auth_service(store: Arc<InMemoryStore>) -> AuthService {
    let (bus, events) = metric_channel();
    // Keep the pipeline side alive so emits are not dropped mid-test
    std::mem::forget(events);
    AuthService::new(store, TokenIssuer::new(TEST_SECRET, 1), bus)
}

fn caller_for(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        roles: user.roles.clone(),
        jti: Uuid::new_v4(),
    }
}

async fn add_admin(store: &InMemoryStore, email: &str) -> User {
    store
        .add_user(
            "admin".to_string(),
            email.to_string(),
            "unused-hash".to_string(),
            vec![UserRole::global(Role::Admin)],
        )
        .await
        .unwrap()
}

async fn add_diner(store: &InMemoryStore, email: &str) -> User {
    store
        .add_user(
            "diner".to_string(),
            email.to_string(),
            "unused-hash".to_string(),
            vec![UserRole::global(Role::Diner)],
        )
        .await
        .unwrap()
}

// ---- Metrics Pipeline ----

#[tokio::test]
async fn test_resettable_metric_sums_then_resets_after_flush() {
    let (_bus, mut pipeline, captured) = test_pipeline(true);

    for _ in 0..5 {
        pipeline.handle_event(MetricEvent::Increment {
            name: names::PIZZAS_SOLD.to_string(),
            amount: 1.0,
        });
    }

    pipeline.collect_system();
    pipeline.flush().await;

    let payloads = captured.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert!(payloads[0].contains("pizzaMetrics_sold,source=test-host value=5"));
    assert!(payloads[0].contains("systemMetrics_cpuUsage,source=test-host value=12.5"));
    assert!(payloads[0].contains("systemMetrics_memoryUsage,source=test-host value=40.75"));
    drop(payloads);

    assert_eq!(pipeline.registry().get(names::PIZZAS_SOLD), 0.0);
}

#[tokio::test]
async fn test_non_resettable_metric_persists_across_cycles() {
    let (_bus, mut pipeline, captured) = test_pipeline(true);

    pipeline.handle_event(MetricEvent::Increment {
        name: names::ACTIVE_USERS.to_string(),
        amount: 2.0,
    });

    pipeline.flush().await;
    pipeline.flush().await;

    let payloads = captured.lock().unwrap();
    assert_eq!(payloads.len(), 2);
    assert!(payloads[1].contains("activeUsers,source=test-host value=2"));
    drop(payloads);

    assert_eq!(pipeline.registry().get(names::ACTIVE_USERS), 2.0);
}

#[tokio::test]
async fn test_failed_push_still_resets_resettable_metrics() {
    // Pins the exporter's current behavior: a transport failure drops
    // the cycle's counts rather than carrying them into the next one.
    let (_bus, mut pipeline, captured) = test_pipeline(false);

    pipeline.handle_event(MetricEvent::Increment {
        name: names::PIZZAS_SOLD.to_string(),
        amount: 3.0,
    });

    pipeline.flush().await;

    assert_eq!(captured.lock().unwrap().len(), 1);
    assert_eq!(pipeline.registry().get(names::PIZZAS_SOLD), 0.0);
}

#[tokio::test]
async fn test_unknown_metric_reference_never_fails() {
    let (_bus, mut pipeline, _captured) = test_pipeline(true);

    pipeline.handle_event(MetricEvent::Increment {
        name: "nope_not_registered".to_string(),
        amount: 1.0,
    });
    pipeline.handle_event(MetricEvent::Set {
        name: "also_missing".to_string(),
        value: 99.0,
    });

    assert_eq!(pipeline.registry().get("nope_not_registered"), 0.0);
    pipeline.flush().await;
}

#[tokio::test]
async fn test_bus_delivers_events_in_order() {
    let (bus, mut events) = metric_channel();

    bus.increment(names::AUTH_FAILED);
    bus.increment_by(names::PIZZA_REVENUE, 20.98);
    bus.set(names::ENDPOINT_LATENCY, 15.0);
    drop(bus);

    assert_eq!(
        events.recv().await,
        Some(MetricEvent::Increment {
            name: names::AUTH_FAILED.to_string(),
            amount: 1.0,
        })
    );
    assert_eq!(
        events.recv().await,
        Some(MetricEvent::Increment {
            name: names::PIZZA_REVENUE.to_string(),
            amount: 20.98,
        })
    );
    assert_eq!(
        events.recv().await,
        Some(MetricEvent::Set {
            name: names::ENDPOINT_LATENCY.to_string(),
            value: 15.0,
        })
    );
    assert_eq!(events.recv().await, None);
}

#[tokio::test]
async fn test_bus_emit_after_pipeline_gone_is_silent() {
    let (bus, events) = metric_channel();
    drop(events);

    // Must not panic or error: metrics never fail a request
    bus.increment(names::ACTIVE_USERS);
    bus.set(names::ENDPOINT_LATENCY, 1.0);
}

// ---- Auth Service ----

#[tokio::test]
async fn test_register_login_logout_lifecycle() {
    let store = Arc::new(InMemoryStore::new());
    let auth = auth_service(Arc::clone(&store));

    let session = auth
        .register("pizza diner", "reg@test.com", "a")
        .await
        .unwrap();
    assert!(session.user.is_role(Role::Diner));

    let caller = auth.authenticate(&session.token).await.unwrap();
    assert_eq!(caller.email, "reg@test.com");

    auth.logout(&caller).await.unwrap();
    assert!(matches!(
        auth.authenticate(&session.token).await,
        Err(ServiceError::Unauthorized)
    ));

    // A fresh login issues a new, valid session
    let session = auth.login("reg@test.com", "a").await.unwrap();
    assert!(auth.authenticate(&session.token).await.is_ok());
}

#[tokio::test]
async fn test_login_wrong_password_is_unknown_user() {
    let store = Arc::new(InMemoryStore::new());
    let auth = auth_service(Arc::clone(&store));

    auth.register("d", "d@test.com", "right").await.unwrap();

    let err = auth.login("d@test.com", "wrong").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.to_string(), "unknown user");

    let err = auth.login("missing@test.com", "x").await.unwrap_err();
    assert_eq!(err.to_string(), "unknown user");
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let store = Arc::new(InMemoryStore::new());
    let auth = auth_service(store);

    let err = auth.register("", "e@test.com", "p").await.unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
    assert_eq!(err.to_string(), "name, email, and password are required");
}

#[tokio::test]
async fn test_update_user_self_or_admin_only() {
    let store = Arc::new(InMemoryStore::new());
    let auth = auth_service(Arc::clone(&store));

    let diner = auth.register("d", "d@test.com", "pw").await.unwrap().user;
    let other = auth.register("o", "o@test.com", "pw").await.unwrap().user;
    let admin = add_admin(&store, "a@test.com").await;

    // A diner may not update someone else
    let err = auth
        .update_user(
            &caller_for(&diner),
            other.id,
            Some("hax@test.com".to_string()),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // Self-update works
    let updated = auth
        .update_user(
            &caller_for(&diner),
            diner.id,
            Some("updated_d@test.com".to_string()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.email, "updated_d@test.com");

    // Admin may update anyone
    let updated = auth
        .update_user(
            &caller_for(&admin),
            other.id,
            Some("updated_o@test.com".to_string()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.email, "updated_o@test.com");
}

#[tokio::test]
async fn test_seeded_admin_can_login_and_is_idempotent() {
    let store = Arc::new(InMemoryStore::new());
    let auth = auth_service(Arc::clone(&store));

    auth.ensure_admin("admin", "a@pizza.test", "toomanysecrets")
        .await
        .unwrap();
    auth.ensure_admin("admin", "a@pizza.test", "toomanysecrets")
        .await
        .unwrap();

    let session = auth.login("a@pizza.test", "toomanysecrets").await.unwrap();
    assert!(session.user.is_role(Role::Admin));
}

// ---- Franchise Service ----

#[tokio::test]
async fn test_franchise_creation_admin_only_and_grants_role() {
    let store = Arc::new(InMemoryStore::new());
    let service = FranchiseService::new(Arc::clone(&store) as _, Arc::clone(&store) as _);

    let admin = add_admin(&store, "a@admin.com").await;
    let franchisee = add_diner(&store, "franchisee@test.com").await;

    // Non-admin creation is forbidden
    let err = service
        .create(
            &caller_for(&franchisee),
            "Unauthorized Franchise".to_string(),
            vec![],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // Admin creation succeeds and grants the franchisee role
    let franchise = service
        .create(
            &caller_for(&admin),
            "Test Franchise".to_string(),
            vec!["franchisee@test.com".to_string()],
        )
        .await
        .unwrap();
    assert!(franchise.has_admin(franchisee.id));

    let granted = store.user_by_id(franchisee.id).await.unwrap().unwrap();
    assert!(granted
        .roles
        .contains(&UserRole::franchisee(franchise.id)));

    // Unknown admin email is a not-found error
    let err = service
        .create(
            &caller_for(&admin),
            "Broken".to_string(),
            vec!["ghost@test.com".to_string()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn test_store_management_authorization() {
    let store = Arc::new(InMemoryStore::new());
    let service = FranchiseService::new(Arc::clone(&store) as _, Arc::clone(&store) as _);

    let admin = add_admin(&store, "a@admin.com").await;
    let franchisee = add_diner(&store, "franchisee@test.com").await;
    let stranger = add_diner(&store, "other@test.com").await;

    let franchise = service
        .create(
            &caller_for(&admin),
            "Test Franchise".to_string(),
            vec!["franchisee@test.com".to_string()],
        )
        .await
        .unwrap();

    // Franchise admin can create a store
    let created = service
        .create_store(
            &caller_for(&franchisee),
            franchise.id,
            "Franchisee Store".to_string(),
        )
        .await
        .unwrap();
    assert_eq!(created.name, "Franchisee Store");

    // A stranger cannot
    let err = service
        .create_store(
            &caller_for(&stranger),
            franchise.id,
            "Unauthorized Store".to_string(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // A stranger cannot delete either
    let err = service
        .delete_store(&caller_for(&stranger), franchise.id, created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // The franchise admin can
    service
        .delete_store(&caller_for(&franchisee), franchise.id, created.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_user_franchises_visibility() {
    let store = Arc::new(InMemoryStore::new());
    let service = FranchiseService::new(Arc::clone(&store) as _, Arc::clone(&store) as _);

    let admin = add_admin(&store, "a@admin.com").await;
    let franchisee = add_diner(&store, "franchisee@test.com").await;
    let stranger = add_diner(&store, "other@test.com").await;

    let franchise = service
        .create(
            &caller_for(&admin),
            "Test Franchise".to_string(),
            vec!["franchisee@test.com".to_string()],
        )
        .await
        .unwrap();

    // Self sees own franchises
    let mine = service
        .user_franchises(&caller_for(&franchisee), franchisee.id)
        .await
        .unwrap();
    assert!(mine.iter().any(|f| f.id == franchise.id));

    // Another diner asking about the franchisee sees nothing
    let theirs = service
        .user_franchises(&caller_for(&stranger), franchisee.id)
        .await
        .unwrap();
    assert!(theirs.is_empty());

    // A global admin sees them
    let seen = service
        .user_franchises(&caller_for(&admin), franchisee.id)
        .await
        .unwrap();
    assert_eq!(seen.len(), 1);
}

// ---- Order Service ----

fn order_items() -> Vec<OrderItem> {
    vec![
        OrderItem {
            menu_id: 1,
            description: "Margherita".to_string(),
            price: dec!(9.99),
        },
        OrderItem {
            menu_id: 2,
            description: "Veggie".to_string(),
            price: dec!(10.99),
        },
    ]
}

#[tokio::test]
async fn test_place_order_emits_sale_metrics() {
    let store = Arc::new(InMemoryStore::new());
    let diner = add_diner(&store, "d@test.com").await;

    let mut factory = MockFactory::new();
    factory.expect_fulfill().returning(|_, _| {
        Ok(FactoryReport {
            jwt: "factory.receipt.jwt".to_string(),
            report_url: Some("https://factory.test/report/1".to_string()),
        })
    });

    let (bus, mut events) = metric_channel();
    let service = OrderService::new(Arc::clone(&store) as _, Arc::new(factory), bus);

    let placed = service
        .place_order(&caller_for(&diner), 1, 2, order_items())
        .await
        .unwrap();
    assert_eq!(placed.jwt, "factory.receipt.jwt");
    assert_eq!(placed.order.items.len(), 2);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.iter().any(|e| matches!(
        e,
        MetricEvent::Set { name, .. } if name == names::PIZZA_LATENCY
    )));
    assert!(seen.contains(&MetricEvent::Increment {
        name: names::PIZZAS_SOLD.to_string(),
        amount: 2.0,
    }));
    assert!(seen.contains(&MetricEvent::Increment {
        name: names::PIZZA_REVENUE.to_string(),
        amount: 20.98,
    }));

    // The order is in the diner's history
    let history = service.diner_orders(&caller_for(&diner), 0).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, placed.order.id);
}

#[tokio::test]
async fn test_factory_failure_records_creation_failure() {
    let store = Arc::new(InMemoryStore::new());
    let diner = add_diner(&store, "d@test.com").await;

    let mut factory = MockFactory::new();
    factory
        .expect_fulfill()
        .returning(|_, _| anyhow::bail!("factory returned 500 Internal Server Error"));

    let (bus, mut events) = metric_channel();
    let service = OrderService::new(Arc::clone(&store) as _, Arc::new(factory), bus);

    let err = service
        .place_order(&caller_for(&diner), 1, 2, order_items())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::FactoryFailure(_)));
    assert_eq!(err.to_string(), "Failed to fulfill order at factory");

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.contains(&MetricEvent::Increment {
        name: names::PIZZA_FAILURES.to_string(),
        amount: 1.0,
    }));
    assert!(!seen.iter().any(|e| matches!(
        e,
        MetricEvent::Increment { name, .. } if name == names::PIZZAS_SOLD
    )));
}

#[tokio::test]
async fn test_add_menu_item_admin_only() {
    let store = Arc::new(InMemoryStore::new());
    let admin = add_admin(&store, "a@admin.com").await;
    let diner = add_diner(&store, "d@test.com").await;

    let (bus, events) = metric_channel();
    std::mem::forget(events);
    let service = OrderService::new(
        Arc::clone(&store) as _,
        Arc::new(MockFactory::new()),
        bus,
    );

    let err = service
        .add_menu_item(
            &caller_for(&diner),
            "Test Pizza".to_string(),
            "Delicious test pizza".to_string(),
            "test_pizza.png".to_string(),
            dec!(10.99),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let menu = service
        .add_menu_item(
            &caller_for(&admin),
            "Test Pizza".to_string(),
            "Delicious test pizza".to_string(),
            "test_pizza.png".to_string(),
            dec!(10.99),
        )
        .await
        .unwrap();
    assert!(menu.iter().any(|item| item.title == "Test Pizza"));
}
