#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tempfile::TempDir;
use tokio::sync::mpsc;
use uuid::Uuid;
use vendora_api::{
    config::AppConfig,
    db,
    entities::{category, coupon, order, product, tax_rate, vendor},
    errors::ServiceError,
    events::{self, EventSender},
    handlers::AppServices,
    ids,
    services::{GatewaySession, GatewaySessionStatus, PaymentGateway},
    AppState,
};

/// Helper harness for spinning up application state backed by a per-test
/// SQLite database.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub gateway: Arc<StubGateway>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("failed to create temp dir for test db");
        let db_path = db_dir.path().join("vendora_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db_arc = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let gateway = Arc::new(StubGateway::default());
        let services = AppServices::new(
            db_arc.clone(),
            Arc::new(event_sender.clone()),
            &cfg,
            gateway.clone(),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", vendora_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            state,
            router,
            gateway,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    pub async fn seed_vendor(&self, name: &str) -> vendor::Model {
        let vendor = vendor::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(Some(Uuid::new_v4())),
            name: Set(name.to_string()),
            email: Set(Some(format!("{}@shops.test", ids::public_id()))),
            description: Set(None),
            mobile: Set(None),
            active: Set(true),
            slug: Set(format!("{}-{}", name.to_lowercase(), ids::public_id())),
            created_at: Set(Utc::now()),
        };
        vendor
            .insert(&*self.state.db)
            .await
            .expect("failed to seed vendor")
    }

    pub async fn seed_category(&self, title: &str) -> category::Model {
        let category = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            slug: Set(format!("{}-{}", title.to_lowercase(), ids::public_id())),
            active: Set(true),
            created_at: Set(Utc::now()),
        };
        category
            .insert(&*self.state.db)
            .await
            .expect("failed to seed category")
    }

    pub async fn seed_product(
        &self,
        vendor_id: Uuid,
        price: Decimal,
        shipping_amount: Decimal,
    ) -> product::Model {
        let pid = ids::public_id();
        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            pid: Set(pid.clone()),
            title: Set("Test Product".to_string()),
            slug: Set(format!("test-product-{}", pid)),
            description: Set(None),
            price: Set(price),
            old_price: Set(price),
            shipping_amount: Set(shipping_amount),
            stock_qty: Set(100),
            in_stock: Set(true),
            status: Set(product::ProductStatus::Published),
            featured: Set(false),
            vendor_id: Set(Some(vendor_id)),
            category_id: Set(None),
            created_at: Set(Utc::now()),
        };
        product
            .insert(&*self.state.db)
            .await
            .expect("failed to seed product")
    }

    pub async fn seed_tax_rate(&self, country: &str, rate: i32) -> tax_rate::Model {
        let tax_rate = tax_rate::ActiveModel {
            id: Set(Uuid::new_v4()),
            country: Set(country.to_string()),
            rate: Set(rate),
            active: Set(true),
            created_at: Set(Utc::now()),
        };
        tax_rate
            .insert(&*self.state.db)
            .await
            .expect("failed to seed tax rate")
    }

    pub async fn seed_coupon(
        &self,
        vendor_id: Uuid,
        code: &str,
        discount: i32,
        active: bool,
    ) -> coupon::Model {
        let coupon = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(vendor_id),
            code: Set(code.to_string()),
            discount: Set(discount),
            active: Set(active),
            created_at: Set(Utc::now()),
        };
        coupon
            .insert(&*self.state.db)
            .await
            .expect("failed to seed coupon")
    }
}

/// In-crate fake for the payment gateway contract. Sessions are fabricated
/// locally and the reported status is whatever the test last configured.
pub struct StubGateway {
    status: Mutex<GatewaySessionStatus>,
    pub sessions_created: AtomicU32,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            status: Mutex::new(GatewaySessionStatus::Unpaid),
            sessions_created: AtomicU32::new(0),
        }
    }
}

impl StubGateway {
    pub fn set_status(&self, status: GatewaySessionStatus) {
        *self.status.lock().expect("gateway status lock poisoned") = status;
    }
}

#[async_trait::async_trait]
impl PaymentGateway for StubGateway {
    async fn create_session(&self, order: &order::Model) -> Result<GatewaySession, ServiceError> {
        self.sessions_created.fetch_add(1, Ordering::SeqCst);
        let id = format!("cs_test_{}", order.oid);
        Ok(GatewaySession {
            url: format!("https://gateway.test/session/{}", id),
            id,
        })
    }

    async fn session_status(
        &self,
        _session_id: &str,
    ) -> Result<GatewaySessionStatus, ServiceError> {
        Ok(*self.status.lock().expect("gateway status lock poisoned"))
    }
}
