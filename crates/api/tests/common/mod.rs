#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use vstack_api::background::import_worker::{self, ImportQueue};
use vstack_api::config::ServerConfig;
use vstack_api::router::build_app_router;
use vstack_api::state::AppState;
use vstack_core::registry::ResourceRegistry;
use vstack_core::resource::{
    Abilities, FieldSpec, LensSpec, ResourceDefinition, ResourceId, SelectFilter,
};
use vstack_core::validation::RuleSet;
use vstack_db::{MemoryStore, RecordStore};
use vstack_events::{EventBus, Notification, NotificationInbox};

pub const ADMIN_ID: &str = "7";

/// A running application backed by an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub inbox: Arc<NotificationInbox>,
    pub cancel: CancellationToken,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

/// `categories`, `users` (belongs to a category) and `audits` (no access).
pub fn test_registry() -> ResourceRegistry {
    let categories = ResourceDefinition::new(ResourceId(1), "categories", "categories")
        .labels("Categorias", "Categoria")
        .field(FieldSpec::text("name", "Nome"))
        .search(["name"])
        .globally_searchable(true)
        .rules(RuleSet::new().with_spec("name", "required").unwrap());

    let users = ResourceDefinition::new(ResourceId(2), "users", "users")
        .labels("Usuários", "Usuário")
        .icon("users")
        .field(FieldSpec::text("name", "Nome"))
        .field(FieldSpec::text("email", "Email"))
        .field(FieldSpec::check("active", "Ativo"))
        .field(FieldSpec::belongs_to("category_id", "Categoria", "categories"))
        .filter(Arc::new(
            SelectFilter::new("role", "Perfil")
                .option("admin", "Administrador")
                .option("user", "Usuário"),
        ))
        .search(["name", "email"])
        .lens(LensSpec::new("active", "Ativos").with_value("1"))
        .globally_searchable(true)
        .rules(
            RuleSet::new()
                .with_spec("name", "required|max:60")
                .unwrap()
                .with_spec("email", "required|email")
                .unwrap(),
        );

    let audits = ResourceDefinition::new(ResourceId(3), "audits", "audits")
        .labels("Auditorias", "Auditoria")
        .field(FieldSpec::text("name", "Nome"))
        .search(["name"])
        .globally_searchable(true)
        .policy(Arc::new(Abilities::deny_all()));

    ResourceRegistry::builder()
        .register(categories)
        .register(users)
        .register(audits)
        .build()
        .unwrap()
}

/// Build the full application router plus its background services.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let event_bus = Arc::new(EventBus::default());
    let inbox = Arc::new(NotificationInbox::default());
    let cancel = CancellationToken::new();

    {
        let inbox = Arc::clone(&inbox);
        let receiver = event_bus.subscribe();
        let cancel = cancel.clone();
        tokio::spawn(async move { inbox.run(receiver, cancel).await });
    }

    let (import_queue, import_rx) = ImportQueue::new(config.import_queue_capacity);
    let dyn_store: Arc<dyn RecordStore> = store.clone();
    tokio::spawn(import_worker::run(
        Arc::clone(&dyn_store),
        Arc::clone(&event_bus),
        import_rx,
        cancel.clone(),
    ));

    let state = AppState {
        store: dyn_store,
        registry: Arc::new(test_registry()),
        config: Arc::new(config.clone()),
        inbox: Arc::clone(&inbox),
        import_queue,
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        inbox,
        cancel,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::get(uri)
                .header("x-user-id", ADMIN_ID)
                .header("x-user-role", "admin")
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .header("x-user-id", ADMIN_ID)
                .header("x-user-role", "admin")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::delete(uri)
                .header("x-user-id", ADMIN_ID)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// POST a multipart form whose parts are `(name, content)`.
    pub async fn post_multipart(&self, uri: &str, parts: &[(&str, &[u8])]) -> (StatusCode, Value) {
        let boundary = "vstack-test-boundary";
        let mut body = Vec::new();
        for (name, content) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            if *name == "file" {
                body.extend_from_slice(
                    b"Content-Disposition: form-data; name=\"file\"; filename=\"import.csv\"\r\n\
                      Content-Type: text/csv\r\n\r\n",
                );
            } else {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        self.send(
            Request::post(uri)
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .header("x-user-id", ADMIN_ID)
                .header("x-user-role", "admin")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Poll the inbox until `user_id` has at least `count` notifications.
    pub async fn wait_for_notifications(&self, user_id: i64, count: usize) -> Vec<Notification> {
        for _ in 0..200 {
            let found = self.inbox.for_user(Some(user_id)).await;
            if found.len() >= count {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.inbox.for_user(Some(user_id)).await
    }
}
