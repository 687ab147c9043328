use std::net::SocketAddr;
use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ifly_backend::{
    config::Config,
    db,
    entities::system_setting,
    entities::user::{self, UserRole},
    routes,
    services::flight_status,
    services::notify::Notifier,
    services::settings::{BusinessSettings, BUSINESS_CATEGORY},
    services::timeout,
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ifly_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    // Seed admin account and default business settings if missing
    seed_admin(&db).await;
    seed_business_settings(&db).await;

    // Create app state
    let state = AppState {
        db: db.clone(),
        config: config.clone(),
        notifier: Notifier::new(config.notify_webhook_url.clone()),
    };

    // Background driver: expiry sweeper + flight status maintenance
    let sweeper_db = db.clone();
    let sweep_interval = config.sweep_interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(sweep_interval));
        loop {
            ticker.tick().await;

            let outcome = timeout::process_all_expired_orders(&sweeper_db).await;
            if outcome.processed > 0 || outcome.failed > 0 {
                tracing::info!(
                    processed = outcome.processed,
                    failed = outcome.failed,
                    "expiry sweep complete"
                );
            }
            for error in &outcome.errors {
                tracing::warn!(%error, "expiry sweep error");
            }

            if let Err(e) = flight_status::run_all_updates(&sweeper_db).await {
                tracing::warn!(error = %e, "flight status maintenance failed");
            }
        }
    });

    // Create router with middleware
    let app = routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

/// Seed the admin account if it doesn't exist
async fn seed_admin(db: &DatabaseConnection) {
    let admin_email = "admin@ifly.com";

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(admin_email))
        .one(db)
        .await
        .expect("Failed to check for admin");

    if existing.is_none() {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(b"admin123", &salt)
            .expect("Failed to hash admin password")
            .to_string();

        let admin = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(admin_email.to_string()),
            password_hash: Set(password_hash),
            name: Set("Admin".to_string()),
            role: Set(UserRole::Admin),
            ..Default::default()
        };

        admin.insert(db).await.expect("Failed to create admin");
        tracing::info!("Admin account created: {}", admin_email);
    }
}

/// Seed the business settings rows that are not present yet
async fn seed_business_settings(db: &DatabaseConnection) {
    for (key, value, description) in BusinessSettings::default_entries() {
        let existing = system_setting::Entity::find()
            .filter(system_setting::Column::Category.eq(BUSINESS_CATEGORY))
            .filter(system_setting::Column::Key.eq(key))
            .one(db)
            .await
            .expect("Failed to check business settings");

        if existing.is_none() {
            system_setting::ActiveModel {
                category: Set(BUSINESS_CATEGORY.to_string()),
                key: Set(key.to_string()),
                value: Set(value),
                description: Set(Some(description.to_string())),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to seed business settings");

            tracing::info!(key, "seeded business setting");
        }
    }
}
