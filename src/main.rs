use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;

use hotel_booking_api::config::Config;
use hotel_booking_api::payments::{PaymentProvider, RazorpayProvider, StripeProvider};
use hotel_booking_api::{configure_api, db, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();

    log::info!("Connecting to database...");
    let pool = db::get_db_pool(&config.database_url)
        .await
        .expect("Failed to create pool");

    log::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    db::seed_rooms(&pool).await.expect("Failed to seed rooms");

    let razorpay: Arc<dyn PaymentProvider> = Arc::new(RazorpayProvider::new(
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    ));
    let stripe: Arc<dyn PaymentProvider> = Arc::new(StripeProvider::new(
        config.stripe_api_key.clone(),
        config.stripe_webhook_secret.clone(),
    ));

    let bind_addr = config.bind_addr.clone();
    let cors_origins = config.cors_origins.clone();

    let state = web::Data::new(AppState {
        pool,
        config,
        razorpay,
        stripe,
    });

    log::info!("Starting server at http://{}", bind_addr);

    HttpServer::new(move || {
        let cors = if cors_origins.iter().any(|o| o == "*") {
            Cors::permissive()
        } else {
            let mut cors = Cors::default()
                .allow_any_method()
                .allow_any_header()
                .supports_credentials();
            for origin in &cors_origins {
                cors = cors.allowed_origin(origin);
            }
            cors
        };

        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .configure(configure_api)
    })
    .bind(bind_addr)?
    .run()
    .await
}
