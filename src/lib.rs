pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod payments;

use std::sync::Arc;

use actix_web::web;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::payments::PaymentProvider;

/// Shared per-process state handed to every handler. Provider clients are
/// constructed once at startup and injected here, never held as globals.
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub razorpay: Arc<dyn PaymentProvider>,
    pub stripe: Arc<dyn PaymentProvider>,
}

/// Full HTTP surface under the `/api` prefix. Shared between `main` and the
/// integration tests.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    use handlers::{admin, bookings, contact, payments, rooms};

    cfg.service(
        web::scope("/api")
            .route("/rooms", web::get().to(rooms::get_rooms))
            .route("/rooms", web::post().to(rooms::create_room))
            .route("/rooms/{id}", web::get().to(rooms::get_room))
            .route("/bookings", web::post().to(bookings::create_booking))
            .route("/bookings/verify", web::post().to(bookings::verify_booking))
            .route("/bookings/{id}", web::get().to(bookings::get_booking))
            .route("/bookings/{id}", web::put().to(bookings::modify_booking))
            .route("/bookings/{id}", web::delete().to(bookings::cancel_booking))
            .route(
                "/payments/razorpay/create-order",
                web::post().to(payments::create_razorpay_order),
            )
            .route(
                "/payments/razorpay/verify",
                web::post().to(payments::verify_razorpay_payment),
            )
            .route(
                "/payments/stripe/checkout",
                web::post().to(payments::create_stripe_checkout),
            )
            .route(
                "/payments/stripe/status/{session_id}",
                web::get().to(payments::stripe_payment_status),
            )
            .route("/webhook/stripe", web::post().to(payments::stripe_webhook))
            .route("/contact", web::post().to(contact::submit_contact))
            .route("/admin/login", web::post().to(admin::admin_login))
            .route("/admin/bookings", web::get().to(admin::list_all_bookings))
            .route(
                "/admin/rooms/{id}",
                web::put().to(admin::admin_update_room),
            )
            .route(
                "/admin/bookings/{id}",
                web::delete().to(admin::admin_cancel_booking),
            ),
    );
}
