use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, flight, order, reschedule, ticket};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::user_rate_limit::create_user_governor;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public_governor = create_public_governor();
    let user_governor = create_user_governor();

    // Public routes (IP-based rate limiting)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Public flight search and seat maps
    let public_routes = Router::new()
        .route("/flights", get(flight::list_flights))
        .route("/flights/{id}", get(flight::get_flight))
        .route("/flights/{id}/seats", get(flight::seat_map))
        .route("/flights/{id}/fare", get(flight::fare_quote))
        .layer(public_governor);

    // Passenger routes (requires auth; per-user rate limiting)
    let passenger_routes = Router::new()
        .route("/orders", post(order::create_order))
        .route("/orders", get(order::my_orders))
        .route("/orders/{id}", get(order::get_order))
        .route("/orders/{id}/pay", post(order::pay_order))
        .route("/orders/{id}/cancel", post(order::cancel_order))
        .route("/orders/{id}/remaining-time", get(order::remaining_time))
        .route("/tickets", get(ticket::my_tickets))
        .route("/tickets/{id}", get(ticket::get_ticket))
        .route("/tickets/{id}/refund", post(ticket::refund_ticket))
        .route("/tickets/{id}/check-in", post(ticket::check_in))
        .route("/tickets/{id}/reschedule/options", get(reschedule::reschedule_options))
        .route("/tickets/{id}/reschedule/preview", post(reschedule::preview_reschedule))
        .route("/tickets/{id}/reschedule", post(reschedule::execute_reschedule))
        .layer(user_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role)
    let admin_routes = Router::new()
        // Flight management
        .route("/flights", get(admin::list_flights))
        .route("/flights", post(admin::create_flight))
        .route("/flights/update-status", post(admin::update_flight_statuses))
        .route("/flights/{id}", put(admin::update_flight))
        .route("/flights/{id}", delete(admin::delete_flight))
        .route("/flights/{id}/depart", post(admin::depart_flight))
        .route("/flights/{id}/cancel", post(admin::cancel_flight))
        // Order management
        .route("/orders", get(admin::list_all_orders))
        .route("/orders/process-expired", post(admin::process_expired_orders))
        .route("/orders/{id}/complete", post(admin::settle_order))
        // User management
        .route("/users", get(admin::list_all_users))
        // Business settings
        .route("/settings", get(admin::get_business_settings))
        .route("/settings", put(admin::update_business_settings))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes.merge(passenger_routes))
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
