//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (database)
//!
//! # Catalog
//! GET  /products                  - Listing (?gender=&category=&q=&page=)
//! GET  /products/{id}             - Detail grouped by color (?variant=)
//! GET  /categories/{slug}         - Listing restricted to a category subtree
//!
//! # Wishlist (requires auth)
//! GET  /wishlist                  - Wishlist page
//! POST /wishlist/toggle           - Toggle (returns wishlist button fragment)
//! POST /wishlist/remove           - Remove (returns wishlist button fragment)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                      - Cart page (requires auth)
//! GET  /cart/count                - Cart count badge (fragment)
//! POST /cart/add                  - Add to cart (returns empty, triggers cart-updated)
//! POST /cart/increment            - Quantity +1 (returns cart_items fragment)
//! POST /cart/decrement            - Quantity -1, not below 1 (returns cart_items fragment)
//! POST /cart/remove               - Remove line (returns cart_items fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                  - Cart summary and address choice
//! POST /checkout                  - Place order
//! GET  /checkout/complete/{id}    - Order confirmation
//!
//! # Auth
//! GET  /auth/login                - Login page
//! POST /auth/login                - Login action
//! GET  /auth/register             - Register page
//! POST /auth/register             - Register action
//! POST /auth/logout               - Logout action
//!
//! # Account (requires auth)
//! GET  /account                   - Account overview
//! GET  /account/orders            - Order history
//! GET  /account/addresses         - Address book
//! POST /account/addresses         - Add address
//! POST /account/addresses/{id}/delete - Delete address
//! ```
//!
//! POST routes are rate limited per client IP: auth actions strictly, other
//! form actions loosely.

pub mod account;
pub mod actions;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod home;
pub mod layout;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::rate_limit::RateLimiterLayer;
use crate::middleware::{action_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes(limiter: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter.clone())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the wishlist routes router.
pub fn wishlist_routes(limiter: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
        .layer(limiter.clone())
        .route("/", get(wishlist::index))
}

/// Create the cart routes router.
pub fn cart_routes(limiter: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/remove", post(cart::remove))
        .layer(limiter.clone())
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes(limiter: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(checkout::show).merge(post(checkout::place).layer(limiter.clone())),
        )
        .route("/complete/{id}", get(checkout::complete))
}

/// Create the account routes router.
pub fn account_routes(limiter: &RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/addresses/{id}/delete", post(account::delete_address))
        .layer(limiter.clone())
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route(
            "/addresses",
            get(account::addresses).merge(post(account::create_address).layer(limiter.clone())),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let auth_limiter = auth_rate_limiter();
    let action_limiter = action_rate_limiter();

    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .route("/categories/{slug}", get(categories::show))
        // Shopper state
        .nest("/wishlist", wishlist_routes(&action_limiter))
        .nest("/cart", cart_routes(&action_limiter))
        .nest("/checkout", checkout_routes(&action_limiter))
        .nest("/account", account_routes(&action_limiter))
        // Auth routes
        .nest("/auth", auth_routes(&auth_limiter))
}
