//! Domain models for the storefront.
//!
//! These are the validated view/domain types handed to templates; the
//! `sqlx::FromRow` row types that feed them live next to their queries in
//! [`crate::db`], except [`catalog::DetailRow`] which is assembled by
//! [`crate::services::catalog`].

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;
pub mod wishlist;

pub use address::{Address, NewAddress};
pub use cart::{AddOutcome, CartLine, CartView};
pub use catalog::{
    Category, CategoryNode, ColorOption, ProductCard, ProductDetail, ProductFilter,
    ProductListing, SizeOption,
};
pub use order::{Order, OrderItem, OrderSummary};
pub use session::CurrentUser;
pub use user::User;
pub use wishlist::WishlistItem;
