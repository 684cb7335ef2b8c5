//! Data every full page renders: navigation, the user menu, and the CSP nonce.

use std::sync::Arc;

use threadline_core::Gender;

use crate::models::catalog::CategoryNode;
use crate::models::session::CurrentUser;
use crate::services::catalog::category_tree;
use crate::state::AppState;

/// Shared context for `base.html`.
#[derive(Clone)]
pub struct Layout {
    pub user: Option<CurrentUser>,
    pub categories: Arc<Vec<CategoryNode>>,
    pub genders: [Gender; 4],
    pub nonce: String,
}

impl Layout {
    /// Build the layout for a request.
    ///
    /// A failed category load is logged and rendered as an empty menu; the
    /// page itself still renders.
    pub async fn load(state: &AppState, user: Option<CurrentUser>, nonce: String) -> Self {
        let categories = match category_tree(state).await {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("Failed to load category navigation: {e}");
                Arc::new(Vec::new())
            }
        };

        Self {
            user,
            categories,
            genders: Gender::ALL,
            nonce,
        }
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}
