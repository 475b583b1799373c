//! Cachama UI crate - the self-contained chat page.
//!
//! The page template is embedded at compile time via `include_str!` and filled
//! from the persona section of the configuration, so one binary serves any
//! storefront variant.
//!
//! ```rust,ignore
//! use cachama_ui::render_page;
//!
//! async fn index(State(state): State<AppState>) -> Html<String> {
//!     Html(render_page(&state.config.persona))
//! }
//! ```

pub mod page;

pub use page::{render_page, PAGE_TEMPLATE};
