//! UI Components
//!
//! Reusable Leptos components.

mod delete_confirm_button;
mod feed_tabs;
mod masonry_grid;
mod media_card;
mod scroll_sentinel;

pub use delete_confirm_button::DeleteConfirmButton;
pub use feed_tabs::FeedTabs;
pub use masonry_grid::MasonryGrid;
pub use media_card::MediaCard;
pub use scroll_sentinel::ScrollSentinel;
