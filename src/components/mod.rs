pub mod address_bar;
pub mod result_view;
pub mod search_bar;

// Re-export core Component trait
pub use tui_dispatch::Component;

pub use address_bar::{AddressBar, AddressBarProps};
pub use result_view::{ResultView, ResultViewProps};
pub use search_bar::{SEARCH_BAR_HEIGHT, SearchBar, SearchBarProps};
