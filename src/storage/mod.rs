// Storage module - page-organized rows behind the lazy table backend

pub mod page;
pub mod page_store;
pub mod paged_table;

pub use page::{PAGE_SIZE, Page};
pub use page_store::PageStore;
pub use paged_table::{PagedTable, PlanStep};
