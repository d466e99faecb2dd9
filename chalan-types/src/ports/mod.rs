//! Port traits implemented by adapters.

mod directory;
mod repository;

pub use directory::{OrganizationDirectory, RecipientDirectory, RecipientProfile};
pub use repository::VoucherRepository;
