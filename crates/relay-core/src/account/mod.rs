//! Account management: validation, durable records and the registry that
//! keeps records and vault secrets together.

mod model;
mod registry;
mod repository;
mod validation;

pub use model::{Account, AccountSpec};
pub use registry::AccountRegistry;
pub use repository::AccountRepository;
pub use validation::{validate_email, validate_name};
