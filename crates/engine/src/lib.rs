//! Shopping list engine: the working list, saved lists, reports and the
//! per-user session tying them to the auth and storage collaborators.

pub use auth::{AuthProvider, AuthSubscription, LocalAuth, ProfileUpdate, ProviderKind, User};
pub use blob::{BlobStore, LocalBlobStore};
pub use category::Category;
pub use error::{AuthError, EngineError, PersistenceError, StoreError, ValidationError};
pub use list_manager::ListManager;
pub use lists::{ListId, ListPatch, NewList, PurchaseList, compute_total};
pub use money::Money;
pub use products::{Product, ProductDraft};
pub use quantity::{Quantity, QuantityUnit};
pub use registration::{Country, ProfilePicture, RegistrationForm, register};
pub use report::{
    CategoryCount, FilterCriteria, MonthYear, ProductView, ReportSummary, TOP_CATEGORIES,
    filter_products, flatten_products, list_history, price_trend, summarize, summarize_in,
    unique_brands, unique_categories,
};
pub use session::{LoadState, Session, View};
pub use store::{DocumentStore, SqlDocumentStore};
pub use util::normalize_key;

mod auth;
mod blob;
mod category;
mod error;
mod list_manager;
mod lists;
mod money;
mod products;
mod quantity;
mod registration;
mod report;
mod session;
mod store;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
