//! tabular-query drives a data table bound to a json:api collection: it turns the table's page, sort,
//! column filters and static params into request params and turns responses back into table state.
pub mod backend;
pub mod casing;
pub mod columns;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod params;
pub mod query;
pub mod response;
pub mod serializer;
pub mod table;
pub mod test_helpers;

pub use backend::{BackendConfig, HttpBackend, QueryBackend};
pub use columns::{Column, ListOption};
pub use error::AppError;
pub use extract::WireQuery;
pub use params::WireParams;
pub use query::{Filter, QueryState, SortDirection, SortKey};
pub use response::{NormalizedPageInfo, QueryPatch, ResponseEnvelope};
pub use serializer::QuerySerializer;
pub use table::TableState;
