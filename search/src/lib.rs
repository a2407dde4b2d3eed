pub mod query;
pub mod session;

pub use query::{Query, QueryLine};
pub use session::{read_queries, search_batch, write_results, write_results_if_any, SearchSession};
