pub mod event;
pub mod period;
pub mod report;
pub mod token;

pub use event::{Event, FetchedEvents};
pub use period::Period;
pub use report::AggregateReport;
pub use token::{ClientSecret, StoredToken};
