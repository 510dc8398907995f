//! What to send and when: the query corpus, ordering strategies, arrival
//! spacing and the admission gate the driver consults every iteration.
mod admission;
mod corpus;
mod rate;
mod scheduler;


pub use admission::{AdmissionController, BURST_CAP};
pub use corpus::{QueryCorpus, QueryId};
pub use rate::RateLimiter;
pub use scheduler::{QueryScheduler, ScheduleMode};
