mod state;
mod status;

pub use state::{Classifier, MigrationState};
pub use status::{JobStatus, PollSummary};
