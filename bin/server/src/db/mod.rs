//! Backend repositories for the academy data.
//!
//! Every call runs as the signed-in user, so the backend's row rules see
//! the caller rather than an anonymous client.

pub mod catalog;
pub mod fees;
pub mod student_area;
pub mod students;
pub mod trial_classes;

pub use catalog::CatalogRepository;
pub use fees::FeeRepository;
pub use student_area::StudentAreaRepository;
pub use students::{StudentListQuery, StudentRepository};
pub use trial_classes::TrialClassRepository;
