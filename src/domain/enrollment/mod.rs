//! Enrollment domain module.
//!
//! People, their contact points, and their per-program enrollment profiles.
//! These rows are owned by the registration side of the application; the
//! billing core only reads them.

mod person;
mod profile;

pub use person::{ContactKind, ContactPoint, Person, VerificationStatus};
pub use profile::{
    BillingType, EnrollmentStatus, GraduationStatus, PaymentFrequency, ProgramProfile,
};
