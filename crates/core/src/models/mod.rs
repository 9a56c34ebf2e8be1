//! Catalog entries: patrons and the publications they borrow.

mod patron;
mod publication;

pub use patron::{Patron, PATRON_TAG};
pub use publication::{
    current_year, LoanState, Publication, PublicationKind, LOAN_PERIOD_DAYS, MIN_COPYRIGHT_YEAR,
};
