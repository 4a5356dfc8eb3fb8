//! Venue adapters implementing the quote provider port.

pub mod paper;

pub use paper::PaperVenue;
