// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod google;
pub mod location;

pub use google::{GooglePlacesClient, KeyStatus};
pub use location::{FixedLocation, ReportedLocation};
