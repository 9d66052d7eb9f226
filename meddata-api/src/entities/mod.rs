// Public entities for the meddata API
// This module contains data structures that cross the application boundary

// Common entities for error handling and success envelopes
pub mod common;

// Listing responses per resource level
pub mod listings;
