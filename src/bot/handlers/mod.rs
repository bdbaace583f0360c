//! Discord interaction handlers (buttons, role resolution)

/// Component (button) interaction handling
pub mod buttons;
/// Role-to-team resolution
pub mod roles;
