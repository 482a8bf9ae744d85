/// Login and session persistence.
pub mod identity;
/// Image warming ahead of display.
pub mod image;
/// External question generation.
pub mod provider;
