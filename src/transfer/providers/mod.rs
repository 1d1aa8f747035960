pub mod local;
pub mod mock;

// vim: ts=4
