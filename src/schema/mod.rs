pub mod address;
pub mod event;
pub mod journey;
pub mod player;
pub mod region;
