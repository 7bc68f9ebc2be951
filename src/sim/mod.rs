pub mod event;
pub mod score;
pub mod session;
pub mod step;
