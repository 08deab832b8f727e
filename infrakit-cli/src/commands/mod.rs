pub mod onboard;
pub mod status;
pub mod sync;
