pub mod dispatch;
pub mod health;
pub mod queue;
pub mod status;
