pub mod dispatch;
pub mod handle;
pub mod register;
pub mod show;

pub use dispatch::dispatch;
pub(crate) use dispatch::finish;
