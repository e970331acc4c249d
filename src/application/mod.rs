pub mod keeper;

pub use keeper::Keeper;
