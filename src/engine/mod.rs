pub mod cycles;
pub mod reconcile;
pub mod settle;
