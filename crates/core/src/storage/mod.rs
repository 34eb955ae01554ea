pub mod lock;
pub mod recommendations;
pub mod subjects;
