pub mod python_worker;

pub use python_worker::*;
