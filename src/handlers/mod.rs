pub mod batches;
pub mod confirmation;
pub mod employee;
pub mod general;
pub mod rates;
pub mod salary;
