pub mod initdb;
pub mod train;
pub mod tune;
