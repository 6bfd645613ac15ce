pub mod points;
pub mod storage;
