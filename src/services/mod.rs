pub mod points_service;
pub mod storage_service;
