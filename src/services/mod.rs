pub mod board_service;
pub mod cache_service;
pub mod chart_service;
pub mod coin_service;
pub mod normalizer;
pub mod refresh_service;
