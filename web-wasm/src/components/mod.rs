pub mod class_stats;
pub mod detection_list;
pub mod error_banner;
pub mod header;
pub mod stream_controls;
pub mod upload_area;
