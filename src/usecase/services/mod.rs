pub mod export_service;
pub mod import_service;
pub mod merge_engine;
pub mod push_service;
pub mod row_matcher;
pub mod sync_delete;
pub mod table_store;
pub mod undo_log;
