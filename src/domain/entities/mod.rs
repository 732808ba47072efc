pub mod matching;
pub mod record;
pub mod sheet;
pub mod undo;
pub mod value;
