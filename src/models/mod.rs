pub mod room;

pub use room::{FieldValue, RoomSheetRecord};
