pub mod attributes;
pub mod ids;
pub mod item;

pub use attributes::{
    Keyswitches, MidiSpec, NoteRange, PlayingMode, PlayingModes, Quality, StrumBehavior,
};
pub use ids::ItemId;
pub use item::ContentItem;
