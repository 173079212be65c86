pub mod journey;
pub mod view_state;

pub use journey::Journey;
pub use view_state::{
    DifficultyLevel, DifficultyRating, Feature, HistoricalFact, Translation, ViewState,
};
