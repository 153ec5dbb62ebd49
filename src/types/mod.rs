//! Public types for the Platewise API.

mod candidate;
mod event;
mod food;
mod message;
mod options;
mod profile;

pub use candidate::{DataType, Nutrient, NutrientCandidate};
pub use event::{EventSink, RecordingSink, ResolutionEvent, TracingSink};
pub use food::{ExtractedFoodItem, ImageInput};
pub use message::{ContentPart, Message, MessageContent, Role};
pub use options::{GenerateOptions, OutputSchema};
pub use profile::{
    ESTIMATION_FAILED_MESSAGE, MacroEstimate, MealAnalysis, MealTotals, NutrientSource,
    ResolvedNutrientProfile, round_calories, round_grams,
};
