//! Practice flow: filter, navigation, answer and generator window state.

pub mod state;

pub use state::{GeneratorState, PracticeAction, PracticeState, NO_MATCH_MESSAGE};
