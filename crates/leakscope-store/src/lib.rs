/// File-backed session persistence for the leakscope harness.
///
/// One JSON file per session under a sessions directory. This is what makes
/// multi-turn conversations real even when the driving harness runs a new
/// process per turn: the episode engine itself holds no cross-turn state.
pub mod file;

pub use file::FileSessionStore;
