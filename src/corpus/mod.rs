//! Corpus construction: vocabulary, single-stream assembly, training
//! windows, and the preprocessing pipeline that ties them together.

mod assemble;
mod pipeline;
mod vocabulary;
mod window;

pub use assemble::{assemble, load_corpus, save_corpus, tokenize};
pub use pipeline::{encode_score, preprocess, run_preprocess, PreprocessReport, Preprocessed};
pub use vocabulary::Vocabulary;
pub use window::{window, windows, TrainingPair};
