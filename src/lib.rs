//! A single flat layer of competitive columns ("spatial pooler") that sparsifies fixed-size
//! input vectors and classifies them by counting which columns fire for which label.

pub mod core;
