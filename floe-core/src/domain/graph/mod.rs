pub mod dag;

pub use dag::ModelGraph;
