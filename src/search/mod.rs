pub mod results;
pub mod searcher;
