pub mod compose;
pub mod extract;
pub mod run;
