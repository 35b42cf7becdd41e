pub mod batch;
pub mod run;
pub mod shell;
pub mod tree;
