pub mod completion;
pub mod history;
pub mod keys;
pub mod readline;
pub mod render;
