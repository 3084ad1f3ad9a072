//! Source-buffer stack, scanner, and Pratt compiler for cinder.

pub mod compiler;
pub mod rules;
pub mod scanner;
pub mod source;

pub use compiler::compile;
pub use scanner::Scanner;
pub use source::{SourceBuffer, SourceStack};
