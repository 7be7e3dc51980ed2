pub mod environment;
pub mod executor;
pub mod function;
pub mod interpreter;
pub mod reference;
pub mod value;
