pub mod token_lifecycle;
