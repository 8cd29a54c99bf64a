pub mod software;
