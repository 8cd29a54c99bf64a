pub mod canvas;
pub mod color;
pub mod components;
pub mod font;
pub mod layout;
