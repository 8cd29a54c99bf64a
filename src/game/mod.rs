pub mod codec;
pub mod fireworks;
pub mod link;
pub mod score_table;
pub mod timing;
