pub mod fireworks;
pub mod score_chart;
