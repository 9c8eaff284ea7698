pub mod emotion_aggregator;
pub mod inference_scheduler;
