pub mod entropy_comparison;
pub mod plot_data;
pub mod sample_probs;
