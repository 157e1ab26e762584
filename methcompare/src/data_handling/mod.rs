pub mod dss_dmr;
pub mod entropy;
pub mod modkit_dmr;
pub mod sample_probs;
