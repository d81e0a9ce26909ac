mod config;
mod lobe;
mod pooling_lobe;
