pub mod binding;
pub mod output_resource;
pub mod workload;
