pub mod commodity;
pub mod update_pipeline;
