pub mod store_call;
pub mod usecases;
