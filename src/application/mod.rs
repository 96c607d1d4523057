// Application layer - the DataSource contract and its consumers
pub mod data_source;
pub mod fanout;
pub mod stub_source;
