pub mod brands;
pub mod campaigns;
pub mod spend;
