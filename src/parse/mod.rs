pub mod area;
pub mod currency;
pub mod floor;
pub mod images;
pub mod text;
