pub mod codes;
pub mod extractors;
pub mod html;
pub mod jwt;
