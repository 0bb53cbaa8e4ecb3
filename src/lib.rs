pub mod config;
pub mod criteria;
pub mod dicomweb;
pub mod display_date;
pub mod filter;
pub mod search;
pub mod shaper;
pub mod study;
pub mod study_list;
