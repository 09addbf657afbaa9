//! Supporting services for soundpool-si

pub mod dataset_scanner;
