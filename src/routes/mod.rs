//! Route modules for PDF Compress Server

pub mod compress;
pub mod health;
