//! Delivery, read receipt, analysis and AI session tests

mod ai_test;
mod analysis_test;
mod delivery_test;
mod receipts_test;
