// Image request translation library

pub mod config;
pub mod constants;
pub mod edits;
pub mod error;
pub mod logging;
pub mod request;
pub mod response;
pub mod signature;
pub mod storage;
pub mod thumbor;
