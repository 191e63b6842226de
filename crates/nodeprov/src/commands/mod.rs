pub mod configure;
pub mod install;
pub mod osci;
pub mod start;
pub mod upload_keys;
