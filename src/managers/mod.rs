pub mod broker;
pub mod credentials;
pub mod remote;
pub mod requests;
