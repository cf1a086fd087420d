pub mod epsv;
pub mod handlers;
pub mod lcd;
pub mod list;
pub mod pass;
pub mod pasv;
pub mod pwd;
pub mod quit;
pub mod retr;
pub mod syst;
pub mod type_;
pub mod user;
