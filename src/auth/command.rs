pub mod login_cmd;
pub mod login_external_cmd;
pub mod logout_cmd;
pub mod refresh_cmd;
