pub mod fetch;
pub mod fix;
pub mod run;
pub mod verify;
