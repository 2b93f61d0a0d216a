pub mod health;
pub use self::health::health;

pub mod login;
pub use self::login::login;

pub mod register;
pub use self::register::register;

pub mod session;
pub use self::session::{logout, refresh};

pub mod profile;
pub mod types;
pub mod users;
