pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod logout;
pub use self::logout::logout;

pub mod proxy;
pub use self::proxy::proxy;
