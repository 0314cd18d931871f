mod send;

pub use self::send::run_send;
