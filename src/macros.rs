// Logging macros. When the 'logging' feature is disabled, these expand to
// nothing and the arguments are never evaluated.

macro_rules! log {
    ($($tt:tt)*) => {
        #[cfg(feature = "logging")]
        {
            $($tt)*
        }
    }
}

macro_rules! debug {
    ($($tt:tt)*) => { log!(log::debug!($($tt)*)) }
}

macro_rules! trace {
    ($($tt:tt)*) => { log!(log::trace!($($tt)*)) }
}

macro_rules! error {
    ($($tt:tt)*) => { log!(log::error!($($tt)*)) }
}

// A simple macro for defining bitfield accessors/mutators.
macro_rules! define_flag {
    ($bit:expr, $name:ident, $is_fn_name:ident) => {
        pub const $name: Flags = Flags { bits: 1 << $bit };

        pub fn $is_fn_name(&self) -> bool {
            self.bits & (1 << $bit) > 0
        }
    };
}
